//! Export - write a finished project to disk
//!
//! Layout under the output directory:
//!
//! ```text
//! <output-dir>/<YYYYmmdd-HHMMSS>-<type-slug>/
//!     before.<ext>
//!     after.<ext>
//!     analysis.json
//!     plan.json
//!     plan.md
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use crate::domain::ProjectState;

/// Write every artifact the project has into a new timestamped directory
///
/// Returns the directory written.
pub fn export_project(project: &ProjectState, output_dir: &Path) -> Result<PathBuf> {
    debug!(?output_dir, "export_project: called");
    let plan = project.plan.as_ref().ok_or_else(|| eyre!("Nothing to save yet: no plan"))?;

    let slug = project.restoration_type.map(|t| t.slug()).unwrap_or("project");
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let dir = unique_dir(output_dir, &format!("{}-{}", stamp, slug));
    fs::create_dir_all(&dir).context(format!("Failed to create {}", dir.display()))?;

    if let Some(image) = &project.original_image {
        write(&dir.join(format!("before.{}", image.extension())), &image.bytes)?;
    }
    if let Some(image) = &project.restored_image {
        write(&dir.join(format!("after.{}", image.extension())), &image.bytes)?;
    }
    if let Some(analysis) = &project.analysis {
        let json = serde_json::to_vec_pretty(analysis).context("Failed to serialize analysis")?;
        write(&dir.join("analysis.json"), &json)?;
    }

    let json = serde_json::to_vec_pretty(plan).context("Failed to serialize plan")?;
    write(&dir.join("plan.json"), &json)?;
    write(&dir.join("plan.md"), plan.to_markdown().as_bytes())?;

    info!(dir = %dir.display(), "Exported project");
    Ok(dir)
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    debug!(?path, len = bytes.len(), "write: called");
    fs::write(path, bytes).context(format!("Failed to write {}", path.display()))
}

/// `base/name`, or `base/name-2`, `-3`, ... if taken
fn unique_dir(base: &Path, name: &str) -> PathBuf {
    let first = base.join(name);
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| base.join(format!("{}-{}", name, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetTier, RestorationType, SiteImage, fixtures};

    fn finished() -> ProjectState {
        ProjectState {
            original_image: Some(SiteImage::from_bytes("image/jpeg", vec![1, 2, 3]).unwrap()),
            restored_image: Some(SiteImage::from_bytes("image/png", vec![4, 5, 6]).unwrap()),
            analysis: Some(fixtures::analysis()),
            restoration_type: Some(RestorationType::PollinatorHaven),
            budget: Some(BudgetTier::Medium),
            plan: Some(fixtures::plan()),
            location: None,
        }
    }

    #[test]
    fn test_export_writes_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = export_project(&finished(), tmp.path()).unwrap();

        assert!(dir.starts_with(tmp.path()));
        assert!(dir.file_name().unwrap().to_string_lossy().ends_with("-pollinator-haven"));
        assert_eq!(fs::read(dir.join("before.jpg")).unwrap(), vec![1, 2, 3]);
        assert_eq!(fs::read(dir.join("after.png")).unwrap(), vec![4, 5, 6]);

        let plan: crate::domain::RestorationPlan =
            serde_json::from_slice(&fs::read(dir.join("plan.json")).unwrap()).unwrap();
        assert_eq!(plan, fixtures::plan());
        assert!(fs::read_to_string(dir.join("plan.md")).unwrap().starts_with("# Parking Lot Pollinator Haven"));
        assert!(dir.join("analysis.json").exists());
    }

    #[test]
    fn test_export_twice_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let first = export_project(&finished(), tmp.path()).unwrap();
        let second = export_project(&finished(), tmp.path()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_export_requires_plan() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(export_project(&ProjectState::new(), tmp.path()).is_err());
    }
}
