//! SiteAnalysis domain type
//!
//! Snapshot of the AI's assessment of an uploaded site photo. Created once
//! per image and never modified afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::{RestorationType, ValidationError};

/// How much direct sun the site receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SunlightLevel {
    FullSun,
    PartialSun,
    PartialShade,
    FullShade,
}

impl SunlightLevel {
    pub const ALL: [SunlightLevel; 4] = [Self::FullSun, Self::PartialSun, Self::PartialShade, Self::FullShade];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullSun => "Full sun",
            Self::PartialSun => "Partial sun",
            Self::PartialShade => "Partial shade",
            Self::FullShade => "Full shade",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FullSun => "FULL_SUN",
            Self::PartialSun => "PARTIAL_SUN",
            Self::PartialShade => "PARTIAL_SHADE",
            Self::FullShade => "FULL_SHADE",
        }
    }
}

impl std::fmt::Display for SunlightLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How well one restoration strategy fits the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suitability {
    pub restoration_type: RestorationType,

    /// 0-100
    pub score: u32,

    #[serde(default)]
    pub rationale: String,
}

/// AI-derived site metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    /// One-paragraph description of what the photo shows
    #[serde(default)]
    pub summary: String,

    pub sunlight: SunlightLevel,

    /// Share of the visible ground that is sealed (asphalt, concrete, pavers), 0-100
    pub soil_sealing_percent: u32,

    /// Current biodiversity, 0-100
    pub biodiversity_score: u32,

    /// Plant hardiness zone, e.g. "7b"
    pub hardiness_zone: String,

    /// Estimated restorable area in square metres
    pub estimated_area_sqm: f64,

    /// Things observed in the photo (trees, drains, walls, ...)
    #[serde(default)]
    pub features: Vec<String>,

    /// Ecological problems (heat island, runoff, no habitat, ...)
    #[serde(default)]
    pub deficits: Vec<String>,

    /// One entry per restoration type
    pub suitability: Vec<Suitability>,
}

impl SiteAnalysis {
    /// Check the payload is internally consistent
    pub fn validate(&self) -> Result<(), ValidationError> {
        debug!("SiteAnalysis::validate: called");
        check_percent("soilSealingPercent", self.soil_sealing_percent)?;
        check_percent("biodiversityScore", self.biodiversity_score)?;

        if !self.estimated_area_sqm.is_finite() || self.estimated_area_sqm <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "estimatedAreaSqm",
                value: self.estimated_area_sqm.to_string(),
                expected: "a positive number",
            });
        }
        if self.hardiness_zone.trim().is_empty() {
            return Err(ValidationError::Empty("hardinessZone"));
        }
        if self.suitability.is_empty() {
            return Err(ValidationError::Empty("suitability"));
        }

        let mut seen = HashSet::new();
        for s in &self.suitability {
            check_percent("suitability.score", s.score)?;
            if !seen.insert(s.restoration_type) {
                return Err(ValidationError::Duplicate(s.restoration_type.code().to_string()));
            }
        }
        Ok(())
    }

    /// Suitability for one restoration type, if the AI scored it
    pub fn suitability_for(&self, restoration_type: RestorationType) -> Option<&Suitability> {
        self.suitability.iter().find(|s| s.restoration_type == restoration_type)
    }

    /// Suitability entries, best fit first
    pub fn ranked(&self) -> Vec<&Suitability> {
        let mut ranked: Vec<&Suitability> = self.suitability.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.restoration_type.cmp(&b.restoration_type)));
        ranked
    }

    /// The highest-scoring restoration type
    pub fn best_fit(&self) -> Option<RestorationType> {
        self.ranked().first().map(|s| s.restoration_type)
    }
}

fn check_percent(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if value > 100 {
        return Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            expected: "0-100",
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn analysis() -> SiteAnalysis {
        SiteAnalysis {
            summary: "A sun-baked asphalt parking lot bordered by a brick wall.".to_string(),
            sunlight: SunlightLevel::FullSun,
            soil_sealing_percent: 92,
            biodiversity_score: 8,
            hardiness_zone: "7b".to_string(),
            estimated_area_sqm: 420.0,
            features: vec!["storm drain".to_string(), "brick wall".to_string()],
            deficits: vec!["heat island".to_string(), "runoff".to_string()],
            suitability: vec![
                Suitability {
                    restoration_type: RestorationType::PollinatorHaven,
                    score: 88,
                    rationale: "Full sun suits flowering natives".to_string(),
                },
                Suitability {
                    restoration_type: RestorationType::RainGarden,
                    score: 75,
                    rationale: "Existing drain shows runoff path".to_string(),
                },
                Suitability {
                    restoration_type: RestorationType::WildlifePond,
                    score: 30,
                    rationale: String::new(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_analysis() {
        assert_eq!(fixtures::analysis().validate(), Ok(()));
    }

    #[test]
    fn test_deserialize_from_wire() {
        let json = serde_json::json!({
            "sunlight": "PARTIAL_SHADE",
            "soilSealingPercent": 60,
            "biodiversityScore": 20,
            "hardinessZone": "8a",
            "estimatedAreaSqm": 55.5,
            "suitability": [
                { "restorationType": "FOOD_FOREST", "score": 70 }
            ]
        });

        let analysis: SiteAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(analysis.sunlight, SunlightLevel::PartialShade);
        assert!(analysis.features.is_empty());
        assert_eq!(analysis.suitability[0].restoration_type, RestorationType::FoodForest);
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_percent_out_of_range() {
        let mut analysis = fixtures::analysis();
        analysis.soil_sealing_percent = 140;
        assert!(matches!(
            analysis.validate(),
            Err(ValidationError::OutOfRange {
                field: "soilSealingPercent",
                ..
            })
        ));
    }

    #[test]
    fn test_area_must_be_positive() {
        let mut analysis = fixtures::analysis();
        analysis.estimated_area_sqm = 0.0;
        assert!(analysis.validate().is_err());
        analysis.estimated_area_sqm = f64::NAN;
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_duplicate_suitability_rejected() {
        let mut analysis = fixtures::analysis();
        let dup = analysis.suitability[0].clone();
        analysis.suitability.push(dup);
        assert_eq!(
            analysis.validate(),
            Err(ValidationError::Duplicate("POLLINATOR_HAVEN".to_string()))
        );
    }

    #[test]
    fn test_empty_suitability_rejected() {
        let mut analysis = fixtures::analysis();
        analysis.suitability.clear();
        assert_eq!(analysis.validate(), Err(ValidationError::Empty("suitability")));
    }

    #[test]
    fn test_ranking() {
        let analysis = fixtures::analysis();
        let ranked: Vec<u32> = analysis.ranked().iter().map(|s| s.score).collect();
        assert_eq!(ranked, vec![88, 75, 30]);
        assert_eq!(analysis.best_fit(), Some(RestorationType::PollinatorHaven));
        assert!(analysis.suitability_for(RestorationType::FoodForest).is_none());
    }
}
