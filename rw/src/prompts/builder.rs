//! Request builder
//!
//! Turns domain inputs into fully formed [`GenerateRequest`]s: rendered
//! prompt, attached image and output schema. Building is deterministic for
//! the same inputs.

use serde::Serialize;
use tracing::debug;

use super::{PromptLoader, schema};
use crate::ai::{AiError, CallKind, GenerateRequest, OutputFormat, Part};
use crate::config::ModelsConfig;
use crate::domain::{BudgetTier, GeoLocation, PlanPhase, RestorationType, SiteAnalysis, SiteImage};

/// Providers requested per service lookup
pub const DEFAULT_MAX_PROVIDERS: u32 = 5;

#[derive(Serialize)]
struct TypeEntry {
    code: &'static str,
    label: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct AnalysisContext {
    sunlight_levels: Vec<&'static str>,
    location: Option<GeoLocation>,
    restoration_types: Vec<TypeEntry>,
}

#[derive(Serialize)]
struct VisionContext<'a> {
    restoration_label: &'static str,
    restoration_description: &'static str,
    budget_label: &'static str,
    budget_guidance: &'static str,
    sunlight: &'static str,
    area_sqm: String,
    hardiness_zone: &'a str,
    features: &'a [String],
}

#[derive(Serialize)]
struct PlanContext<'a> {
    #[serde(flatten)]
    vision: VisionContext<'a>,
    summary: &'a str,
    soil_sealing_percent: u32,
    biodiversity_score: u32,
    deficits: &'a [String],
    rationale: Option<&'a str>,
    location: Option<GeoLocation>,
}

#[derive(Serialize)]
struct ServicesContext<'a> {
    max_providers: u32,
    latitude: f64,
    longitude: f64,
    category: &'a str,
    phase_name: &'a str,
    tasks: &'a [String],
}

/// Builds the four request kinds
pub struct RequestBuilder {
    loader: PromptLoader,
    models: ModelsConfig,
}

impl RequestBuilder {
    pub fn new(loader: PromptLoader, models: ModelsConfig) -> Self {
        debug!(?models, "RequestBuilder::new: called");
        Self { loader, models }
    }

    fn render<T: Serialize>(&self, name: &str, ctx: &T) -> Result<String, AiError> {
        self.loader.render(name, ctx).map_err(|e| AiError::Request(e.to_string()))
    }

    /// Site analysis: image plus instructions, JSON out
    pub fn analysis_request(
        &self,
        image: &SiteImage,
        location: Option<GeoLocation>,
    ) -> Result<GenerateRequest, AiError> {
        debug!(?image, ?location, "RequestBuilder::analysis_request: called");
        let ctx = AnalysisContext {
            sunlight_levels: crate::domain::SunlightLevel::ALL.iter().map(|s| s.code()).collect(),
            location,
            restoration_types: RestorationType::ALL
                .iter()
                .map(|t| TypeEntry {
                    code: t.code(),
                    label: t.label(),
                    description: t.description(),
                })
                .collect(),
        };
        let prompt = self.render("analysis", &ctx)?;

        Ok(GenerateRequest::new(CallKind::SiteAnalysis, &self.models.analysis)
            .with_part(image_part(image))
            .with_part(Part::Text(prompt))
            .with_output(OutputFormat::Json {
                schema: schema::analysis_schema(),
            }))
    }

    /// Restored-site vision: image edit, image out
    pub fn vision_request(
        &self,
        image: &SiteImage,
        analysis: &SiteAnalysis,
        restoration_type: RestorationType,
        budget: BudgetTier,
    ) -> Result<GenerateRequest, AiError> {
        debug!(%restoration_type, %budget, "RequestBuilder::vision_request: called");
        let prompt = self.render("vision", &vision_context(analysis, restoration_type, budget))?;

        Ok(GenerateRequest::new(CallKind::Vision, &self.models.vision)
            .with_part(image_part(image))
            .with_part(Part::Text(prompt))
            .with_output(OutputFormat::Image))
    }

    /// Execution plan: image plus analysis, JSON out
    pub fn plan_request(
        &self,
        image: &SiteImage,
        analysis: &SiteAnalysis,
        restoration_type: RestorationType,
        budget: BudgetTier,
        location: Option<GeoLocation>,
    ) -> Result<GenerateRequest, AiError> {
        debug!(%restoration_type, %budget, ?location, "RequestBuilder::plan_request: called");
        let ctx = PlanContext {
            vision: vision_context(analysis, restoration_type, budget),
            summary: &analysis.summary,
            soil_sealing_percent: analysis.soil_sealing_percent,
            biodiversity_score: analysis.biodiversity_score,
            deficits: &analysis.deficits,
            rationale: analysis
                .suitability_for(restoration_type)
                .map(|s| s.rationale.as_str())
                .filter(|r| !r.is_empty()),
            location,
        };
        let prompt = self.render("plan", &ctx)?;

        Ok(GenerateRequest::new(CallKind::Plan, &self.models.plan)
            .with_part(image_part(image))
            .with_part(Part::Text(prompt))
            .with_output(OutputFormat::Json {
                schema: schema::plan_schema(),
            }))
    }

    /// Local service lookup for one phase: text only, search grounded
    pub fn services_request(
        &self,
        phase: &PlanPhase,
        location: GeoLocation,
        max_providers: u32,
    ) -> Result<GenerateRequest, AiError> {
        debug!(phase = %phase.name, %location, "RequestBuilder::services_request: called");
        let ctx = ServicesContext {
            max_providers,
            latitude: location.latitude,
            longitude: location.longitude,
            category: &phase.service_category,
            phase_name: &phase.name,
            tasks: &phase.tasks,
        };
        let prompt = self.render("services", &ctx)?;

        Ok(GenerateRequest::new(CallKind::ServiceLookup, &self.models.services)
            .with_part(Part::Text(prompt))
            .with_web_search())
    }
}

fn image_part(image: &SiteImage) -> Part {
    Part::inline(image.mime_type.clone(), image.to_base64())
}

fn vision_context(analysis: &SiteAnalysis, restoration_type: RestorationType, budget: BudgetTier) -> VisionContext<'_> {
    VisionContext {
        restoration_label: restoration_type.label(),
        restoration_description: restoration_type.description(),
        budget_label: budget.label(),
        budget_guidance: budget.guidance(),
        sunlight: analysis.sunlight.label(),
        area_sqm: format!("{:.0}", analysis.estimated_area_sqm),
        hardiness_zone: &analysis.hardiness_zone,
        features: &analysis.features,
    }
}
