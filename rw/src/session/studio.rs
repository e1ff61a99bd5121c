//! Studio - runs the four AI calls
//!
//! Builds each request, sends it through the retry policy and turns the
//! reply into a validated domain value. A reply that does not parse or
//! validate is a permanent failure ([`AiError::Malformed`]).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ai::{AiClient, AiError, CallKind, GenerateRequest, GenerateResponse, RetryPolicy, with_retry};
use crate::domain::{
    BudgetTier, GeoLocation, LocalSearchResult, PlanPhase, RestorationPlan, RestorationType, ServiceDirectory,
    SiteAnalysis, SiteImage,
};
use crate::prompts::{DEFAULT_MAX_PROVIDERS, RequestBuilder, schema};

use super::flow::{AnalysisJob, GenerationJob, LookupJob};

/// AI-backed operations of the wizard
pub struct Studio {
    client: Arc<dyn AiClient>,
    builder: RequestBuilder,
    policy: RetryPolicy,
    max_providers: u32,
}

impl Studio {
    pub fn new(client: Arc<dyn AiClient>, builder: RequestBuilder, policy: RetryPolicy) -> Self {
        debug!(?policy, "Studio::new: called");
        Self {
            client,
            builder,
            policy,
            max_providers: DEFAULT_MAX_PROVIDERS,
        }
    }

    pub fn with_max_providers(mut self, max_providers: u32) -> Self {
        self.max_providers = max_providers;
        self
    }

    async fn send(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
        let label = request.kind.to_string();
        debug!(%label, model = %request.model, "Studio::send: called");
        with_retry(&self.policy, &label, || self.client.generate(request.clone())).await
    }

    /// Assess the uploaded site photo
    pub async fn analyze_site(
        &self,
        image: &SiteImage,
        location: Option<GeoLocation>,
    ) -> Result<SiteAnalysis, AiError> {
        debug!(?image, ?location, "Studio::analyze_site: called");
        let request = self.builder.analysis_request(image, location)?;
        let response = self.send(request).await?;

        let analysis: SiteAnalysis = parse_structured(CallKind::SiteAnalysis, &response)?;
        analysis
            .validate()
            .map_err(|e| AiError::Malformed(format!("site analysis: {}", e)))?;
        info!(sunlight = %analysis.sunlight, area = analysis.estimated_area_sqm, "Studio: site analysed");
        Ok(analysis)
    }

    /// Generate the "after" image
    pub async fn generate_vision(
        &self,
        image: &SiteImage,
        analysis: &SiteAnalysis,
        restoration_type: RestorationType,
        budget: BudgetTier,
    ) -> Result<SiteImage, AiError> {
        debug!(%restoration_type, %budget, "Studio::generate_vision: called");
        let request = self.builder.vision_request(image, analysis, restoration_type, budget)?;
        let response = self.send(request).await?;

        let Some(inline) = response.images.first() else {
            return Err(AiError::EmptyResponse("vision reply contains no image".to_string()));
        };
        let vision = SiteImage::from_base64(&inline.mime_type, &inline.data)
            .map_err(|e| AiError::Malformed(format!("vision image: {}", e)))?;
        info!(size = %vision.size_label(), "Studio: vision generated");
        Ok(vision)
    }

    /// Generate the phased execution plan
    pub async fn generate_plan(
        &self,
        image: &SiteImage,
        analysis: &SiteAnalysis,
        restoration_type: RestorationType,
        budget: BudgetTier,
        location: Option<GeoLocation>,
    ) -> Result<RestorationPlan, AiError> {
        debug!(%restoration_type, %budget, "Studio::generate_plan: called");
        let request = self
            .builder
            .plan_request(image, analysis, restoration_type, budget, location)?;
        let response = self.send(request).await?;

        let plan: RestorationPlan = parse_structured(CallKind::Plan, &response)?;
        plan.validate().map_err(|e| AiError::Malformed(format!("plan: {}", e)))?;
        if (plan.phases_cost() - plan.total_cost).abs() > 1.0 {
            warn!(
                total = plan.total_cost,
                phases = plan.phases_cost(),
                "Studio: plan total differs from sum of phases"
            );
        }
        info!(title = %plan.title, phases = plan.phases.len(), "Studio: plan generated");
        Ok(plan)
    }

    /// Run vision and plan generation concurrently
    ///
    /// Resolves only when both succeed; the first failure wins.
    pub async fn generate_vision_and_plan(&self, job: &GenerationJob) -> Result<(SiteImage, RestorationPlan), AiError> {
        debug!(ticket = ?job.ticket, "Studio::generate_vision_and_plan: called");
        tokio::try_join!(
            self.generate_vision(&job.image, &job.analysis, job.restoration_type, job.budget),
            self.generate_plan(
                &job.image,
                &job.analysis,
                job.restoration_type,
                job.budget,
                job.location
            ),
        )
    }

    /// Run the analysis described by a job
    pub async fn run_analysis(&self, job: &AnalysisJob) -> Result<SiteAnalysis, AiError> {
        self.analyze_site(&job.image, job.location).await
    }

    /// Search for local businesses that can carry out a plan phase
    pub async fn find_local_services(
        &self,
        phase_index: usize,
        phase: &PlanPhase,
        location: GeoLocation,
    ) -> Result<LocalSearchResult, AiError> {
        debug!(%phase_index, category = %phase.service_category, "Studio::find_local_services: called");
        let request = self.builder.services_request(phase, location, self.max_providers)?;
        let response = self.send(request).await?;

        let directory: ServiceDirectory = parse_structured(CallKind::ServiceLookup, &response)?;
        let mut providers = directory.providers;
        providers.retain(|p| !p.name.trim().is_empty());
        providers.truncate(self.max_providers as usize);

        info!(%phase_index, found = providers.len(), "Studio: local services found");
        Ok(LocalSearchResult {
            phase_index,
            category: phase.service_category.clone(),
            providers,
            sources: response.sources.into_iter().map(|s| s.uri).collect(),
        })
    }

    /// Run the lookup described by a job
    pub async fn run_lookup(&self, job: &LookupJob) -> Result<LocalSearchResult, AiError> {
        self.find_local_services(job.phase_index, &job.phase, job.location).await
    }
}

/// Deserialize the JSON payload of a text reply
///
/// Required keys are checked against the call's schema first so a reply
/// that drops a field names it.
pub fn parse_structured<T: DeserializeOwned>(kind: CallKind, response: &GenerateResponse) -> Result<T, AiError> {
    debug!(%kind, "parse_structured: called");
    let text = response
        .non_empty_text()
        .ok_or_else(|| AiError::EmptyResponse(format!("{} reply has no text", kind)))?;
    let json = extract_json(text).ok_or_else(|| AiError::Malformed(format!("{} reply is not JSON", kind)))?;
    let value: Value = serde_json::from_str(json).map_err(|e| AiError::Malformed(format!("{}: {}", kind, e)))?;

    if let Some(expected) = schema::schema_for(kind) {
        let missing = schema::missing_required(&expected, &value);
        if !missing.is_empty() {
            warn!(%kind, ?missing, "parse_structured: reply is missing required keys");
            return Err(AiError::Malformed(format!("{} reply missing {}", kind, missing.join(", "))));
        }
    }
    serde_json::from_value(value).map_err(|e| AiError::Malformed(format!("{}: {}", kind, e)))
}

/// The first complete JSON object in `text`
///
/// Schema-constrained replies are bare JSON; search-grounded replies may
/// wrap it in prose or a code fence, and the prose after it may contain
/// braces of its own.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let rest = &text[start..];
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    match stream.next() {
        Some(Ok(_)) => Some(&rest[..stream.byte_offset()]),
        _ => None,
    }
}
