//! RestorationPlan domain type
//!
//! AI-derived phased construction plan. Immutable once produced.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::debug;

use super::ValidationError;

/// One phase of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPhase {
    pub name: String,

    /// Human-readable duration, e.g. "2 weeks"
    pub duration: String,

    #[serde(default)]
    pub tasks: Vec<String>,

    #[serde(default)]
    pub materials: Vec<String>,

    /// Estimated cost in the plan's currency
    pub cost: f64,

    /// Kind of local business to hire for this phase, e.g. "asphalt removal contractor"
    pub service_category: String,
}

/// Phased execution plan for the chosen restoration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorationPlan {
    pub title: String,

    pub summary: String,

    /// Human-readable total duration, e.g. "4-6 months"
    pub total_duration: String,

    pub total_cost: f64,

    /// Symbol for the local currency, e.g. "€"
    pub currency_symbol: String,

    pub phases: Vec<PlanPhase>,

    /// Ongoing care once the work is finished
    #[serde(default)]
    pub maintenance: Vec<String>,

    /// Expected ecological and social impact
    #[serde(default)]
    pub impact: Vec<String>,
}

impl RestorationPlan {
    /// Check the payload is internally consistent
    pub fn validate(&self) -> Result<(), ValidationError> {
        debug!(phase_count = self.phases.len(), "RestorationPlan::validate: called");
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("title"));
        }
        if self.phases.is_empty() {
            return Err(ValidationError::Empty("phases"));
        }
        check_cost("totalCost", self.total_cost)?;
        for phase in &self.phases {
            check_cost("phases.cost", phase.cost)?;
            if phase.name.trim().is_empty() {
                return Err(ValidationError::Empty("phases.name"));
            }
        }
        Ok(())
    }

    pub fn phase(&self, index: usize) -> Option<&PlanPhase> {
        self.phases.get(index)
    }

    /// Sum of the phase costs (may differ from the AI's stated total)
    pub fn phases_cost(&self) -> f64 {
        self.phases.iter().map(|p| p.cost).sum()
    }

    /// Format an amount in the plan's currency
    pub fn money(&self, amount: f64) -> String {
        format!("{}{}", self.currency_symbol, format_amount(amount))
    }

    /// Render the plan as a Markdown document
    pub fn to_markdown(&self) -> String {
        debug!(%self.title, "RestorationPlan::to_markdown: called");
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title);
        let _ = writeln!(out, "{}\n", self.summary);
        let _ = writeln!(out, "- **Duration:** {}", self.total_duration);
        let _ = writeln!(out, "- **Estimated cost:** {}\n", self.money(self.total_cost));

        for (i, phase) in self.phases.iter().enumerate() {
            let _ = writeln!(out, "## Phase {}: {}\n", i + 1, phase.name);
            let _ = writeln!(
                out,
                "_{} · {} · hire: {}_\n",
                phase.duration,
                self.money(phase.cost),
                phase.service_category
            );
            write_list(&mut out, "Tasks", &phase.tasks);
            write_list(&mut out, "Materials", &phase.materials);
        }

        write_list(&mut out, "Maintenance", &self.maintenance);
        write_list(&mut out, "Impact", &self.impact);
        out
    }
}

fn write_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "### {}\n", heading);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
    out.push('\n');
}

fn check_cost(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            expected: "a non-negative amount",
        });
    }
    Ok(())
}

/// Round to whole units and group thousands: 12500.4 -> "12,500"
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn plan() -> RestorationPlan {
        RestorationPlan {
            title: "Parking Lot Pollinator Haven".to_string(),
            summary: "Remove asphalt and establish a native flower meadow.".to_string(),
            total_duration: "5 months".to_string(),
            total_cost: 18500.0,
            currency_symbol: "€".to_string(),
            phases: vec![
                PlanPhase {
                    name: "Depaving".to_string(),
                    duration: "2 weeks".to_string(),
                    tasks: vec!["Cut and lift asphalt".to_string()],
                    materials: vec!["Skip hire".to_string()],
                    cost: 9000.0,
                    service_category: "asphalt removal contractor".to_string(),
                },
                PlanPhase {
                    name: "Planting".to_string(),
                    duration: "1 month".to_string(),
                    tasks: vec!["Sow native seed mix".to_string()],
                    materials: vec!["Seed mix".to_string(), "Compost".to_string()],
                    cost: 9500.0,
                    service_category: "native plant nursery".to_string(),
                },
            ],
            maintenance: vec!["Mow once in late summer".to_string()],
            impact: vec!["Habitat for 40+ pollinator species".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_plan() {
        assert_eq!(fixtures::plan().validate(), Ok(()));
    }

    #[test]
    fn test_plan_requires_phases() {
        let mut plan = fixtures::plan();
        plan.phases.clear();
        assert_eq!(plan.validate(), Err(ValidationError::Empty("phases")));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut plan = fixtures::plan();
        plan.phases[1].cost = -5.0;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_wire() {
        let json = serde_json::json!({
            "title": "T",
            "summary": "S",
            "totalDuration": "1 month",
            "totalCost": 100.0,
            "currencySymbol": "$",
            "phases": [{
                "name": "Only",
                "duration": "1 week",
                "cost": 100,
                "serviceCategory": "landscaper"
            }]
        });

        let plan: RestorationPlan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.phases[0].service_category, "landscaper");
        assert!(plan.maintenance.is_empty());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.4), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1234567.8), "1,234,568");
    }

    #[test]
    fn test_money_and_totals() {
        let plan = fixtures::plan();
        assert_eq!(plan.money(18500.0), "€18,500");
        assert_eq!(plan.phases_cost(), 18500.0);
        assert_eq!(plan.phase(1).map(|p| p.name.as_str()), Some("Planting"));
        assert!(plan.phase(2).is_none());
    }

    #[test]
    fn test_to_markdown() {
        let md = fixtures::plan().to_markdown();
        assert!(md.starts_with("# Parking Lot Pollinator Haven"));
        assert!(md.contains("## Phase 2: Planting"));
        assert!(md.contains("hire: asphalt removal contractor"));
        assert!(md.contains("### Maintenance"));
        assert!(md.contains("- Compost"));
    }
}
