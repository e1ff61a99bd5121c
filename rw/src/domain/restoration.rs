//! Restoration strategies and budget tiers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ecological restoration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestorationType {
    /// Native flowering plants and nesting habitat for pollinators
    PollinatorHaven,
    /// Layered edible perennials: canopy, shrubs, ground cover
    FoodForest,
    /// Planted depression capturing and infiltrating runoff
    RainGarden,
    /// Low-maintenance native grassland and wildflowers
    UrbanMeadow,
    /// Dense, fast-growing native woodland on a small footprint
    MicroForest,
    /// Shallow pond with marginal planting for amphibians and insects
    WildlifePond,
}

impl RestorationType {
    pub const ALL: [RestorationType; 6] = [
        Self::PollinatorHaven,
        Self::FoodForest,
        Self::RainGarden,
        Self::UrbanMeadow,
        Self::MicroForest,
        Self::WildlifePond,
    ];

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::PollinatorHaven => "Pollinator Haven",
            Self::FoodForest => "Food Forest",
            Self::RainGarden => "Rain Garden",
            Self::UrbanMeadow => "Urban Meadow",
            Self::MicroForest => "Micro Forest",
            Self::WildlifePond => "Wildlife Pond",
        }
    }

    /// Command-line identifier
    pub fn slug(&self) -> &'static str {
        match self {
            Self::PollinatorHaven => "pollinator-haven",
            Self::FoodForest => "food-forest",
            Self::RainGarden => "rain-garden",
            Self::UrbanMeadow => "urban-meadow",
            Self::MicroForest => "micro-forest",
            Self::WildlifePond => "wildlife-pond",
        }
    }

    /// Wire identifier used in AI payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::PollinatorHaven => "POLLINATOR_HAVEN",
            Self::FoodForest => "FOOD_FOREST",
            Self::RainGarden => "RAIN_GARDEN",
            Self::UrbanMeadow => "URBAN_MEADOW",
            Self::MicroForest => "MICRO_FOREST",
            Self::WildlifePond => "WILDLIFE_POND",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PollinatorHaven => "Native flowering plants, bare ground and nesting sites for bees and butterflies",
            Self::FoodForest => "Layered edible perennials: fruit trees, berry shrubs, herbs and ground cover",
            Self::RainGarden => "Planted depression that captures roof and street runoff and lets it soak in",
            Self::UrbanMeadow => "Native grasses and wildflowers, mown once or twice a year",
            Self::MicroForest => "Densely planted native saplings that grow into a multi-layer woodland",
            Self::WildlifePond => "Shallow, fish-free pond with marginal plants for amphibians and dragonflies",
        }
    }
}

impl std::fmt::Display for RestorationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for RestorationType {
    type Err = String;

    /// Accepts the slug, the wire code, or the label (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|t| t.slug() == wanted)
            .ok_or_else(|| {
                let options: Vec<&str> = Self::ALL.iter().map(|t| t.slug()).collect();
                format!("unknown restoration type '{}' (expected one of: {})", s, options.join(", "))
            })
    }
}

/// Cost/quality level constraining the plan and the generated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Shoestring",
            Self::Medium => "Community",
            Self::High => "Showcase",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Guidance handed to the AI when planning at this tier
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Low => "volunteer labour, hand tools, salvaged materials, seeds and plugs rather than grown stock",
            Self::Medium => {
                "a mix of volunteer and contracted work, small machinery for depaving, nursery stock for key plants"
            }
            Self::High => {
                "professional contractors throughout, full depaving and soil remediation, semi-mature trees, \
                 designed paths and seating"
            }
        }
    }

    /// Next tier, wrapping around
    pub fn next(&self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.slug() == wanted || b.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown budget tier '{}' (expected one of: low, medium, high)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restoration_type_parse() {
        assert_eq!("food-forest".parse::<RestorationType>(), Ok(RestorationType::FoodForest));
        assert_eq!("RAIN_GARDEN".parse::<RestorationType>(), Ok(RestorationType::RainGarden));
        assert_eq!("Micro Forest".parse::<RestorationType>(), Ok(RestorationType::MicroForest));
        assert!("parking-lot".parse::<RestorationType>().is_err());
    }

    #[test]
    fn test_restoration_type_codes_match_serde() {
        for t in RestorationType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, t.code());
        }
    }

    #[test]
    fn test_budget_parse() {
        assert_eq!("low".parse::<BudgetTier>(), Ok(BudgetTier::Low));
        assert_eq!("Showcase".parse::<BudgetTier>(), Ok(BudgetTier::High));
        assert!("infinite".parse::<BudgetTier>().is_err());
    }

    #[test]
    fn test_budget_next_cycles() {
        assert_eq!(BudgetTier::Low.next(), BudgetTier::Medium);
        assert_eq!(BudgetTier::High.next(), BudgetTier::Low);
    }

    #[test]
    fn test_budget_serde() {
        assert_eq!(serde_json::to_value(BudgetTier::Medium).unwrap(), "MEDIUM");
    }
}
