//! Local service provider lookup results

use serde::{Deserialize, Serialize};

/// A local business that can carry out a plan phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvider {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: String,
}

/// Wire shape of the lookup reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDirectory {
    #[serde(default)]
    pub providers: Vec<ServiceProvider>,
}

/// Providers found for one plan phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSearchResult {
    pub phase_index: usize,

    /// The service category that was searched for
    pub category: String,

    pub providers: Vec<ServiceProvider>,

    /// Web pages the search was grounded on
    #[serde(default)]
    pub sources: Vec<String>,
}

impl LocalSearchResult {
    /// An empty result, used when the lookup fails
    pub fn empty(phase_index: usize, category: impl Into<String>) -> Self {
        Self {
            phase_index,
            category: category.into(),
            providers: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_tolerates_missing_fields() {
        let json = serde_json::json!({
            "providers": [
                { "name": "Green Depave Co", "phone": "+49 30 1234" },
                { "name": "Wildflower Nursery", "address": "Gartenstr. 1" }
            ]
        });
        let dir: ServiceDirectory = serde_json::from_value(json).unwrap();
        assert_eq!(dir.providers.len(), 2);
        assert_eq!(dir.providers[0].address, "");
        assert_eq!(dir.providers[1].address, "Gartenstr. 1");
    }

    #[test]
    fn test_empty_directory() {
        let dir: ServiceDirectory = serde_json::from_str("{}").unwrap();
        assert!(dir.providers.is_empty());
    }

    #[test]
    fn test_empty_result() {
        let result = LocalSearchResult::empty(2, "arborist");
        assert!(result.is_empty());
        assert_eq!(result.phase_index, 2);
        assert_eq!(result.category, "arborist");
    }
}
