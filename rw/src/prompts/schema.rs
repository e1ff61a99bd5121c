//! Structured-output schemas
//!
//! Response schemas in the OpenAPI subset the AI service accepts. Property
//! names must stay in step with the serde names of the domain types.

use serde_json::{Value, json};

use crate::ai::CallKind;
use crate::domain::{RestorationType, SunlightLevel};

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn string_list() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn integer(description: &str) -> Value {
    json!({ "type": "INTEGER", "description": description })
}

fn number(description: &str) -> Value {
    json!({ "type": "NUMBER", "description": description })
}

/// Schema for [`crate::domain::SiteAnalysis`]
pub fn analysis_schema() -> Value {
    let sunlight: Vec<&str> = SunlightLevel::ALL.iter().map(|s| s.code()).collect();
    let types: Vec<&str> = RestorationType::ALL.iter().map(|t| t.code()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "summary": string(),
            "sunlight": { "type": "STRING", "enum": sunlight },
            "soilSealingPercent": integer("0-100"),
            "biodiversityScore": integer("0-100"),
            "hardinessZone": string(),
            "estimatedAreaSqm": number("square metres"),
            "features": string_list(),
            "deficits": string_list(),
            "suitability": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "restorationType": { "type": "STRING", "enum": types },
                        "score": integer("0-100"),
                        "rationale": string(),
                    },
                    "required": ["restorationType", "score", "rationale"],
                },
            },
        },
        "required": [
            "summary",
            "sunlight",
            "soilSealingPercent",
            "biodiversityScore",
            "hardinessZone",
            "estimatedAreaSqm",
            "features",
            "deficits",
            "suitability",
        ],
    })
}

/// Schema for [`crate::domain::RestorationPlan`]
pub fn plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string(),
            "summary": string(),
            "totalDuration": string(),
            "totalCost": number("sum of phase costs"),
            "currencySymbol": string(),
            "phases": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string(),
                        "duration": string(),
                        "tasks": string_list(),
                        "materials": string_list(),
                        "cost": number("in the plan currency"),
                        "serviceCategory": string(),
                    },
                    "required": ["name", "duration", "tasks", "materials", "cost", "serviceCategory"],
                },
            },
            "maintenance": string_list(),
            "impact": string_list(),
        },
        "required": [
            "title",
            "summary",
            "totalDuration",
            "totalCost",
            "currencySymbol",
            "phases",
            "maintenance",
            "impact",
        ],
    })
}

/// Schema for [`crate::domain::ServiceDirectory`]
///
/// Search-grounded calls cannot carry a response schema, so the model sees
/// the shape in the prompt and replies are checked against this on arrival.
pub fn services_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "providers": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string(),
                        "description": string(),
                        "phone": string(),
                        "address": string(),
                    },
                    "required": ["name"],
                },
            },
        },
        "required": ["providers"],
    })
}

/// The schema a structured reply of `kind` is checked against
///
/// `None` for image replies.
pub fn schema_for(kind: CallKind) -> Option<Value> {
    match kind {
        CallKind::SiteAnalysis => Some(analysis_schema()),
        CallKind::Plan => Some(plan_schema()),
        CallKind::ServiceLookup => Some(services_schema()),
        CallKind::Vision => None,
    }
}

/// Keys listed in `required` that are missing from `value`
///
/// Walks nested objects and arrays of objects.
pub fn missing_required(schema: &Value, value: &Value) -> Vec<String> {
    let mut missing = Vec::new();
    collect_missing(schema, value, "", &mut missing);
    missing
}

fn collect_missing(schema: &Value, value: &Value, path: &str, missing: &mut Vec<String>) {
    match schema["type"].as_str() {
        Some("OBJECT") => {
            let Some(obj) = value.as_object() else {
                return;
            };
            for key in schema["required"].as_array().into_iter().flatten().filter_map(Value::as_str) {
                if !obj.contains_key(key) {
                    missing.push(format!("{}{}", path, key));
                }
            }
            if let Some(props) = schema["properties"].as_object() {
                for (key, sub) in props {
                    if let Some(child) = obj.get(key) {
                        collect_missing(sub, child, &format!("{}{}.", path, key), missing);
                    }
                }
            }
        }
        Some("ARRAY") => {
            for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                collect_missing(&schema["items"], item, &format!("{}{}.", path, i), missing);
            }
        }
        _ => {}
    }
}
