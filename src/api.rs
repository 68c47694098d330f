//! Calamari microservice API: request mappings and capability document types.
//!
//! The description document is decoded leniently: unknown fields are ignored
//! so the remote schema can grow, while `argument` and `index` are required
//! on every field descriptor.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

macro_rules! api_context_path {
    () => {
        "/api"
    };
}

macro_rules! api_v1_path {
    ($($path:literal),*) => {
        concat!(api_context_path!(), "/v1.0/", $($path),*)
    };
}

macro_rules! scheduler_path {
    ($path:literal) => {
        api_v1_path!("scheduler/", $path)
    };
}

/// The api context path.
pub const API_CONTEXT_PATH: &str = api_context_path!();

/// The api version 1.0 prefix path.
pub const API_V1_PREFIX: &str = api_v1_path!("");

/// Scheduler liveness check.
pub const PING_REQUEST_MAPPING: &str = scheduler_path!("ping");

/// Scheduler job status.
pub const SCHEDULER_JOB_REQUEST_MAPPING: &str = scheduler_path!("job/{id}");

/// Scheduler job cleanup.
pub const EXPUNGE_JOB_REQUEST_MAPPING: &str = scheduler_path!("expunge/{id}");

/// The kinds of Calamari processors exposed by the microservice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorType {
    Evaluation,
    Recognition,
    Training,
}

impl ProcessorType {
    pub const ALL: [ProcessorType; 3] = [
        ProcessorType::Evaluation,
        ProcessorType::Recognition,
        ProcessorType::Training,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorType::Evaluation => "evaluation",
            ProcessorType::Recognition => "recognition",
            ProcessorType::Training => "training",
        }
    }

    /// Parse a path segment into a processor type.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mappings for one processor type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMappings {
    pub description: String,
    pub execute: String,
    pub job: String,
}

impl RequestMappings {
    pub fn new(kind: ProcessorType) -> Self {
        Self {
            description: format!("{}{}/description", API_V1_PREFIX, kind),
            execute: format!("{}{}/execute", API_V1_PREFIX, kind),
            job: format!("{}{}/job/{{id}}", API_V1_PREFIX, kind),
        }
    }

    pub fn ping(&self) -> &'static str {
        PING_REQUEST_MAPPING
    }

    pub fn scheduler_job(&self) -> &'static str {
        SCHEDULER_JOB_REQUEST_MAPPING
    }

    pub fn expunge_job(&self) -> &'static str {
        EXPUNGE_JOB_REQUEST_MAPPING
    }
}

/// Substitute the `{id}` placeholder of a request mapping.
pub fn expand_id(template: &str, id: impl fmt::Display) -> String {
    template.replace("{id}", &id.to_string())
}

// ============================================================================
// Description document
// ============================================================================

/// Decode `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Capability document returned by `GET {prefix}{type}/description`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionResponse {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<String>,
    #[serde(default)]
    pub model: Option<FieldModel>,
}

impl DescriptionResponse {
    /// Total number of field descriptors across all kinds.
    pub fn field_count(&self) -> usize {
        self.model.as_ref().map(FieldModel::len).unwrap_or(0)
    }
}

/// Field descriptors grouped by kind. Absent groups decode as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldModel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub booleans: Vec<BooleanField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decimals: Vec<DecimalField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub integers: Vec<IntegerField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strings: Vec<StringField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selects: Vec<SelectField>,
}

impl FieldModel {
    pub fn len(&self) -> usize {
        self.booleans.len()
            + self.decimals.len()
            + self.integers.len()
            + self.strings.len()
            + self.selects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanField {
    pub argument: String,
    #[serde(default)]
    pub default_value: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub index: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalField {
    pub argument: String,
    #[serde(default)]
    pub default_value: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    pub index: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegerField {
    pub argument: String,
    #[serde(default)]
    pub default_value: Option<i64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub step: Option<i64>,
    #[serde(default)]
    pub minimum: Option<i64>,
    #[serde(default)]
    pub maximum: Option<i64>,
    pub index: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringField {
    pub argument: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    pub index: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectField {
    pub argument: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub multiple_options: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SelectItem>,
    pub index: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

/// One option of a select field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectItem {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_mappings() {
        let mappings = RequestMappings::new(ProcessorType::Recognition);
        assert_eq!(mappings.description, "/api/v1.0/recognition/description");
        assert_eq!(mappings.execute, "/api/v1.0/recognition/execute");
        assert_eq!(expand_id(&mappings.job, 42), "/api/v1.0/recognition/job/42");
        assert_eq!(mappings.ping(), "/api/v1.0/scheduler/ping");
        assert_eq!(
            expand_id(mappings.expunge_job(), 7),
            "/api/v1.0/scheduler/expunge/7"
        );
        assert_eq!(expand_id(mappings.scheduler_job(), 7), "/api/v1.0/scheduler/job/7");
        assert!(PING_REQUEST_MAPPING.starts_with(API_CONTEXT_PATH));
    }

    #[test]
    fn test_processor_type_parse() {
        assert_eq!(ProcessorType::parse("training"), Some(ProcessorType::Training));
        assert_eq!(ProcessorType::parse("Training"), None);
        assert_eq!(ProcessorType::Evaluation.to_string(), "evaluation");
    }

    #[test]
    fn test_decode_tolerates_unknown_fields() {
        let json = r#"{
            "description": "Calamari line recognition",
            "categories": ["ocr"],
            "steps": ["recognition"],
            "vendor": {"build": 17},
            "model": {
                "integers": [{"argument": "n", "index": 1, "defaultValue": 4, "unit": "px"}],
                "selects": [{
                    "argument": "checkpoint",
                    "index": 0,
                    "multipleOptions": true,
                    "items": [{"value": "fraktur", "selected": true, "colour": "red"}]
                }],
                "matrices": []
            }
        }"#;
        let description: DescriptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(description.categories, vec!["ocr"]);
        assert_eq!(description.field_count(), 2);

        let model = description.model.unwrap();
        assert_eq!(model.integers[0].default_value, Some(4));
        assert!(model.selects[0].multiple_options);
        assert!(model.selects[0].items[0].selected);
        assert!(model.booleans.is_empty());
    }

    #[test]
    fn test_decode_requires_argument_and_index() {
        let missing_index = r#"{"model": {"booleans": [{"argument": "x"}]}}"#;
        assert!(serde_json::from_str::<DescriptionResponse>(missing_index).is_err());

        let missing_argument = r#"{"model": {"strings": [{"index": 3}]}}"#;
        assert!(serde_json::from_str::<DescriptionResponse>(missing_argument).is_err());
    }

    #[test]
    fn test_decode_without_model() {
        let description: DescriptionResponse =
            serde_json::from_str(r#"{"description": "d"}"#).unwrap();
        assert!(description.model.is_none());
        assert_eq!(description.field_count(), 0);
    }

    #[test]
    fn test_decode_null_groups_and_flags() {
        let json = r#"{
            "description": null,
            "categories": null,
            "steps": null,
            "model": {
                "booleans": null,
                "decimals": null,
                "integers": [{"argument": "n", "index": 1, "disabled": null}],
                "strings": null,
                "selects": [{
                    "argument": "checkpoint",
                    "index": 0,
                    "multipleOptions": null,
                    "items": null
                }]
            }
        }"#;
        let description: DescriptionResponse = serde_json::from_str(json).unwrap();
        assert!(description.categories.is_empty());
        assert!(description.steps.is_empty());
        assert_eq!(description.field_count(), 2);

        let model = description.model.unwrap();
        assert!(model.booleans.is_empty());
        assert!(!model.integers[0].disabled);
        assert!(!model.selects[0].multiple_options);
        assert!(model.selects[0].items.is_empty());

        let item: SelectItem =
            serde_json::from_str(r#"{"value": "v", "selected": null, "disabled": null}"#).unwrap();
        assert!(!item.selected && !item.disabled);
    }

    #[test]
    fn test_paths_share_versioned_prefix() {
        assert_eq!(API_V1_PREFIX, "/api/v1.0/");
        assert!(API_V1_PREFIX.starts_with(API_CONTEXT_PATH));
        for mapping in [
            PING_REQUEST_MAPPING,
            SCHEDULER_JOB_REQUEST_MAPPING,
            EXPUNGE_JOB_REQUEST_MAPPING,
        ] {
            assert!(mapping.starts_with("/api/v1.0/scheduler/"));
        }
    }
}
