//! Host configuration model built from a capability description.
//!
//! Every field descriptor becomes one [`Entry`]: the attributes shared by all
//! kinds live on the entry, the kind-specific payload lives in [`Field`].
//! Entries are ordered by `index` only; ties keep the order in which the
//! descriptors were collected (booleans, decimals, integers, strings, selects).

use serde::Serialize;

use crate::api::{self, DescriptionResponse};
use crate::locale::LocalizedText;

/// Ordered configuration model handed to the host.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub entries: Vec<Entry>,
}

impl Model {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn arguments(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.argument.as_str()).collect()
    }

    pub fn get(&self, argument: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.argument == argument)
    }
}

/// One configurable parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// Key passed to the microservice at execution time.
    pub argument: String,
    pub index: i32,
    pub disabled: bool,
    pub label: LocalizedText,
    pub description: LocalizedText,
    pub field: Field,
}

/// Kind-specific payload of an [`Entry`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Field {
    Boolean {
        default_value: Option<bool>,
    },
    Decimal(NumberField<f64>),
    Integer(NumberField<i64>),
    String {
        default_value: Option<String>,
        placeholder: LocalizedText,
    },
    Select {
        multiple_options: bool,
        options: Vec<SelectOption>,
    },
}

/// Constraints shared by decimal and integer fields.
#[derive(Debug, Clone, Serialize)]
pub struct NumberField<T> {
    pub default_value: Option<T>,
    pub placeholder: LocalizedText,
    pub step: Option<T>,
    pub minimum: Option<T>,
    pub maximum: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub description: LocalizedText,
    pub selected: bool,
    pub disabled: bool,
}

/// Build the configuration model.
///
/// Returns `None` when there is no description or it carries no field schema,
/// so callers can tell "not initialized" apart from "no fields".
pub fn build_model(description: Option<&DescriptionResponse>) -> Option<Model> {
    let schema = description?.model.as_ref()?;

    let mut entries = Vec::with_capacity(schema.len());
    entries.extend(schema.booleans.iter().map(boolean_entry));
    entries.extend(schema.decimals.iter().map(decimal_entry));
    entries.extend(schema.integers.iter().map(integer_entry));
    entries.extend(schema.strings.iter().map(string_entry));
    entries.extend(schema.selects.iter().map(select_entry));

    // sort_by_key is stable
    entries.sort_by_key(|entry| entry.index);

    Some(Model { entries })
}

fn text(raw: &Option<String>) -> LocalizedText {
    LocalizedText::fixed(raw.clone())
}

fn boolean_entry(field: &api::BooleanField) -> Entry {
    Entry {
        argument: field.argument.clone(),
        index: field.index,
        disabled: field.disabled,
        label: text(&field.label),
        description: text(&field.description),
        field: Field::Boolean {
            default_value: field.default_value,
        },
    }
}

fn decimal_entry(field: &api::DecimalField) -> Entry {
    Entry {
        argument: field.argument.clone(),
        index: field.index,
        disabled: field.disabled,
        label: text(&field.label),
        description: text(&field.description),
        field: Field::Decimal(NumberField {
            default_value: field.default_value,
            placeholder: text(&field.placeholder),
            step: field.step,
            minimum: field.minimum,
            maximum: field.maximum,
        }),
    }
}

fn integer_entry(field: &api::IntegerField) -> Entry {
    Entry {
        argument: field.argument.clone(),
        index: field.index,
        disabled: field.disabled,
        label: text(&field.label),
        description: text(&field.description),
        field: Field::Integer(NumberField {
            default_value: field.default_value,
            placeholder: text(&field.placeholder),
            step: field.step,
            minimum: field.minimum,
            maximum: field.maximum,
        }),
    }
}

fn string_entry(field: &api::StringField) -> Entry {
    Entry {
        argument: field.argument.clone(),
        index: field.index,
        disabled: field.disabled,
        label: text(&field.label),
        description: text(&field.description),
        field: Field::String {
            default_value: field.default_value.clone(),
            placeholder: text(&field.placeholder),
        },
    }
}

fn select_entry(field: &api::SelectField) -> Entry {
    let options = field
        .items
        .iter()
        .map(|item| SelectOption {
            value: item.value.clone(),
            description: text(&item.description),
            selected: item.selected,
            disabled: item.disabled,
        })
        .collect();

    Entry {
        argument: field.argument.clone(),
        index: field.index,
        disabled: field.disabled,
        label: text(&field.label),
        description: text(&field.description),
        field: Field::Select {
            multiple_options: field.multiple_options,
            options,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use proptest::prelude::*;

    fn description(json: &str) -> DescriptionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_orders_by_index() {
        let desc = description(
            r#"{"model": {"integers": [
                {"argument": "iters", "index": 2},
                {"argument": "n", "index": 1}
            ]}}"#,
        );
        let model = build_model(Some(&desc)).unwrap();
        assert_eq!(model.arguments(), vec!["n", "iters"]);
    }

    #[test]
    fn test_orders_across_kinds_and_keeps_ties_stable() {
        let desc = description(
            r#"{"model": {
                "booleans": [{"argument": "b", "index": 5}, {"argument": "tie-a", "index": 3}],
                "decimals": [{"argument": "d", "index": 0}],
                "strings": [{"argument": "tie-b", "index": 3}],
                "selects": [{"argument": "s", "index": -1, "items": []}]
            }}"#,
        );
        let model = build_model(Some(&desc)).unwrap();
        assert_eq!(model.len(), 5);
        assert_eq!(model.arguments(), vec!["s", "d", "tie-a", "tie-b", "b"]);
        assert!(model.entries.windows(2).all(|w| w[0].index <= w[1].index));
    }

    #[test]
    fn test_absent_description_is_unavailable() {
        assert!(build_model(None).is_none());
        assert!(build_model(Some(&description(r#"{"description": "x"}"#))).is_none());
    }

    #[test]
    fn test_empty_schema_is_empty_model() {
        let model = build_model(Some(&description(r#"{"model": {}}"#))).unwrap();
        assert!(model.is_empty());

        let model = build_model(Some(&description(r#"{"model": {"booleans": []}}"#))).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn test_preserves_descriptor_attributes() {
        let desc = description(
            r#"{"model": {
                "decimals": [{
                    "argument": "lr", "index": 0, "defaultValue": 0.001,
                    "label": "Learning rate", "description": "Optimizer step size",
                    "placeholder": "0.001", "step": 0.0001, "minimum": 0.0, "maximum": 1.0,
                    "disabled": true
                }],
                "selects": [{
                    "argument": "model", "index": 1, "label": "Model", "multipleOptions": true,
                    "items": [
                        {"value": "fraktur", "description": "Fraktur", "selected": true},
                        {"value": "antiqua", "disabled": true}
                    ]
                }]
            }}"#,
        );
        let model = build_model(Some(&desc)).unwrap();
        let locale = Locale::default();

        let lr = model.get("lr").unwrap();
        assert!(lr.disabled);
        assert_eq!(lr.label.resolve(&locale).as_deref(), Some("Learning rate"));
        assert_eq!(lr.description.raw(), Some("Optimizer step size"));
        match &lr.field {
            Field::Decimal(number) => {
                assert_eq!(number.default_value, Some(0.001));
                assert_eq!(number.step, Some(0.0001));
                assert_eq!(number.minimum, Some(0.0));
                assert_eq!(number.maximum, Some(1.0));
                assert_eq!(number.placeholder.raw(), Some("0.001"));
            }
            other => panic!("expected decimal field, got {:?}", other),
        }

        match &model.get("model").unwrap().field {
            Field::Select {
                multiple_options,
                options,
            } => {
                assert!(*multiple_options);
                assert_eq!(options.len(), 2);
                assert!(options[0].selected);
                assert_eq!(options[0].description.resolve(&locale).as_deref(), Some("Fraktur"));
                assert!(options[1].disabled);
                assert!(options[1].description.raw().is_none());
            }
            other => panic!("expected select field, got {:?}", other),
        }
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let desc = description(
            r#"{"model": {"booleans": [{"argument": "gpu", "index": 0, "defaultValue": true}]}}"#,
        );
        let model = build_model(Some(&desc)).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["entries"][0]["field"]["kind"], "boolean");
        assert_eq!(json["entries"][0]["field"]["default_value"], true);
        assert_eq!(json["entries"][0]["argument"], "gpu");
    }

    const KINDS: [&str; 5] = ["booleans", "decimals", "integers", "strings", "selects"];

    /// Descriptor document with one descriptor per index, named `{kind}-{position}`.
    fn generated(indices: &[Vec<i32>]) -> serde_json::Value {
        let mut model = serde_json::Map::new();
        for (kind, group) in KINDS.iter().zip(indices) {
            let descriptors = group
                .iter()
                .enumerate()
                .map(|(i, index)| serde_json::json!({"argument": format!("{kind}-{i}"), "index": index}))
                .collect();
            model.insert(kind.to_string(), serde_json::Value::Array(descriptors));
        }
        serde_json::json!({ "model": model })
    }

    proptest! {
        #[test]
        fn test_model_order_is_stable_by_index(
            indices in prop::collection::vec(prop::collection::vec(-3i32..3, 0..6), 5)
        ) {
            let desc: DescriptionResponse = serde_json::from_value(generated(&indices)).unwrap();
            let model = build_model(Some(&desc)).unwrap();

            prop_assert_eq!(model.len(), desc.model.as_ref().unwrap().len());
            prop_assert!(model.entries.windows(2).all(|w| w[0].index <= w[1].index));

            let mut expected: Vec<(i32, String)> = KINDS
                .iter()
                .zip(&indices)
                .flat_map(|(kind, group)| {
                    group.iter().enumerate().map(move |(i, index)| (*index, format!("{kind}-{i}")))
                })
                .collect();
            expected.sort_by_key(|(index, _)| *index);
            let expected: Vec<&str> = expected.iter().map(|(_, argument)| argument.as_str()).collect();
            prop_assert_eq!(model.arguments(), expected);
        }
    }
}
