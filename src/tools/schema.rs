//! JSON-schema fragments for structured model replies.
//!
//! Objects are emitted in strict form: every property required and
//! `additionalProperties: false`.

use serde_json::{Map, Value, json};

pub(crate) fn object(props: &[(&str, Value)]) -> Value {
    let mut properties = Map::new();
    for (name, schema) in props {
        properties.insert((*name).to_string(), schema.clone());
    }
    let required: Vec<&str> = props.iter().map(|(name, _)| *name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

pub(crate) fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub(crate) fn integer(description: &str, minimum: i64, maximum: i64) -> Value {
    json!({ "type": "integer", "description": description, "minimum": minimum, "maximum": maximum })
}

pub(crate) fn array(items: Value, min_items: usize, description: &str) -> Value {
    json!({ "type": "array", "description": description, "items": items, "minItems": min_items })
}

pub(crate) fn string_array(min_items: usize, description: &str) -> Value {
    array(json!({ "type": "string" }), min_items, description)
}

pub(crate) fn string_enum(values: &[&str], description: &str) -> Value {
    json!({ "type": "string", "enum": values, "description": description })
}
