// file: src/classifier/schema.rs
// description: builders for closed JSON output schemas (no extra fields, all fields required)

use serde_json::{json, Value};

/// Object schema with every property required and no additional fields
/// accepted. Stage contracts are closed: an undeclared field in the output
/// is a schema violation.
pub fn object(properties: &[(&str, Value)]) -> Value {
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();

    json!({
        "type": "object",
        "properties": props,
        "required": required,
        "additionalProperties": false
    })
}

pub fn array(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

pub fn string() -> Value {
    json!({ "type": "string" })
}

pub fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

pub fn integer() -> Value {
    json!({ "type": "integer" })
}

pub fn number() -> Value {
    json!({ "type": "number" })
}

pub fn string_enum(values: &[&str]) -> Value {
    json!({ "type": "string", "enum": values })
}

pub fn nullable_enum(values: &[&str]) -> Value {
    json!({ "type": ["string", "null"], "enum": values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_object_closes_schema() {
        let schema = object(&[("flag", string_enum(&["success", "fail"])), ("reason", nullable_string())]);

        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["flag", "reason"]));
        assert_eq!(schema["properties"]["flag"]["enum"], json!(["success", "fail"]));
    }

    #[test]
    fn test_array_wraps_items() {
        let schema = array(object(&[("id", integer())]));
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn test_nullable_variants() {
        assert_eq!(nullable_string()["type"], json!(["string", "null"]));
        assert_eq!(
            nullable_enum(&["Hot", "Cold"])["type"],
            json!(["string", "null"])
        );
    }
}
