//! Trigger definition codec
//!
//! Triggers are stored and edited as YAML documents with stable field
//! names. A valid document missing optional fields decodes to a trigger
//! with those fields at their zero value.

use anyhow::{Context, Result};
use std::io::Read;

use shared::Trigger;

/// Serialize a trigger to its YAML definition document
pub fn encode(trigger: &Trigger) -> Result<String> {
    serde_yaml::to_string(trigger).context("failed to encode trigger definition")
}

/// Parse a trigger definition document
pub fn decode(bytes: &[u8]) -> Result<Trigger> {
    serde_yaml::from_slice(bytes).context("failed to parse trigger definition")
}

/// Load a trigger definition from a reader, e.g. an operator-authored file
pub fn from_reader<R: Read>(reader: R) -> Result<Trigger> {
    serde_yaml::from_reader(reader).context("failed to parse trigger definition")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let trigger = Trigger {
            id: "high-value-orders".to_string(),
            name: "High value orders".to_string(),
            namespace: "billing".to_string(),
            object_type: "order".to_string(),
            event_type: "order.created".to_string(),
            criteria: "event.payload.after.amount > 1000".to_string(),
            description: "Orders worth escalating".to_string(),
            enabled: true,
        };

        let doc = encode(&trigger).unwrap();
        let decoded = decode(doc.as_bytes()).unwrap();
        assert_eq!(decoded, trigger);
    }

    #[test]
    fn test_round_trip_zero_value_trigger() {
        let trigger = Trigger::default();
        let decoded = decode(encode(&trigger).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded, trigger);
    }

    #[test]
    fn test_decode_fills_missing_fields_with_zero_values() {
        let doc = "id: t1\nnamespace: core\nenabled: true\n";
        let trigger = decode(doc.as_bytes()).unwrap();

        assert_eq!(trigger.id, "t1");
        assert_eq!(trigger.namespace, "core");
        assert!(trigger.enabled);
        assert_eq!(trigger.name, "");
        assert_eq!(trigger.event_type, "");
        assert_eq!(trigger.object_type, "");
        assert_eq!(trigger.criteria, "");
        assert_eq!(trigger.description, "");
    }

    #[test]
    fn test_decode_rejects_structurally_invalid_input() {
        assert!(decode(b"{not yaml: [").is_err());
        assert!(decode(b"- a\n- b\n").is_err());
    }

    #[test]
    fn test_from_reader() {
        let doc = "id: t1\nname: Reader\nnamespace: core\nenabled: false\n";
        let trigger = from_reader(doc.as_bytes()).unwrap();
        assert_eq!(trigger.name, "Reader");
        assert!(!trigger.enabled);
    }
}
