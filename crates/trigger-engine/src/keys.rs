//! Store key derivation and parsing
//!
//! Trigger definitions live in the remote store under
//! `<prefix><namespace>/<name>.yaml`. The extension is informational and
//! stripped when a key is parsed back into its parts.

use anyhow::{bail, Result};

/// Default prefix for trigger keys in the remote store
pub const DEFAULT_TRIGGER_PREFIX: &str = "/triggers/";

/// Extension used when writing trigger definitions
const TRIGGER_KEY_EXT: &str = "yaml";

/// Build the store key for a trigger.
///
/// `prefix` is expected to be normalized (trailing `/`), as produced by
/// `shared::config::normalize_prefix`.
pub fn trigger_key(prefix: &str, namespace: &str, name: &str) -> String {
    format!("{}{}/{}.{}", prefix, namespace, name, TRIGGER_KEY_EXT)
}

/// Parse a store key into `(namespace, trigger_name)`.
///
/// The key must start with `prefix` and contain at least one path
/// separator after it (the namespace segment). The trigger name is the
/// final path segment with any extension removed; intermediate segments
/// between namespace and name are ignored.
pub fn parse_key(prefix: &str, key: &str) -> Result<(String, String)> {
    let Some(rest) = key.strip_prefix(prefix) else {
        bail!("key {} does not have expected prefix {}", key, prefix);
    };

    let mut parts = rest.split('/');
    let namespace = parts.next().unwrap_or_default();
    let Some(mut name) = parts.last() else {
        bail!("invalid key format: {}", rest);
    };
    if namespace.is_empty() || name.is_empty() {
        bail!("invalid key format: {}", rest);
    }

    // Strip the extension, if any
    if let Some((stem, _ext)) = name.rsplit_once('.') {
        if !stem.is_empty() {
            name = stem;
        }
    }

    Ok((namespace.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_key_layout() {
        assert_eq!(
            trigger_key(DEFAULT_TRIGGER_PREFIX, "ns1", "trigger1"),
            "/triggers/ns1/trigger1.yaml"
        );
    }

    #[test]
    fn test_parse_key() {
        let cases = [
            // (key, expected)
            ("/triggers/namespace1/trigger1.yaml", Some(("namespace1", "trigger1"))),
            ("/triggers/namespace1/subdir/trigger2.yaml", Some(("namespace1", "trigger2"))),
            ("/triggers/ns1/no-extension", Some(("ns1", "no-extension"))),
            // wrong prefix
            ("/wrong/namespace1/trigger1.yaml", None),
            // no namespace segment
            ("/triggers/trigger1.yaml", None),
            // empty name segment
            ("/triggers/ns1/", None),
        ];

        for (key, expected) in cases {
            let got = parse_key(DEFAULT_TRIGGER_PREFIX, key);
            match expected {
                Some((ns, name)) => {
                    let (got_ns, got_name) = got.unwrap_or_else(|e| panic!("{}: {}", key, e));
                    assert_eq!(got_ns, ns, "namespace for {}", key);
                    assert_eq!(got_name, name, "name for {}", key);
                }
                None => assert!(got.is_err(), "expected error for {}", key),
            }
        }
    }

    #[test]
    fn test_parse_key_round_trips_trigger_key() {
        let key = trigger_key("/triggers/", "core", "high-value-orders");
        let (ns, name) = parse_key("/triggers/", &key).unwrap();
        assert_eq!(ns, "core");
        assert_eq!(name, "high-value-orders");
    }
}
