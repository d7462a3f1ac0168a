//! Trigger store and matching engine
//!
//! This crate keeps an in-memory mirror of operator-authored trigger
//! definitions consistent with a remote etcd cluster and evaluates
//! incoming events against them:
//!
//! - [`store`]: the watch-driven trigger mirror (load, watch, write-through
//!   mutation, snapshot reads)
//! - [`criteria`]: the boolean rule evaluator (compiled criteria
//!   expressions plus the implicit-match fallback)
//! - [`codec`]: YAML encoding/decoding of trigger definitions
//! - [`keys`]: store key derivation and parsing
//! - [`index`]: the namespace-partitioned in-memory index

pub mod codec;
pub mod criteria;
pub mod index;
pub mod keys;
pub mod store;

// Re-export commonly used types
pub use criteria::{match_trigger, Matcher};
pub use index::TriggerIndex;
pub use keys::DEFAULT_TRIGGER_PREFIX;
pub use store::{EtcdTriggerStore, TriggerStore};
