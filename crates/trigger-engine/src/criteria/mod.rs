//! Criteria evaluator
//!
//! Decides, per event, whether a trigger matches. Two modes:
//!
//! - **Implicit match**: when a trigger carries no criteria expression,
//!   matching is the conjunction of equality checks on
//!   `event_type` / `namespace` / `object_type`, where an empty trigger
//!   field matches everything on that dimension.
//! - **Expression match**: the criteria string is compiled and run
//!   against a read-only environment exposing a single root variable
//!   `event`, a tree mirroring the event's wire field names. A
//!   `has(map, "a.b.c")` predicate is available for probing nested
//!   payload paths.
//!
//! A disabled trigger never matches, regardless of criteria.

mod eval;
mod parser;

pub use parser::Program;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use shared::{Event, Trigger};

/// Returns true if the event satisfies the trigger's criteria.
///
/// Compiles the criteria expression on every call; evaluation loops
/// should prefer [`Matcher`], which caches compiled programs per
/// criteria string.
pub fn match_trigger(trigger: &Trigger, event: &Event) -> Result<bool> {
    if !trigger.enabled {
        return Ok(false);
    }

    if trigger.criteria.is_empty() {
        return Ok(implicit_match(trigger, event));
    }

    let program = Program::compile(&trigger.criteria).context("failed to compile criteria")?;
    run(&program, event)
}

/// Fallback matching for triggers without a criteria expression
fn implicit_match(trigger: &Trigger, event: &Event) -> bool {
    (trigger.event_type.is_empty() || trigger.event_type == event.event_type)
        && (trigger.namespace.is_empty() || trigger.namespace == event.namespace)
        && (trigger.object_type.is_empty() || trigger.object_type == event.object_type)
}

fn run(program: &Program, event: &Event) -> Result<bool> {
    program
        .eval(&event_env(event))
        .context("failed to evaluate criteria")
}

/// Build the environment tree for an event, keyed by the wire field names
/// the criteria language addresses.
fn event_env(event: &Event) -> Value {
    json!({
        "event": {
            "event_id": event.id.clone(),
            "event_type": event.event_type.clone(),
            "event_version": event.event_version.clone(),
            "namespace": event.namespace.clone(),
            "object_type": event.object_type.clone(),
            "object_id": event.object_id.clone(),
            "timestamp": event.timestamp.to_rfc3339(),
            "actor": {
                "type": event.actor.kind.clone(),
                "id": event.actor.id.clone(),
            },
            "context": {
                "request_id": event.context.request_id.clone(),
                "trace_id": event.context.trace_id.clone(),
            },
            "payload": {
                "before": event.payload.before.clone(),
                "after": event.payload.after.clone(),
            },
            "nats_meta": {
                "stream": event.nats_meta.stream.clone(),
                "sequence": event.nats_meta.sequence,
                "received_at": event.nats_meta.received_at.to_rfc3339(),
            },
        }
    })
}

/// Trigger matcher with a compiled-program cache.
///
/// Compilation is expensive relative to evaluation; the cache is keyed by
/// the criteria source string, so the same expression shared by many
/// triggers compiles once.
#[derive(Debug, Default)]
pub struct Matcher {
    programs: RwLock<HashMap<String, Arc<Program>>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the event satisfies the trigger's criteria
    pub fn matches(&self, trigger: &Trigger, event: &Event) -> Result<bool> {
        if !trigger.enabled {
            return Ok(false);
        }

        if trigger.criteria.is_empty() {
            return Ok(implicit_match(trigger, event));
        }

        let program = self.program(&trigger.criteria)?;
        run(&program, event)
    }

    /// Evaluate every candidate against the event, returning the matching
    /// subset. Evaluation failures are contained per trigger: logged and
    /// treated as non-matches so one bad criteria string cannot take down
    /// the processing of sibling triggers.
    pub fn matching(&self, candidates: &[Trigger], event: &Event) -> Vec<Trigger> {
        let mut matched = Vec::new();
        for trigger in candidates {
            match self.matches(trigger, event) {
                Ok(true) => matched.push(trigger.clone()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        namespace = %trigger.namespace,
                        trigger_id = %trigger.id,
                        error = %format!("{:#}", e),
                        "Failed to evaluate trigger criteria"
                    );
                }
            }
        }
        matched
    }

    fn program(&self, criteria: &str) -> Result<Arc<Program>> {
        if let Some(program) = self
            .programs
            .read()
            .expect("criteria cache lock poisoned")
            .get(criteria)
        {
            return Ok(program.clone());
        }

        let program = Arc::new(Program::compile(criteria).context("failed to compile criteria")?);
        self.programs
            .write()
            .expect("criteria cache lock poisoned")
            .insert(criteria.to_string(), program.clone());
        Ok(program)
    }
}
