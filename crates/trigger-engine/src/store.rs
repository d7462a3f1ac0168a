//! Watch-driven trigger mirror backed by etcd
//!
//! The store keeps a namespace-partitioned in-memory index of every
//! trigger definition under a configured key prefix, populated by a full
//! load and kept current by a continuous watch. Mutations are
//! write-through: `save_trigger`/`delete_trigger` touch only the remote
//! store, and the index catches up when the watch delivers the
//! corresponding notification. Callers must not assume a write is
//! visible in `get_triggers` the moment the call returns.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, EventType, GetOptions, WatchOptions};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use shared::{config::normalize_prefix, EtcdConfig, Trigger};

use crate::codec;
use crate::index::TriggerIndex;
use crate::keys;

/// The trigger store contract shared by the etcd mirror and test doubles
#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Fetch every trigger under the prefix and atomically replace the
    /// in-memory index
    async fn load_all(&self) -> Result<()>;

    /// Consume the change feed until cancelled or the feed dies.
    ///
    /// Runs on the caller's task; callers normally `tokio::spawn` it.
    /// Starting a new watch stops any prior one on the same store.
    async fn watch(&self) -> Result<()>;

    /// Snapshot of all triggers in a namespace (empty if unknown)
    fn get_triggers(&self, namespace: &str) -> Vec<Trigger>;

    /// Snapshot of all triggers across every namespace
    fn get_all_triggers(&self) -> Vec<Trigger>;

    /// Write a trigger definition through to the remote store.
    ///
    /// The in-memory index is updated only by the subsequent watch
    /// notification (eventual visibility).
    async fn save_trigger(&self, namespace: &str, name: &str, trigger: &Trigger) -> Result<()>;

    /// Delete a trigger definition from the remote store; index removal
    /// is likewise driven by the watch
    async fn delete_trigger(&self, namespace: &str, name: &str) -> Result<()>;

    /// Stop the active watch, if any. Idempotent.
    fn close(&self);
}

/// Trigger store backed by etcd
pub struct EtcdTriggerStore {
    client: Client,
    prefix: String,
    index: TriggerIndex,
    watch_cancel: Mutex<Option<CancellationToken>>,
}

impl EtcdTriggerStore {
    /// Connect to the etcd cluster described by `config`.
    ///
    /// The prefix is normalized to end with `/`.
    pub async fn connect(config: &EtcdConfig) -> Result<Self> {
        let options = ConnectOptions::new()
            .with_connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        let client = Client::connect(&config.endpoints, Some(options))
            .await
            .context("failed to connect to etcd")?;

        Ok(Self {
            client,
            prefix: normalize_prefix(&config.prefix),
            index: TriggerIndex::new(),
            watch_cancel: Mutex::new(None),
        })
    }

    /// The normalized key prefix this store mirrors
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Apply one watch notification to the index. Errors are contained
    /// here: a bad key or an undecodable value must not end the feed.
    fn apply(&self, event: &etcd_client::Event) {
        let Some(kv) = event.kv() else {
            return;
        };

        let result = match event.event_type() {
            EventType::Put => process_put(&self.index, &self.prefix, kv.key(), kv.value()),
            EventType::Delete => process_delete(&self.index, &self.prefix, kv.key()),
        };

        if let Err(e) = result {
            tracing::warn!(
                key = %String::from_utf8_lossy(kv.key()),
                error = %format!("{:#}", e),
                "Failed to process trigger change notification"
            );
        }
    }
}

#[async_trait]
impl TriggerStore for EtcdTriggerStore {
    async fn load_all(&self) -> Result<()> {
        let mut client = self.client.clone();
        let resp = client
            .get(self.prefix.as_str(), Some(GetOptions::new().with_prefix()))
            .await
            .context("failed to fetch triggers from store")?;

        // Stage into a fresh map so a decode failure can never leave a
        // partially-decoded trigger in the live index; bad entries are
        // skipped and reported, siblings load normally.
        let mut fresh: HashMap<String, HashMap<String, Trigger>> = HashMap::new();
        let mut loaded = 0usize;
        let mut skipped = 0usize;
        for kv in resp.kvs() {
            match decode_entry(&self.prefix, kv.key(), kv.value()) {
                Ok((namespace, name, trigger)) => {
                    fresh.entry(namespace).or_default().insert(name, trigger);
                    loaded += 1;
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        key = %String::from_utf8_lossy(kv.key()),
                        error = %format!("{:#}", e),
                        "Skipping undecodable trigger definition"
                    );
                }
            }
        }

        self.index.replace_all(fresh);
        tracing::info!(loaded = loaded, skipped = skipped, "Trigger index loaded");
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        // Stop any prior watch before starting a new one
        let token = CancellationToken::new();
        let previous = self
            .watch_cancel
            .lock()
            .expect("watch cancel lock poisoned")
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let mut client = self.client.clone();
        let (mut watcher, mut stream) = client
            .watch(self.prefix.as_str(), Some(WatchOptions::new().with_prefix()))
            .await
            .context("failed to open trigger watch")?;

        tracing::info!(prefix = %self.prefix, "Watching for trigger changes");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    watcher.cancel().await.ok();
                    tracing::info!("Trigger watch cancelled");
                    return Ok(());
                }
                message = stream.message() => {
                    match message {
                        Ok(Some(resp)) => {
                            for event in resp.events() {
                                self.apply(event);
                            }
                        }
                        // The feed died; reconnecting (and re-loading to
                        // close the gap) is the caller's decision.
                        Ok(None) => bail!("trigger watch channel closed"),
                        Err(e) => return Err(e).context("trigger watch failed"),
                    }
                }
            }
        }
    }

    fn get_triggers(&self, namespace: &str) -> Vec<Trigger> {
        self.index.get(namespace)
    }

    fn get_all_triggers(&self) -> Vec<Trigger> {
        self.index.get_all()
    }

    async fn save_trigger(&self, namespace: &str, name: &str, trigger: &Trigger) -> Result<()> {
        let doc = codec::encode(trigger)?;
        let key = keys::trigger_key(&self.prefix, namespace, name);

        let mut client = self.client.clone();
        client
            .put(key.as_str(), doc, None)
            .await
            .with_context(|| format!("failed to save trigger {}", key))?;

        tracing::debug!(key = %key, "Saved trigger definition");
        Ok(())
    }

    async fn delete_trigger(&self, namespace: &str, name: &str) -> Result<()> {
        let key = keys::trigger_key(&self.prefix, namespace, name);

        let mut client = self.client.clone();
        client
            .delete(key.as_str(), None)
            .await
            .with_context(|| format!("failed to delete trigger {}", key))?;

        tracing::debug!(key = %key, "Deleted trigger definition");
        Ok(())
    }

    fn close(&self) {
        if let Some(token) = self
            .watch_cancel
            .lock()
            .expect("watch cancel lock poisoned")
            .take()
        {
            token.cancel();
        }
    }
}

fn decode_entry(prefix: &str, key: &[u8], value: &[u8]) -> Result<(String, String, Trigger)> {
    let key = std::str::from_utf8(key).context("trigger key is not valid UTF-8")?;
    let (namespace, name) = keys::parse_key(prefix, key)?;
    let trigger = codec::decode(value)
        .with_context(|| format!("failed to parse trigger {}/{}", namespace, name))?;
    Ok((namespace, name, trigger))
}

/// Apply an upsert notification: decode the value and replace the entry
/// at `(namespace, name)`. Idempotent; first-seen and updated triggers
/// are handled identically.
fn process_put(index: &TriggerIndex, prefix: &str, key: &[u8], value: &[u8]) -> Result<()> {
    let (namespace, name, trigger) = decode_entry(prefix, key, value)?;
    index.upsert(&namespace, &name, trigger);
    Ok(())
}

/// Apply a delete notification: remove the entry at `(namespace, name)`
/// if present (absence is not an error).
fn process_delete(index: &TriggerIndex, prefix: &str, key: &[u8]) -> Result<()> {
    let key = std::str::from_utf8(key).context("trigger key is not valid UTF-8")?;
    let (namespace, name) = keys::parse_key(prefix, key)?;
    index.remove(&namespace, &name);
    Ok(())
}
