//! Polling and notification engine.
//!
//! [`SvxNotifier`] fetches the reflector status document, parses every node
//! in it and announces nodes that start talking after a quiet period. It only
//! remembers when each node was last seen talking; a node that pauses briefly
//! and keys up again within the threshold is not announced twice.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::NotifierConfig;
use crate::error::{ListenerError, NotifierError};
use crate::feed::FeedClient;
use crate::listeners::Listener;
use crate::node::Node;

/// Last time each node was observed talking.
#[derive(Debug, Clone, Default)]
pub struct ActivityHistory {
    last_active: HashMap<String, DateTime<Utc>>,
}

impl ActivityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_active(&self, name: &str) -> Option<DateTime<Utc>> {
        self.last_active.get(name).copied()
    }

    pub fn record(&mut self, name: &str, at: DateTime<Utc>) {
        self.last_active.insert(name.to_string(), at);
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }
}

/// What a single poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Entries in the `nodes` mapping
    pub nodes: usize,
    pub hidden: usize,
    pub malformed: usize,
    /// Parsed nodes reporting `isTalker`
    pub active: usize,
    /// Activations that were announced to listeners
    pub notified: usize,
}

/// Polls the status feed and fans activations out to listeners.
pub struct SvxNotifier {
    feed: FeedClient,
    listeners: Vec<Box<dyn Listener>>,
    history: ActivityHistory,
    config: NotifierConfig,
}

impl SvxNotifier {
    pub fn new(feed: FeedClient, config: NotifierConfig) -> Self {
        Self {
            feed,
            listeners: Vec::new(),
            history: ActivityHistory::new(),
            config,
        }
    }

    /// Register a listener. Listeners are called in registration order but
    /// run concurrently.
    pub fn add_listener<L: Listener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn history(&self) -> &ActivityHistory {
        &self.history
    }

    /// Run one fetch-parse-dispatch cycle.
    ///
    /// A body that is not JSON or has no `nodes` mapping is logged and ends
    /// the cycle with an empty report.
    ///
    /// # Errors
    ///
    /// Network failures and listener failures are returned. A listener
    /// failure stops the cycle; nodes after the failing one are not looked at.
    pub async fn poll(&mut self) -> Result<PollReport, NotifierError> {
        debug!(target: "svx", "Polling");

        let start = Instant::now();
        let body = self.feed.fetch().await?;
        debug!(target: "svx", "Request took {:?}", start.elapsed());

        let document: Value = match serde_json::from_str(&body) {
            Ok(document) => document,
            Err(e) => {
                warn!(target: "svx", "Feed did not return JSON: {e}");
                return Ok(PollReport::default());
            }
        };

        self.process(&document).await
    }

    /// Handle an already decoded status document.
    pub async fn process(&mut self, document: &Value) -> Result<PollReport, NotifierError> {
        if document.is_null() {
            warn!(target: "svx", "No JSON received!");
            return Ok(PollReport::default());
        }
        let Some(nodes) = document.get("nodes") else {
            warn!(target: "svx", "No nodes in data");
            return Ok(PollReport::default());
        };
        let Some(nodes) = nodes.as_object() else {
            warn!(target: "svx", "nodes is not a mapping");
            return Ok(PollReport::default());
        };

        let mut report = PollReport {
            nodes: nodes.len(),
            ..PollReport::default()
        };

        for (name, raw) in nodes {
            if is_hidden(raw) {
                report.hidden += 1;
                continue;
            }

            match Node::from_json(name, raw) {
                Ok(node) if node.is_talking => {
                    report.active += 1;
                    if self.node_active(&node).await? {
                        report.notified += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(target: "svx", "Error loading {name}: {e}");
                    error!(target: "svx", "Data: {raw}");
                    report.malformed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Handle a node seen talking right now.
    pub async fn node_active(&mut self, node: &Node) -> Result<bool, ListenerError> {
        self.node_active_at(node, Utc::now()).await
    }

    /// Handle a node seen talking at `now`.
    ///
    /// Listeners are notified when the node has no history or its last
    /// activity is older than the threshold. The timestamp is recorded either
    /// way, unless a listener fails. Returns whether listeners were notified.
    pub async fn node_active_at(
        &mut self,
        node: &Node,
        now: DateTime<Utc>,
    ) -> Result<bool, ListenerError> {
        debug!(target: "svx", "Node active: {node:?}");

        let elapsed = self
            .history
            .last_active(&node.name)
            .map(|last| (now - last).to_std().unwrap_or_default());

        let notify = elapsed.map_or(true, |elapsed| elapsed > self.config.threshold());
        if notify {
            info!(target: "svx", "Node activated: {node}");
            self.dispatch(node, elapsed).await?;
        }

        self.history.record(&node.name, now);
        Ok(notify)
    }

    /// Call every listener concurrently and wait for all of them.
    ///
    /// Every listener runs to completion; the first failure in registration
    /// order is returned.
    async fn dispatch(&self, node: &Node, elapsed: Option<Duration>) -> Result<(), ListenerError> {
        let limit = self.config.listener_timeout();
        let fan_out = join_all(
            self.listeners
                .iter()
                .map(|listener| listener.on_activation(node, elapsed)),
        );
        let results = tokio::time::timeout(limit, fan_out)
            .await
            .map_err(|_| ListenerError::Timeout(limit))?;

        let mut first_failure = None;
        for (listener, result) in self.listeners.iter().zip(results) {
            if let Err(e) = result {
                warn!(target: "svx", "Listener {} failed for {}: {e}", listener.name(), node.name);
                first_failure.get_or_insert(e);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Sleeps the poll interval after every cycle, however long the cycle
    /// took. Errors are logged and the loop keeps going; consecutive network
    /// failures stretch the sleep up to the configured maximum backoff.
    pub async fn poll_periodically<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            target: "svx",
            "Starting periodic check of {} with {} listeners",
            self.feed.endpoint(),
            self.listener_count()
        );
        tokio::pin!(shutdown);

        let mut failures: u32 = 0;
        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => None,
                result = self.poll() => Some(result),
            };
            let Some(result) = outcome else { break };

            match result {
                Ok(report) => {
                    failures = 0;
                    debug!(target: "svx", ?report, tracked = self.history.len(), "Poll finished");
                }
                Err(e) if e.is_transient() => {
                    failures = failures.saturating_add(1);
                    error!(target: "svx", "Poll failed ({failures} in a row): {e}");
                }
                Err(e) => {
                    failures = 0;
                    error!(target: "svx", "Poll aborted: {e}");
                }
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.backoff(failures)) => {}
            }
        }

        info!(target: "svx", "Stopped periodic check");
    }

    /// Delay before the next cycle after `failures` consecutive network errors.
    fn backoff(&self, failures: u32) -> Duration {
        let base = self.config.poll_interval();
        base.saturating_mul(2u32.saturating_pow(failures))
            .min(self.config.max_backoff())
            .max(base)
    }
}

/// Whether a raw feed record asks to be left out of listings.
pub fn is_hidden(raw: &Value) -> bool {
    raw.get("hidden").is_some_and(is_truthy)
}

/// Loose truthiness used by the feed for flags such as `hidden`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
