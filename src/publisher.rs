//! Scheduled snapshot export.
//!
//! The publisher owns a [`Serializer`] and drives it from a tokio interval,
//! broadcasting every non-empty snapshot to subscribers (a visualizer bridge,
//! a logger). Acquiring the hardware state never triggers a flush by itself.

use crate::config::EmulatorConfig;
use crate::error::HardwareError;
use crate::manager::{AcquireState, StateManager};
use crate::serializer::Serializer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Shallow,
    Deep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub sequence: u64,
    pub kind: SnapshotKind,
    pub text: String,
}

pub struct SnapshotPublisher<S: AcquireState = StateManager> {
    serializer: Serializer<S>,
    period: Duration,
    deep_every: u64,
    ticks: u64,
    sender: broadcast::Sender<Snapshot>,
}

impl<S: AcquireState> SnapshotPublisher<S> {
    pub fn new(manager: Arc<S>, config: &EmulatorConfig) -> Self {
        let (sender, _) = broadcast::channel(config.snapshot_channel_capacity.max(1));
        Self {
            serializer: Serializer::new(manager),
            period: config.flush_period(),
            deep_every: config.deep_every.max(1),
            ticks: 0,
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<Snapshot> {
        self.sender.clone()
    }

    pub fn serializer(&self) -> &Serializer<S> {
        &self.serializer
    }

    /// Runs one export. The first and every `deep_every`-th one are deep.
    /// Returns the snapshot if anything was exported.
    pub fn publish_once(&mut self) -> Result<Option<Snapshot>, HardwareError> {
        let sequence = self.ticks;
        self.ticks += 1;

        let kind = if sequence % self.deep_every == 0 {
            SnapshotKind::Deep
        } else {
            SnapshotKind::Shallow
        };
        let text = match kind {
            SnapshotKind::Deep => self.serializer.serialize_deep()?,
            SnapshotKind::Shallow => self.serializer.serialize_shallow()?,
        };
        if text.is_empty() {
            return Ok(None);
        }

        let snapshot = Snapshot { sequence, kind, text };
        if self.sender.send(snapshot.clone()).is_err() {
            debug!(sequence, "no snapshot subscribers");
        }
        Ok(Some(snapshot))
    }

    /// Publishes on every period until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F) -> Result<u64, HardwareError>
    where
        F: Future<Output = ()>,
    {
        let period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX);
        info!(period_ms, deep_every = self.deep_every, "snapshot publisher started");
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut published = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if self.publish_once()?.is_some() {
                        published += 1;
                    }
                }
            }
        }

        info!(published, "snapshot publisher stopped");
        Ok(published)
    }
}
