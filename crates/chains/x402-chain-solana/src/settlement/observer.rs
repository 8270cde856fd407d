//! Stage transitions and failure diagnostics of settlement attempts.
//!
//! The engine reports to an injected [`SettlementObserver`] instead of a global logger.
//! With the `telemetry` feature, [`TracingObserver`] forwards everything to `tracing`.

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::settlement::error::ErrorKind;

/// States of one settlement attempt, in order. `Failed` is represented by
/// [`SettlementEvent::Failure`] and can follow any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStage {
    Parsed,
    Verified,
    Built,
    Submitted,
    Settled,
}

impl SettlementStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStage::Parsed => "parsed",
            SettlementStage::Verified => "verified",
            SettlementStage::Built => "built",
            SettlementStage::Submitted => "submitted",
            SettlementStage::Settled => "settled",
        }
    }
}

impl Display for SettlementStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementEvent {
    /// The attempt reached `stage` for the option `option_id`.
    Stage {
        stage: SettlementStage,
        option_id: String,
    },
    /// The attempt failed while trying to reach `stage`.
    Failure {
        stage: SettlementStage,
        kind: ErrorKind,
        message: String,
        /// Program logs reported by the ledger.
        logs: Vec<String>,
    },
}

pub trait SettlementObserver: Send + Sync {
    fn on_event(&self, event: &SettlementEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SettlementObserver for NoopObserver {
    fn on_event(&self, _event: &SettlementEvent) {}
}

impl<T: SettlementObserver + ?Sized> SettlementObserver for Arc<T> {
    fn on_event(&self, event: &SettlementEvent) {
        (**self).on_event(event)
    }
}

/// Emits events as structured `tracing` events.
#[cfg(feature = "telemetry")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

#[cfg(feature = "telemetry")]
impl SettlementObserver for TracingObserver {
    fn on_event(&self, event: &SettlementEvent) {
        match event {
            SettlementEvent::Stage { stage, option_id } => {
                tracing::info!(stage = %stage, option = %option_id, "Settlement stage reached");
            }
            SettlementEvent::Failure {
                stage,
                kind,
                message,
                logs,
            } => {
                tracing::warn!(stage = %stage, kind = %kind, logs = ?logs, "Settlement failed: {message}");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(SettlementStage::Submitted.to_string(), "submitted");
        assert_eq!(
            serde_json::to_string(&SettlementStage::Parsed).unwrap(),
            "\"parsed\""
        );
    }

    #[test]
    fn test_shared_observer_receives_events() {
        let observer = Arc::new(recording::RecordingObserver::default());
        let shared: Arc<recording::RecordingObserver> = observer.clone();
        shared.on_event(&SettlementEvent::Stage {
            stage: SettlementStage::Parsed,
            option_id: "sol".to_string(),
        });
        assert_eq!(observer.stages(), vec![SettlementStage::Parsed]);
    }
}
