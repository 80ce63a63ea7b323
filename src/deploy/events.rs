// ABOUTME: Stage enumeration and the event sink the orchestrator emits to.
// ABOUTME: Presentation subscribes here; orchestration never prints.

use std::fmt;

use super::error::DeployError;

/// The stages of one deploy run, in order. No transition skips a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Building,
    Pushing,
    Applying,
    AwaitingReady,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Building => "building",
            Stage::Pushing => "pushing",
            Stage::Applying => "applying",
            Stage::AwaitingReady => "awaiting ready",
        };
        write!(f, "{s}")
    }
}

/// Observer for deploy progress. Any caller (CLI, API, log sink) can
/// subscribe without coupling orchestration to a presentation.
pub trait EventSink: Send + Sync {
    fn on_stage_start(&self, _stage: Stage) {}
    fn on_stage_complete(&self, _stage: Stage) {}
    fn on_error(&self, _error: &DeployError) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {}
