// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::{DeployError, EventSink, Stage};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => self.json_line("success", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a remediation hint for a failure (stderr, suppressed in JSON
    /// mode where the error event already carries the kind).
    pub fn hint(&self, message: &str) {
        if self.mode != OutputMode::Json {
            eprintln!("  hint: {message}");
        }
    }

    fn json_line(&self, kind: &str, message: &str) {
        let event = JsonEvent {
            event: kind,
            message,
            duration_secs: if self.start_time.is_some() {
                Some(self.elapsed_secs())
            } else {
                None
            },
        };
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }
}

// The orchestrator never prints; the CLI subscribes its Output to the
// event stream instead.
impl EventSink for Output {
    fn on_stage_start(&self, stage: Stage) {
        let message = match stage {
            Stage::Building => "  → Building image...",
            Stage::Pushing => "  → Pushing to registry...",
            Stage::Applying => "  → Applying cluster resources...",
            Stage::AwaitingReady => "  → Waiting for rollout...",
        };
        self.progress(message);
    }

    fn on_stage_complete(&self, stage: Stage) {
        if self.mode == OutputMode::Json {
            self.json_line("stage_complete", &stage.to_string());
        }
    }

    // In human modes the failure is printed once by the top-level handler;
    // only JSON mode emits an inline error event.
    fn on_error(&self, error: &DeployError) {
        if self.mode == OutputMode::Json {
            self.json_line("error", &error.to_string());
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
