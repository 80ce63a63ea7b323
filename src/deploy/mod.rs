// ABOUTME: Deploy orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Run struct, orchestrator, and events.

mod error;
mod events;
mod orchestrator;
mod result;
mod run;
mod state;
mod transitions;

pub use error::{DeployError, DeployErrorKind};
pub use events::{EventSink, NullSink, Stage};
pub use orchestrator::Orchestrator;
pub use result::{DeployStatus, DeploymentResult, ServiceUrl};
pub use run::Run;
pub use state::{ImageBuilt, ImagePushed, ResourcesApplied, Validated};
