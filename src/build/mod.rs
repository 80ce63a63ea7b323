// ABOUTME: Image building: Containerfile synthesis, context assembly, engine call.
// ABOUTME: Turns a source directory plus dependency list into a tagged image.

mod builder;
mod containerfile;
mod context;

pub use builder::ImageBuilder;
pub use containerfile::{CONTAINERFILE_NAME, requirements_file, synthesize};
pub use context::build_context;

use crate::types::ImageRef;

/// The output of a successful build: the engine's content-addressed image id
/// plus the human tag. Owned by the deploy run that produced it and discarded
/// if the run aborts before push.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub id: String,
    pub reference: ImageRef,
}
