// ABOUTME: Build engine abstraction over the Docker-compatible image API.
// ABOUTME: Exposes the sealed ImageOps capability trait and the bollard impl.

mod bollard;
mod error;
pub(crate) mod sealed;
mod traits;

pub use self::bollard::BollardEngine;
pub use error::{BuildError, PushError};
pub use traits::{BuildRequest, ImageOps, RegistryAuth};
