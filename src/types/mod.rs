// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: App names, image references, and cluster resource keys.

mod app_name;
mod image_ref;
mod resource_key;

pub use app_name::{AppName, AppNameError};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use resource_key::{ResourceKey, ResourceKind};
