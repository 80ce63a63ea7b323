// ABOUTME: Sealed trait to restrict engine trait implementations to this crate.
// ABOUTME: Keeps the ImageOps surface closed while tests use in-crate fakes.

pub trait Sealed {}
