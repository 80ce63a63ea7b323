// ABOUTME: Sealed trait to restrict cluster trait implementations to this crate.
// ABOUTME: Keeps the ClusterOps surface closed while tests use in-crate fakes.

pub trait Sealed {}
