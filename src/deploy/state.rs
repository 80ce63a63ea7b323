// ABOUTME: Deploy run state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce the stage order at compile time.

/// Spec validated, no side effect yet.
/// Available actions: `build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Image built and tagged in the local store.
/// Available actions: `push()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBuilt;

/// Image reference resolved for the cluster (pushed, or local-only).
/// Available actions: `apply()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePushed;

/// Resources applied to the cluster.
/// Available actions: `await_ready()`, `resolve_url()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourcesApplied;
