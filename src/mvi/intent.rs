//! Base trait for intents.

/// Marker trait for intent objects.
///
/// Intents carry fully-resolved inputs: a new record already has its id and
/// timestamp when it reaches the reducer.
pub trait Intent: Send + 'static {}
