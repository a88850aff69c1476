//! Base trait for reducer state.

/// Marker trait for state objects.
///
/// States are cloned to observers and compared to skip redundant
/// publications, and `Default` is the pre-load state.
pub trait State: Clone + PartialEq + Default + Send + Sync + 'static {}
