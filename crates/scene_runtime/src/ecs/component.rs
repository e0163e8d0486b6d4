//! Component trait

/// Marker trait for components
///
/// Components are plain data. `Clone` lets a whole scene be duplicated when
/// entering Play.
pub trait Component: 'static + Clone + Send + Sync {}
