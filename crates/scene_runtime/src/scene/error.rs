use crate::ecs::EcsError;
use crate::foundation::math::DegenerateTransform;

use super::SceneState;

/// Errors returned by [`Scene`](super::Scene) operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Registry failure
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// A matrix could not be split into translation, rotation and scale
    #[error("degenerate transform: {0}")]
    DegenerateTransform(#[from] DegenerateTransform),

    /// The requested transition is not valid from the current state
    #[error("cannot {action} while in {from} state")]
    InvalidStateTransition {
        /// State the scene was in
        from: SceneState,
        /// Attempted operation
        action: &'static str,
    },
}
