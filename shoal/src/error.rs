//! Errors surfaced by the runtime.
//!
//! Stale references (an entity that is already gone, a link or listener that was never added)
//! are not errors at all: those operations are silent no-ops. What ends up here are content
//! bugs and lifecycle violations, which should be loud.

use thiserror::Error;

use crate::store::Tag;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    #[error("game loop is already running")]
    AlreadyRunning,

    #[error("game state `{0}` is already active")]
    StateAlreadyActive(&'static str),

    #[error("anchor link is not part of this chain")]
    AnchorNotFound,

    #[error("no index list was declared for tag `{0}`")]
    UnknownTag(Tag),

    #[error("invalid bounds: left {left} / right {right} / top {top} / bottom {bottom} must all be finite and non-negative")]
    InvalidBounds {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}
