//! # Shoal
//!
//! A small runtime for 2D games that are built by composition. Instead of one big `update()`
//! that knows about every kind of entity, a game is made of:
//!
//! - an [entity store][store::EntityStore] that owns every entity and keeps tag-indexed views
//!   over them, changing them only at an explicit flush point;
//! - two [chains][chain::Chain], one for updating and one for drawing, each an ordered list of
//!   middleware-style links that game modes can add to and take out of;
//! - [touch detection][touch] that reports when pairs of entities start and stop being close;
//! - [game states][state::GameState] that wire links and listeners in on `enable` and take them
//!   back out on `disable`, so switching between menu, gameplay and an editor is cheap.
//!
//! [`Game`] ties them together and runs the frame loop.

#![allow(clippy::new_without_default)]
#![allow(clippy::len_without_is_empty)]

pub mod chain;
pub mod error;
pub mod events;
mod game;
pub mod graphics;
pub mod state;
pub mod store;
pub mod touch;

pub use chain::{Chain, Link, Next};
pub use error::GameError;
pub use events::{EventKind, GameEvent, Listener};
pub use game::{
    Chains, Config, DrawLink, Game, RunToken, Timestep, UpdateLink, DEFAULT_VIEWPORT,
};
pub use graphics::Renderer;
pub use state::{shared, GameState, SharedState};
pub use store::{Behavior, Body, Entity, EntityId, EntityStore, IndexList, Tag};

pub use macroquad::input::{KeyCode, MouseButton};
