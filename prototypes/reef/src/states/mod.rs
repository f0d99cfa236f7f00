//! The modes the game moves between. Each state installs its links and listeners in `enable`
//! and removes exactly those in `disable`.

mod editor;
mod gameplay;
mod overlay;

pub use editor::{Editor, EditorState};
pub use gameplay::{spawn_player, GameplayState};
pub use overlay::{Overlay, OverlayState};
