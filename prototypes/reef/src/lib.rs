//! # Reef
//!
//! A small diving game built on `shoal`: the diver sinks through the reef, follows the mouse
//! sideways, has to dodge the fish, and wins by reaching the treasure. Pressing `e` during play
//! opens a level editor on top of the running level.

#![allow(clippy::new_without_default)]

use std::collections::HashSet;
use std::time::Duration;

use macroquad::math::Vec2;
use shoal::{Config, EntityId, Game, GameError, KeyCode, SharedState, Tag};

pub mod autorefresh;
pub mod camera;
pub mod entities;
pub mod input;
pub mod level;
pub mod states;

pub use camera::Camera;
pub use entities::Item;
pub use level::Level;

pub type Ctx = Game<Reef>;

/// Screen width, in pixels, that a camera at zoom 1 maps one world unit per pixel onto.
pub const WORLD_WIDTH: f32 = 1024.0;
/// 32 world units across the screen.
pub const DEFAULT_ZOOM: f32 = 1.0 / 32.0;
/// Idle time before the current level is restarted on its own.
pub const AUTO_REFRESH: Duration = Duration::from_secs(3);

pub const PLAYER_RADIUS: f32 = 0.5;
/// World units per second.
pub const SINK_RATE: f32 = 2.0;
pub const FISH_RADIUS: f32 = 0.5;
pub const FISH_SPEED: f32 = 3.0;
pub const TREASURE_RADIUS: f32 = 0.75;
pub const EDITOR_PAN_SPEED: f32 = 10.0;
/// How far below the deepest treasure the diver may sink before the dive is lost.
pub const MISS_DEPTH: f32 = 6.0;

/// Marks entities the diver must not touch.
pub const HAZARD: Tag = Tag::new("hazard");

pub fn window_conf() -> macroquad::window::Conf {
    macroquad::window::Conf {
        window_title: "reef".to_owned(),
        window_width: 1024,
        window_height: 768,
        fullscreen: false,
        ..Default::default()
    }
}

/// Every game state the game moves between. They are created once and reused.
pub struct States {
    pub menu: SharedState<Reef>,
    pub gameplay: SharedState<Reef>,
    pub editor: SharedState<Reef>,
    pub win: SharedState<Reef>,
    pub lose: SharedState<Reef>,
}

impl States {
    fn new() -> Self {
        use states::{EditorState, GameplayState, Overlay, OverlayState};
        Self {
            menu: shoal::shared(OverlayState::new(Overlay::Menu)),
            gameplay: shoal::shared(GameplayState::new()),
            editor: shoal::shared(EditorState::new()),
            win: shoal::shared(OverlayState::new(Overlay::Win)),
            lose: shoal::shared(OverlayState::new(Overlay::Lose)),
        }
    }
}

pub struct Reef {
    pub camera: Camera,
    pub camera_links: camera::CameraLinks,
    /// Mouse position in screen pixels.
    pub mouse: Vec2,
    pub keys: HashSet<KeyCode>,
    pub level: Option<Level>,
    pub player: Option<EntityId>,
    pub states: States,
    /// What the editor can place.
    pub items: Vec<Item>,
    pub refresh: Option<autorefresh::AutoRefresh>,
}

impl Reef {
    pub fn new() -> Self {
        Self {
            camera: Camera::new(),
            camera_links: camera::CameraLinks::new(),
            mouse: Vec2::ZERO,
            keys: HashSet::new(),
            level: None,
            player: None,
            states: States::new(),
            items: entities::ITEMS.to_vec(),
            refresh: None,
        }
    }
}

/// Creates the game with every index list declared and the camera installed. No level is
/// loaded and no state is active yet.
pub fn new_game(config: Config) -> Result<Ctx, GameError> {
    let mut game = Game::new(Reef::new(), config);
    for tag in [Tag::START, Tag::END, Tag::EXPORT, Tag::EDITOR_VISIBLE] {
        game.objects.create_index_list(tag);
    }
    camera::install(&mut game)?;
    Ok(game)
}

/// Moves to one of the registered states, logging instead of failing if it is already active.
pub fn enter(game: &mut Ctx, pick: impl Fn(&States) -> &SharedState<Reef>) {
    let next = pick(&game.world.states).clone();
    if game.is_active(&next) {
        return;
    }
    if let Err(err) = game.change_state(next) {
        log::warn!("state change refused: {}", err);
    }
}
