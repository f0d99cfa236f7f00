use macroquad::color::{colors::WHITE, Color};
use macroquad::math::{vec2, Rect};
use shoal::{DrawLink, EventKind, GameEvent, GameState, Listener, UpdateLink};

use crate::level::{report, restart_level};
use crate::{Ctx, Reef};

const SHADE: Color = Color::new(0.0, 0.0, 0.0, 0.6);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Overlay {
    Menu,
    Win,
    Lose,
}

impl Overlay {
    pub fn message(&self) -> &'static str {
        match self {
            Overlay::Menu => "reef: press any key to dive",
            Overlay::Win => "treasure found! press any key",
            Overlay::Lose => "the reef got you. press any key",
        }
    }
}

/// A message over a frozen level. Any key restarts the level and goes back to playing.
pub struct OverlayState {
    overlay: Overlay,
    installed: Option<(UpdateLink<Reef>, DrawLink<Reef>, Listener<Reef>)>,
}

impl OverlayState {
    pub fn new(overlay: Overlay) -> Self {
        Self {
            overlay,
            installed: None,
        }
    }
}

impl GameState<Reef> for OverlayState {
    fn enable(&mut self, game: &mut Ctx) {
        // input polling sits in front of the objects and keeps running
        let freeze = UpdateLink::new(|_game: &mut Ctx, dt, _next| *dt = 0.0);
        let freeze = match game
            .chains
            .update
            .insert_before(freeze.clone(), &game.chains.update_objects)
        {
            Ok(link) => link,
            Err(_) => game.chains.update.unshift(freeze),
        };

        let message = self.overlay.message();
        let draw = game.chains.draw.unshift(DrawLink::new(move |game: &mut Ctx, g, next| {
            next.run(game, g);
            let size = g.size();
            g.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), SHADE);
            g.fill_text(message, vec2(size.x * 0.5 - 180.0, size.y * 0.5 - 16.0), 32.0, WHITE);
        }));

        let keys = game.events.on(
            EventKind::KeyDown,
            Listener::new(|game: &mut Ctx, _: &GameEvent| {
                report(restart_level(game));
                crate::enter(game, |s| &s.gameplay);
            }),
        );

        self.installed = Some((freeze, draw, keys));
    }

    fn disable(&mut self, game: &mut Ctx) {
        if let Some((freeze, draw, keys)) = self.installed.take() {
            game.chains.update.remove(&freeze);
            game.chains.draw.remove(&draw);
            game.events.remove_listener(&keys);
        }
    }

    fn name(&self) -> &'static str {
        match self.overlay {
            Overlay::Menu => "menu",
            Overlay::Win => "win",
            Overlay::Lose => "lose",
        }
    }
}
