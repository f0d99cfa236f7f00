//! Idle auto-refresh: if nobody touches the keyboard or mouse for a while after startup, the
//! level restarts on its own. The first key press or mouse move disarms it for good.

use std::time::Duration;

use macroquad::color::colors::RED;
use macroquad::math::vec2;
use shoal::{DrawLink, EventKind, GameEvent, Listener, UpdateLink};

use crate::level::{report, restart_level};
use crate::{Ctx, Reef};

pub struct AutoRefresh {
    /// On the game's wall clock, in seconds.
    deadline: f64,
    update: UpdateLink<Reef>,
    draw: DrawLink<Reef>,
    listeners: Vec<Listener<Reef>>,
}

/// Starts the timer. Arming again replaces the previous timer.
pub fn arm(game: &mut Ctx, after: Duration) {
    disarm(game);

    // in front of anything that freezes the level, so the timer also runs under the menu
    let update = game.chains.update.unshift(UpdateLink::new(|game: &mut Ctx, dt, next| {
        let now = game.now();
        let expired = game
            .world
            .refresh
            .as_ref()
            .map_or(false, |r| now >= r.deadline);
        if expired {
            log::info!("idle for too long, restarting the level");
            disarm(game);
            report(restart_level(game));
        }
        next.run(game, dt);
    }));

    // a red dot in the top right corner while armed
    let draw = game.chains.draw.unshift(DrawLink::new(|game: &mut Ctx, g, next| {
        let corner = vec2(g.size().x, 0.0);
        g.fill_circle(corner, 30.0, RED);
        next.run(game, g);
    }));

    let disarming = Listener::new(|game: &mut Ctx, _: &GameEvent| disarm(game));
    let listeners = vec![
        game.events.once(EventKind::KeyDown, disarming.clone()),
        game.events.once(EventKind::MouseMove, disarming),
    ];

    let deadline = game.now() + after.as_secs_f64();
    game.world.refresh = Some(AutoRefresh {
        deadline,
        update,
        draw,
        listeners,
    });
    log::debug!("auto-refresh armed for {:?}", after);
}

/// Stops the timer and takes its links and listeners out. Does nothing when not armed.
pub fn disarm(game: &mut Ctx) {
    let Some(refresh) = game.world.refresh.take() else {
        return;
    };
    game.chains.update.remove(&refresh.update);
    game.chains.draw.remove(&refresh.draw);
    for listener in refresh.listeners.iter() {
        game.events.remove_listener(listener);
    }
    log::debug!("auto-refresh disarmed");
}

pub fn is_armed(game: &Ctx) -> bool {
    game.world.refresh.is_some()
}
