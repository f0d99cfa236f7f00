use macroquad::color::colors::WHITE;
use macroquad::math::vec2;
use shoal::{
    DrawLink, EventKind, GameEvent, GameState, KeyCode, Listener, Tag, UpdateLink,
};

use crate::level::{change_level, next_level, report, restart_level, test_level};
use crate::{Ctx, Reef, MISS_DEPTH};

/// Playing a level: the diver sinks, the camera follows, and keys switch levels or open the
/// editor.
pub struct GameplayState {
    installed: Option<Installed>,
}

struct Installed {
    update: UpdateLink<Reef>,
    hud: DrawLink<Reef>,
    keys: Listener<Reef>,
    level_changed: Listener<Reef>,
}

impl GameplayState {
    pub fn new() -> Self {
        Self { installed: None }
    }
}

/// Lets the first start marker of the level spawn the diver.
pub fn spawn_player(game: &mut Ctx) {
    match game.objects.list(Tag::START).first() {
        Some(start) => {
            game.start_entity(start);
            // the diver is queued; make it visible before anything looks for it
            game.objects.handle_pending();
        }
        None => log::warn!("level has no start marker, nowhere to put the diver"),
    }
}

fn player_alive(game: &Ctx) -> bool {
    game.world
        .player
        .map_or(false, |id| game.objects.is_alive(id))
}

impl GameState<Reef> for GameplayState {
    fn enable(&mut self, game: &mut Ctx) {
        game.world.camera.reset();
        if player_alive(game) {
            game.world.camera.follow = game.world.player;
        } else {
            spawn_player(game);
        }

        let hud = game.chains.draw.unshift(DrawLink::new(|game: &mut Ctx, g, next| {
            next.run(game, g);
            let name = game.world.level.as_ref().map_or("", |l| l.name.as_str());
            let depth = game
                .world
                .player
                .and_then(|id| game.objects.body(id))
                .map_or(0.0, |b| b.position.y);
            g.fill_text(name, vec2(12.0, 8.0), 24.0, WHITE);
            g.fill_text(&format!("depth {:.1}", depth), vec2(12.0, 36.0), 20.0, WHITE);
        }));

        let update = game.chains.update.push(UpdateLink::new(|game: &mut Ctx, dt, next| {
            next.run(game, dt);
            // sinking past every treasure means the dive is lost
            let deepest = game
                .objects
                .list(Tag::END)
                .iter()
                .filter_map(|id| game.objects.body(id))
                .map(|b| b.position.y)
                .fold(None, |deepest: Option<f32>, y| {
                    Some(deepest.map_or(y, |d| d.max(y)))
                });
            let depth = game.world.player.and_then(|id| game.objects.body(id));
            if let (Some(deepest), Some(player)) = (deepest, depth) {
                if player.position.y > deepest + MISS_DEPTH {
                    log::info!("the diver sank past the treasure");
                    crate::enter(game, |s| &s.lose);
                }
            }
        }));

        let keys = game.events.on(
            EventKind::KeyDown,
            Listener::new(|game: &mut Ctx, event: &GameEvent| match event {
                GameEvent::KeyDown(KeyCode::R) => report(restart_level(game)),
                GameEvent::KeyDown(KeyCode::N) => report(next_level(game)),
                GameEvent::KeyDown(KeyCode::M) => report(change_level(game, test_level())),
                GameEvent::KeyDown(KeyCode::E) => crate::enter(game, |s| &s.editor),
                _ => {}
            }),
        );

        let level_changed = game.events.on(
            EventKind::LevelChanged,
            Listener::new(|game: &mut Ctx, _: &GameEvent| spawn_player(game)),
        );

        self.installed = Some(Installed {
            update,
            hud,
            keys,
            level_changed,
        });
    }

    fn disable(&mut self, game: &mut Ctx) {
        if let Some(installed) = self.installed.take() {
            game.chains.update.remove(&installed.update);
            game.chains.draw.remove(&installed.hud);
            game.events.remove_listener(&installed.keys);
            game.events.remove_listener(&installed.level_changed);
        }
    }

    fn name(&self) -> &'static str {
        "gameplay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::shallows;
    use shoal::graphics::Recorder;
    use shoal::Config;

    fn playing() -> (Ctx, Recorder) {
        let mut game = crate::new_game(Config::default()).unwrap();
        change_level(&mut game, shallows()).unwrap();
        crate::enter(&mut game, |s| &s.gameplay);
        (game, Recorder::default())
    }

    #[test]
    fn test_entering_gameplay_spawns_the_diver_once() {
        let (mut game, _) = playing();
        let player = game.world.player.expect("diver spawned");
        assert!(game.objects.is_alive(player));
        assert_eq!(game.world.camera.follow, Some(player));

        // a second start call is ignored by the marker
        spawn_player(&mut game);
        assert_eq!(game.world.player, Some(player));
        assert_eq!(game.objects.list(Tag::UPDATABLE).len(), 2);
    }

    #[test]
    fn test_restart_key_respawns() {
        let (mut game, _) = playing();
        let first = game.world.player.unwrap();

        game.emit(GameEvent::KeyDown(KeyCode::R));
        let second = game.world.player.unwrap();
        assert_ne!(first, second);
        assert!(!game.objects.contains(first));
        assert!(game.objects.is_alive(second));
    }

    #[test]
    fn test_level_keys() {
        let (mut game, _) = playing();
        game.emit(GameEvent::KeyDown(KeyCode::N));
        assert_eq!(game.world.level.as_ref().unwrap().name, "Trench");
        game.emit(GameEvent::KeyDown(KeyCode::M));
        assert_eq!(game.world.level.as_ref().unwrap().name, "Test");
        assert!(game.world.player.is_some());
    }

    #[test]
    fn test_camera_follows_the_sinking_diver() {
        let (mut game, mut g) = playing();
        let token = game.start().unwrap();
        for _ in 0..30 {
            game.frame(token, &mut g);
        }
        let player = game.world.player.unwrap();
        let y = game.objects.body(player).unwrap().position.y;
        assert!(y > 0.9 && y < 1.1);
        assert_eq!(game.world.camera.position.y, y);
        assert!(g.texts().contains(&"Shallows"));
    }

    #[test]
    fn test_disable_leaves_no_listeners() {
        let (mut game, _) = playing();
        let gameplay = game.world.states.gameplay.clone();
        let update = game.chains.update.len();
        assert!(game.is_active(&gameplay));

        gameplay.borrow_mut().disable(&mut game);
        assert!(game.events.is_empty());
        assert_eq!(game.chains.update.len(), update - 1);
    }
}
