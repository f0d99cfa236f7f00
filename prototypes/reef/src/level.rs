use std::fmt;
use std::rc::Rc;

use macroquad::math::{vec2, Vec2};
use shoal::{Entity, GameError, GameEvent};

use crate::entities::{self, Boundaries, Fish, Patrol, Sprite};
use crate::{Ctx, Reef, FISH_SPEED};

type Build = dyn Fn() -> Result<Vec<Entity<Reef>>, GameError>;

/// A level is a recipe: loading it builds a fresh set of entities every time.
#[derive(Clone)]
pub struct Level {
    pub name: String,
    build: Rc<Build>,
    next: Option<Rc<dyn Fn() -> Level>>,
}

impl Level {
    pub fn new(
        name: impl Into<String>,
        build: impl Fn() -> Result<Vec<Entity<Reef>>, GameError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            build: Rc::new(build),
            next: None,
        }
    }

    pub fn with_next(mut self, next: impl Fn() -> Level + 'static) -> Self {
        self.next = Some(Rc::new(next));
        self
    }

    pub fn objects(&self) -> Result<Vec<Entity<Reef>>, GameError> {
        (self.build)()
    }

    pub fn next(&self) -> Option<Level> {
        self.next.as_ref().map(|next| next())
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Level")
            .field("name", &self.name)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// Replaces everything in the store with the level's objects and announces the change.
/// If the level fails to build, the current one stays as it is.
pub fn change_level(game: &mut Ctx, level: Level) -> Result<(), GameError> {
    let objects = level.objects()?;
    log::info!("loading level `{}` ({} objects)", level.name, objects.len());

    game.objects.clear();
    game.objects.handle_pending();
    for object in objects {
        game.objects.add(object);
    }
    game.objects.handle_pending();

    game.world.player = None;
    game.world.camera.follow = None;
    game.world.level = Some(level);
    game.emit(GameEvent::LevelChanged);
    Ok(())
}

pub fn restart_level(game: &mut Ctx) -> Result<(), GameError> {
    match game.world.level.clone() {
        Some(level) => change_level(game, level),
        None => {
            log::warn!("no level to restart");
            Ok(())
        }
    }
}

/// Loads the level after the current one. Staying put when there is none.
pub fn next_level(game: &mut Ctx) -> Result<(), GameError> {
    match game.world.level.as_ref().and_then(Level::next) {
        Some(next) => change_level(game, next),
        None => {
            log::info!("this is the last level");
            Ok(())
        }
    }
}

/// Runs a level operation from an event handler, where there is nobody to hand errors to.
pub fn report(result: Result<(), GameError>) {
    if let Err(err) = result {
        log::error!("level change failed: {}", err);
    }
}

fn patrolling(
    sprite: Sprite,
    at: Vec2,
    (left, right, top, bottom): (f32, f32, f32, f32),
    velocity: Vec2,
) -> Result<Entity<Reef>, GameError> {
    let bounds = Boundaries::new(left, right, top, bottom)?;
    Ok(Fish::new(sprite, Patrol::new(at, bounds, velocity)).into_entity(at))
}

pub fn shallows() -> Level {
    Level::new("Shallows", || {
        Ok(vec![
            entities::start(Vec2::ZERO),
            entities::clown_fish(vec2(0.0, 8.0)),
            entities::treasure(vec2(3.0, 16.0)),
        ])
    })
    .with_next(trench)
}

pub fn trench() -> Level {
    Level::new("Trench", || {
        Ok(vec![
            entities::start(Vec2::ZERO),
            patrolling(
                Sprite::Clown,
                vec2(-4.0, 6.0),
                (4.0, 8.0, 0.0, 0.0),
                vec2(FISH_SPEED, 0.0),
            )?,
            entities::football_fish(vec2(5.0, 12.0)),
            patrolling(
                Sprite::Clown,
                vec2(0.0, 18.0),
                (3.0, 3.0, 2.0, 2.0),
                vec2(FISH_SPEED, FISH_SPEED * 0.5),
            )?,
            entities::drifting_fish(vec2(-10.0, 22.0), vec2(FISH_SPEED * 0.25, 0.0)),
            entities::treasure(vec2(-5.0, 26.0)),
        ])
    })
}

/// A tiny level to try things out in.
pub fn test_level() -> Level {
    Level::new("Test", || {
        Ok(vec![
            entities::start(Vec2::ZERO),
            entities::clown_fish(vec2(0.0, 4.0)),
        ])
    })
    .with_next(test_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal::{Config, EventKind, Listener, Tag};

    fn game() -> Ctx {
        crate::new_game(Config::default()).unwrap()
    }

    #[test]
    fn test_change_level_replaces_objects_and_announces() {
        let mut game = game();
        game.events.on(
            EventKind::LevelChanged,
            Listener::new(|game: &mut Ctx, _: &GameEvent| {
                game.world.mouse.x += 1.0;
            }),
        );

        change_level(&mut game, shallows()).unwrap();
        assert_eq!(game.objects.len(), 3);
        assert_eq!(game.objects.list(Tag::START).len(), 1);
        assert_eq!(game.world.mouse.x, 1.0);

        change_level(&mut game, test_level()).unwrap();
        assert_eq!(game.objects.len(), 2);
        assert!(game.objects.list(Tag::END).is_empty());
        assert_eq!(game.world.level.as_ref().unwrap().name, "Test");
        assert_eq!(game.world.mouse.x, 2.0);
    }

    #[test]
    fn test_restart_builds_fresh_objects() {
        let mut game = game();
        change_level(&mut game, shallows()).unwrap();
        let before = game.objects.ids();

        restart_level(&mut game).unwrap();
        let after = game.objects.ids();
        assert_eq!(before.len(), after.len());
        assert!(before.iter().all(|id| !game.objects.contains(*id)));
    }

    #[test]
    fn test_next_level_walks_the_list() {
        let mut game = game();
        change_level(&mut game, shallows()).unwrap();
        next_level(&mut game).unwrap();
        assert_eq!(game.world.level.as_ref().unwrap().name, "Trench");

        // the last level stays loaded
        let ids = game.objects.ids();
        next_level(&mut game).unwrap();
        assert_eq!(game.objects.ids(), ids);
    }

    #[test]
    fn test_broken_level_keeps_the_current_one() {
        let mut game = game();
        change_level(&mut game, shallows()).unwrap();
        let broken = Level::new("Broken", || {
            Ok(vec![patrolling(
                Sprite::Clown,
                Vec2::ZERO,
                (1.0, -1.0, 0.0, 0.0),
                Vec2::ZERO,
            )?])
        });

        assert!(matches!(
            change_level(&mut game, broken),
            Err(GameError::InvalidBounds { .. })
        ));
        assert_eq!(game.world.level.as_ref().unwrap().name, "Shallows");
        assert_eq!(game.objects.len(), 3);
    }

    #[test]
    fn test_every_level_builds() {
        for level in [shallows(), trench(), test_level()] {
            let objects = level.objects().unwrap();
            let starts = objects
                .iter()
                .filter(|e| e.body.has_tag(Tag::START))
                .count();
            assert_eq!(starts, 1, "{} needs exactly one start", level.name);
        }
    }
}
