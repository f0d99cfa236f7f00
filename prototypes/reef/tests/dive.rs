use macroquad::math::{vec2, Vec2};
use reef::entities::{self, Boundaries, Fish, Patrol, Sprite};
use reef::level::change_level;
use reef::{Ctx, Level, Reef};
use shoal::graphics::Recorder;
use shoal::{Config, Entity, GameError, GameEvent, KeyCode, RunToken, UpdateLink};

type Placed = Result<Entity<Reef>, GameError>;

/// The diver starts at the origin with something parked right below it.
fn straight_down(below: fn(Vec2) -> Placed) -> Level {
    Level::new("Straight down", move || {
        Ok(vec![entities::start(Vec2::ZERO), below(vec2(0.0, 3.0))?])
    })
}

fn still_fish(at: Vec2) -> Placed {
    let bounds = Boundaries::new(0.0, 0.0, 0.0, 0.0)?;
    Ok(Fish::new(Sprite::Clown, Patrol::new(at, bounds, Vec2::ZERO)).into_entity(at))
}

fn chest(at: Vec2) -> Placed {
    Ok(entities::treasure(at))
}

fn dive(level: Level) -> (Ctx, Recorder, RunToken) {
    let mut game = reef::new_game(Config::default()).unwrap();
    change_level(&mut game, level).unwrap();
    reef::enter(&mut game, |s| &s.menu);
    // keep the diver right above what it is falling towards
    game.world.mouse = game.viewport() * 0.5;

    game.emit(GameEvent::KeyDown(KeyCode::Space));
    assert_eq!(game.state_name(), Some("gameplay"));

    let token = game.start().unwrap();
    (game, Recorder::default(), token)
}

#[test]
fn test_sinking_into_a_fish_loses_and_any_key_retries() {
    let (mut game, mut g, token) = dive(straight_down(still_fish));
    for _ in 0..90 {
        game.frame(token, &mut g);
    }
    assert_eq!(game.state_name(), Some("lose"));

    // frozen while the message is up
    let player = game.world.player.unwrap();
    let y = game.objects.body(player).unwrap().position.y;
    game.frame(token, &mut g);
    assert_eq!(game.objects.body(player).unwrap().position.y, y);

    game.emit(GameEvent::KeyDown(KeyCode::Enter));
    assert_eq!(game.state_name(), Some("gameplay"));
    let again = game.world.player.unwrap();
    assert_ne!(again, player);
    assert_eq!(game.objects.body(again).unwrap().position, Vec2::ZERO);
}

#[test]
fn test_sinking_onto_the_treasure_wins() {
    let (mut game, mut g, token) = dive(straight_down(chest));
    for _ in 0..90 {
        game.frame(token, &mut g);
    }
    assert_eq!(game.state_name(), Some("win"));
    assert!(g.texts().contains(&"treasure found! press any key"));
}

#[test]
fn test_editor_round_trip_keeps_the_dive_going() {
    let (mut game, mut g, token) = dive(straight_down(chest));
    for _ in 0..10 {
        game.frame(token, &mut g);
    }
    let player = game.world.player.unwrap();

    game.emit(GameEvent::KeyDown(KeyCode::E));
    assert_eq!(game.state_name(), Some("editor"));
    let y = game.objects.body(player).unwrap().position.y;
    for _ in 0..10 {
        game.frame(token, &mut g);
    }
    assert_eq!(game.objects.body(player).unwrap().position.y, y);

    game.emit(GameEvent::KeyDown(KeyCode::E));
    assert_eq!(game.state_name(), Some("gameplay"));
    assert_eq!(game.world.player, Some(player));
    game.frame(token, &mut g);
    assert!(game.objects.body(player).unwrap().position.y > y);
}

#[test]
fn test_opening_the_editor_on_the_touch_frame_stops_the_dive_at_once() {
    let (mut game, mut g, token) = dive(straight_down(still_fish));
    let player = game.world.player.unwrap();
    // one more step and the diver would be inside the fish
    game.objects.body_mut(player).unwrap().position.y = 1.99;

    let press = game.chains.update.unshift(UpdateLink::new(|game: &mut Ctx, dt, next| {
        game.emit(GameEvent::KeyDown(KeyCode::E));
        next.run(game, dt);
    }));
    game.frame(token, &mut g);
    game.chains.update.remove(&press);

    assert_eq!(game.state_name(), Some("editor"));
    assert_eq!(game.objects.body(player).unwrap().position.y, 1.99);
    assert!(game.objects.body(player).unwrap().touching().is_empty());
}
