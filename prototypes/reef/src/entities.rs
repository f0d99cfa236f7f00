//! The things that live on the reef, and the movement strategies fish swim with.

use macroquad::color::{colors::*, Color};
use macroquad::math::{vec2, Rect, Vec2};
use shoal::{Behavior, Body, Entity, EntityId, GameError, Renderer, Tag};

use crate::{
    Ctx, Reef, FISH_RADIUS, FISH_SPEED, HAZARD, PLAYER_RADIUS, SINK_RATE, TREASURE_RADIUS,
};

/// Something the level editor can place: a name for listings and a constructor.
#[derive(Clone, Copy)]
pub struct Item {
    pub name: &'static str,
    pub make: fn(Vec2) -> Entity<Reef>,
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

pub const ITEMS: [Item; 4] = [
    Item {
        name: "Start",
        make: start,
    },
    Item {
        name: "ClownFish",
        make: clown_fish,
    },
    Item {
        name: "FootballFish",
        make: football_fish,
    },
    Item {
        name: "Treasure",
        make: treasure,
    },
];

// start

/// Where the diver enters the level. Only drawn by the editor.
pub struct Start {
    spawned: bool,
}

pub fn start(at: Vec2) -> Entity<Reef> {
    Entity::new(at)
        .with_tags(&[Tag::START, Tag::EXPORT, Tag::EDITOR_VISIBLE])
        .with_behavior(Start { spawned: false })
}

impl Behavior<Reef> for Start {
    fn kind(&self) -> &'static str {
        "Start"
    }

    /// Spawns the diver here, once per level load.
    fn start(&mut self, game: &mut Ctx, me: EntityId) {
        if self.spawned {
            return;
        }
        let Some(at) = game.objects.body(me).map(|b| b.position) else {
            return;
        };
        let id = game.objects.add(player(at));
        game.world.player = Some(id);
        game.world.camera.follow = Some(id);
        self.spawned = true;
        log::debug!("diver spawned at {}", at);
    }

    fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {
        g.fill_circle(body.position, 0.3, RED);
    }
}

// player

pub struct Player {
    sink: Sink,
}

pub fn player(at: Vec2) -> Entity<Reef> {
    Entity::new(at)
        .with_tags(&[Tag::UPDATABLE, Tag::FOREGROUND, Tag::TOUCHABLE])
        .with_touch_radius(PLAYER_RADIUS)
        .with_behavior(Player {
            sink: Sink { rate: SINK_RATE },
        })
}

impl Behavior<Reef> for Player {
    fn kind(&self) -> &'static str {
        "Player"
    }

    fn update(&mut self, game: &mut Ctx, me: EntityId, dt: f32) {
        let viewport = game.viewport();
        let mouse = game.world.camera.screen_to_world(game.world.mouse, viewport);
        if let Some(body) = game.objects.body_mut(me) {
            body.position.x = mouse.x;
            self.sink.step(body, dt);
        }
    }

    fn touch(&mut self, game: &mut Ctx, _me: EntityId, other: EntityId) {
        let (hazard, goal) = match game.objects.body(other) {
            Some(body) => (body.has_tag(HAZARD), body.has_tag(Tag::END)),
            None => return,
        };
        if hazard {
            log::info!("the diver was caught by a fish");
            crate::enter(game, |s| &s.lose);
        } else if goal {
            log::info!("the diver reached the treasure");
            crate::enter(game, |s| &s.win);
        }
    }

    fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {
        g.fill_circle(body.position, PLAYER_RADIUS, YELLOW);
        g.stroke_circle(body.position, PLAYER_RADIUS, 0.05, BLACK);
    }
}

// fish

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sprite {
    Clown,
    Football,
}

impl Sprite {
    fn kind(&self) -> &'static str {
        match self {
            Sprite::Clown => "ClownFish",
            Sprite::Football => "FootballFish",
        }
    }

    fn color(&self) -> Color {
        match self {
            Sprite::Clown => ORANGE,
            Sprite::Football => MAROON,
        }
    }

    /// Multiplier on the fish's base size.
    fn size(&self) -> f32 {
        match self {
            Sprite::Clown => 1.0,
            Sprite::Football => 2.0,
        }
    }

    fn draw(&self, body: &Body, g: &mut dyn Renderer) {
        let r = FISH_RADIUS * self.size();
        let facing = if body.velocity.x < 0.0 { -1.0 } else { 1.0 };
        let tail = body.position - vec2(facing * r, 0.0);
        g.fill_circle(body.position, r, self.color());
        g.stroke_line(tail, tail + vec2(-facing * r, -r * 0.6), r * 0.3, self.color());
        g.stroke_line(tail, tail + vec2(-facing * r, r * 0.6), r * 0.3, self.color());
        g.fill_circle(body.position + vec2(facing * r * 0.5, -r * 0.2), r * 0.15, BLACK);
    }
}

pub struct Fish {
    movement: Box<dyn Movement>,
    sprite: Sprite,
}

impl Fish {
    pub fn new(sprite: Sprite, movement: impl Movement + 'static) -> Self {
        Self {
            movement: Box::new(movement),
            sprite,
        }
    }

    pub fn into_entity(self, at: Vec2) -> Entity<Reef> {
        let radius = FISH_RADIUS * self.sprite.size();
        Entity::new(at)
            .with_tags(&[
                Tag::UPDATABLE,
                Tag::FOREGROUND,
                Tag::TOUCHABLE,
                Tag::EXPORT,
                HAZARD,
            ])
            .with_touch_radius(radius)
            .with_behavior(self)
    }
}

/// A clown fish patrolling the default stretch around `at`.
pub fn clown_fish(at: Vec2) -> Entity<Reef> {
    Fish::new(
        Sprite::Clown,
        Patrol::new(at, Boundaries::DEFAULT, vec2(FISH_SPEED, 0.0)),
    )
    .into_entity(at)
}

/// A slower, bigger fish on the same patrol.
pub fn football_fish(at: Vec2) -> Entity<Reef> {
    Fish::new(
        Sprite::Football,
        Patrol::new(at, Boundaries::DEFAULT, vec2(FISH_SPEED * 0.5, 0.0)),
    )
    .into_entity(at)
}

/// A football fish going with the current, in a straight line and never turning.
pub fn drifting_fish(at: Vec2, current: Vec2) -> Entity<Reef> {
    Fish::new(Sprite::Football, Drift)
        .into_entity(at)
        .with_velocity(current)
}

impl Behavior<Reef> for Fish {
    fn kind(&self) -> &'static str {
        self.sprite.kind()
    }

    fn update(&mut self, game: &mut Ctx, me: EntityId, dt: f32) {
        if let Some(body) = game.objects.body_mut(me) {
            self.movement.step(body, dt);
        }
    }

    fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {
        self.sprite.draw(body, g);
    }
}

// treasure

pub struct Treasure;

pub fn treasure(at: Vec2) -> Entity<Reef> {
    Entity::new(at)
        .with_tags(&[Tag::FOREGROUND, Tag::TOUCHABLE, Tag::EXPORT, Tag::END])
        .with_touch_radius(TREASURE_RADIUS)
        .with_behavior(Treasure)
}

impl Behavior<Reef> for Treasure {
    fn kind(&self) -> &'static str {
        "Treasure"
    }

    fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {
        let r = TREASURE_RADIUS;
        g.fill_rect(
            Rect::new(body.position.x - r, body.position.y - r * 0.6, r * 2.0, r * 1.2),
            GOLD,
        );
        g.stroke_line(
            body.position - vec2(r, 0.0),
            body.position + vec2(r, 0.0),
            0.08,
            BROWN,
        );
    }
}

// movement

/// How an entity moves on its own. Strategies write position and velocity of the body.
pub trait Movement {
    fn step(&mut self, body: &mut Body, dt: f32);
}

/// How far a patrol may stray from its origin on each side.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Boundaries {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl Boundaries {
    pub const DEFAULT: Boundaries = Boundaries {
        left: 6.0,
        right: 6.0,
        top: 0.0,
        bottom: 0.0,
    };

    /// Every extent must be finite and non-negative, otherwise the rectangle is inverted.
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Result<Self, GameError> {
        let valid = [left, right, top, bottom]
            .iter()
            .all(|e| e.is_finite() && *e >= 0.0);
        if !valid {
            return Err(GameError::InvalidBounds {
                left,
                right,
                top,
                bottom,
            });
        }
        Ok(Self {
            left,
            right,
            top,
            bottom,
        })
    }

    fn min(&self) -> Vec2 {
        vec2(-self.left, -self.top)
    }

    fn max(&self) -> Vec2 {
        vec2(self.right, self.bottom)
    }
}

/// Swims at a constant velocity and turns around at the edges of its boundaries.
pub struct Patrol {
    origin: Vec2,
    bounds: Boundaries,
    offset: Vec2,
    velocity: Vec2,
}

impl Patrol {
    pub fn new(origin: Vec2, bounds: Boundaries, velocity: Vec2) -> Self {
        Self {
            origin,
            bounds,
            offset: Vec2::ZERO,
            velocity,
        }
    }
}

fn bounce(offset: &mut f32, velocity: &mut f32, min: f32, max: f32) {
    if *offset > max {
        *offset = 2.0 * max - *offset;
        *velocity = -*velocity;
    } else if *offset < min {
        *offset = 2.0 * min - *offset;
        *velocity = -*velocity;
    }
    *offset = offset.clamp(min, max);
}

impl Movement for Patrol {
    fn step(&mut self, body: &mut Body, dt: f32) {
        self.offset += self.velocity * dt;
        let (min, max) = (self.bounds.min(), self.bounds.max());
        bounce(&mut self.offset.x, &mut self.velocity.x, min.x, max.x);
        bounce(&mut self.offset.y, &mut self.velocity.y, min.y, max.y);
        body.position = self.origin + self.offset;
        body.velocity = self.velocity;
    }
}

/// Integrates the body's own velocity.
pub struct Drift;

impl Movement for Drift {
    fn step(&mut self, body: &mut Body, dt: f32) {
        body.position += body.velocity * dt;
    }
}

/// Goes down at a constant rate, whatever else happens.
pub struct Sink {
    pub rate: f32,
}

impl Movement for Sink {
    fn step(&mut self, body: &mut Body, dt: f32) {
        body.position.y += self.rate * dt;
    }
}
