use macroquad::color::Color;
use macroquad::math::{vec2, Rect, Vec2};
use shoal::{DrawLink, EntityId, GameError, UpdateLink};

use crate::{Ctx, Reef, DEFAULT_ZOOM, WORLD_WIDTH};

const SEA: Color = Color::new(0.05, 0.2, 0.35, 1.0);
const SURFACE: Color = Color::new(0.6, 0.85, 1.0, 1.0);

/// Looks at `position` in world space. World y grows downwards, so sinking is +y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    /// Entity whose depth the camera tracks.
    pub follow: Option<EntityId>,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: DEFAULT_ZOOM,
            follow: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn pixels_per_meter(&self, viewport: Vec2) -> f32 {
        viewport.x / WORLD_WIDTH / self.zoom
    }

    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        (world - self.position) * self.pixels_per_meter(viewport) + viewport * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Vec2 {
        (screen - viewport * 0.5) / self.pixels_per_meter(viewport) + self.position
    }

    /// World-space rectangle currently on screen.
    pub fn visible(&self, viewport: Vec2) -> Rect {
        let top_left = self.screen_to_world(Vec2::ZERO, viewport);
        let bottom_right = self.screen_to_world(viewport, viewport);
        let size = bottom_right - top_left;
        Rect::new(top_left.x, top_left.y, size.x, size.y)
    }
}

/// Handles to the camera's links, kept so states can take them out and put them back.
pub struct CameraLinks {
    pub update: UpdateLink<Reef>,
    pub draw: DrawLink<Reef>,
}

impl CameraLinks {
    pub fn new() -> Self {
        Self {
            update: follow_link(),
            draw: draw_link(),
        }
    }
}

/// Pushes the follow link and slots the camera transform in front of the object drawing.
pub fn install(game: &mut Ctx) -> Result<(), GameError> {
    let update = game.world.camera_links.update.clone();
    let draw = game.world.camera_links.draw.clone();
    game.chains.update.push(update);
    game.chains
        .draw
        .insert_before(draw, &game.chains.draw_objects)?;
    log::debug!("camera installed");
    Ok(())
}

fn follow_link() -> UpdateLink<Reef> {
    UpdateLink::new(|game: &mut Ctx, dt, next| {
        next.run(game, dt);
        if let Some(id) = game.world.camera.follow {
            match game.objects.body(id) {
                Some(body) => game.world.camera.position.y = body.position.y,
                None => game.world.camera.follow = None,
            }
        }
    })
}

fn draw_link() -> DrawLink<Reef> {
    DrawLink::new(|game: &mut Ctx, g, next| {
        let viewport = g.size();
        g.fill_rect(Rect::new(0.0, 0.0, viewport.x, viewport.y), SEA);

        let camera = game.world.camera;
        let ppm = camera.pixels_per_meter(viewport);
        g.save();
        g.translate(viewport * 0.5);
        g.scale(ppm);
        g.translate(-camera.position);

        let seen = camera.visible(viewport);
        g.stroke_line(
            vec2(seen.x, 0.0),
            vec2(seen.x + seen.w, 0.0),
            2.0 / ppm,
            SURFACE,
        );

        next.run(game, g);
        g.restore();
    })
}
