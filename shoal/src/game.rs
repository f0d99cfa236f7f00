use std::future::Future;

use macroquad::color::{colors::DARKBLUE, Color};
use macroquad::math::Vec2;
use macroquad::time::get_time;

use crate::chain::{Chain, Link, Next};
use crate::error::GameError;
use crate::events::Emitter;
use crate::graphics::Renderer;
use crate::state::StateMachine;
use crate::store::{Behavior, EntityId, EntityStore, IndexList, Tag};
use crate::touch;

pub type UpdateLink<W> = Link<Game<W>, f32>;
pub type DrawLink<W> = Link<Game<W>, dyn Renderer>;

/// Surface size assumed until the first frame reports the real one.
pub const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1024.0, 768.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Timestep {
    /// Every frame advances by the same `dt`, in seconds.
    Fixed(f32),
    /// Wall-clock time since the previous frame, clamped to `max`.
    Measured { max: f32 },
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub timestep: Timestep,
    pub background: Color,
    /// Wall-clock seconds. Defaults to macroquad's clock, which needs a window; tests without
    /// one swap in their own.
    pub clock: fn() -> f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timestep: Timestep::Fixed(1.0 / 60.0),
            background: DARKBLUE,
            clock: get_time,
        }
    }
}

/// Identity of one run of the loop. Stopping the loop makes every outstanding token stale.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RunToken(u64);

/// The update and draw chains, plus handles to the links every game starts with.
pub struct Chains<W> {
    pub update: Chain<Game<W>, f32>,
    pub draw: Chain<Game<W>, dyn Renderer>,
    /// Runs `update` on every updatable entity, then flushes the store.
    pub update_objects: UpdateLink<W>,
    /// Touch detection. Sits right after `update_objects`.
    pub touch: UpdateLink<W>,
    /// Draws the background view, then the foreground view.
    pub draw_objects: DrawLink<W>,
}

pub struct Game<W> {
    /// Application data: camera, input state, whatever the game needs.
    pub world: W,
    pub objects: EntityStore<W>,
    pub chains: Chains<W>,
    pub events: Emitter<W>,
    pub config: Config,
    pub(crate) states: StateMachine<W>,
    time: f32,
    viewport: Vec2,
    running: Option<RunToken>,
    runs: u64,
    last_frame: Option<f64>,
}

impl<W: 'static> Game<W> {
    pub fn new(world: W, config: Config) -> Self {
        let mut objects = EntityStore::new();
        for tag in [Tag::UPDATABLE, Tag::BACKGROUND, Tag::FOREGROUND, Tag::TOUCHABLE] {
            objects.create_index_list(tag);
        }

        let mut update = Chain::new();
        let update_objects = update.push(UpdateLink::new(update_objects_link::<W>));
        let touch = update.push(touch::link());

        let mut draw = Chain::new();
        let draw_objects = draw.push(DrawLink::new(|game: &mut Game<W>, g, next| {
            game.objects.draw(g);
            next.run(game, g);
        }));

        Self {
            world,
            objects,
            chains: Chains {
                update,
                draw,
                update_objects,
                touch,
                draw_objects,
            },
            events: Emitter::new(),
            config,
            states: StateMachine::new(),
            time: 0.0,
            viewport: DEFAULT_VIEWPORT,
            running: None,
            runs: 0,
            last_frame: None,
        }
    }

    /// Simulated seconds since the game was created. Stands still while a link swallows `dt`.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Surface size as of the last frame.
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn start(&mut self) -> Result<RunToken, GameError> {
        if self.running.is_some() {
            log::error!("game loop started twice");
            return Err(GameError::AlreadyRunning);
        }
        self.runs += 1;
        let token = RunToken(self.runs);
        self.running = Some(token);
        self.last_frame = None;
        log::info!("game loop started");
        Ok(token)
    }

    /// Ends the current run. Frames already scheduled with its token do nothing.
    pub fn stop(&mut self) {
        if self.running.take().is_some() {
            log::info!("game loop stopped");
        }
    }

    /// Runs one frame if `token` belongs to the current run. Returns whether the run is still
    /// going afterwards.
    pub fn frame<R: Renderer + 'static>(&mut self, token: RunToken, g: &mut R) -> bool {
        if self.running != Some(token) {
            return false;
        }

        let mut dt = self.step();
        let update = self.chains.update.pass();
        update.run_live(self, &mut dt, live_update::<W>);
        self.time += dt;

        g.fit_to_screen();
        self.viewport = g.size();
        g.clear(self.config.background);
        let draw = self.chains.draw.pass();
        draw.run_live(self, g, live_draw::<W>);

        self.running == Some(token)
    }

    /// Drives frames until the loop is stopped, awaiting `next_frame` in between.
    pub async fn run<R, F, Fut>(&mut self, g: &mut R, mut next_frame: F) -> Result<(), GameError>
    where
        R: Renderer + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let token = self.start()?;
        while self.frame(token, g) {
            next_frame().await;
        }
        Ok(())
    }

    /// Seconds on the configured wall clock.
    pub fn now(&self) -> f64 {
        (self.config.clock)()
    }

    fn step(&mut self) -> f32 {
        match self.config.timestep {
            Timestep::Fixed(dt) => dt,
            Timestep::Measured { max } => {
                let now = self.now();
                let dt = self.last_frame.map_or(0.0, |last| (now - last) as f32);
                self.last_frame = Some(now);
                dt.clamp(0.0, max)
            }
        }
    }

    /// Checks the entity's behavior out of the store, hands it to `f`, and puts it back if the
    /// entity is still around. `None` if the entity is unknown or has no behavior.
    pub fn with_behavior<T>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut dyn Behavior<W>, &mut Game<W>) -> T,
    ) -> Option<T> {
        let mut behavior = self.objects.take_behavior(id)?;
        let out = f(behavior.as_mut(), self);
        self.objects.restore_behavior(id, behavior);
        Some(out)
    }

    /// Calls `start` on the entity's behavior.
    pub fn start_entity(&mut self, id: EntityId) {
        self.with_behavior(id, |behavior, game| behavior.start(game, id));
    }
}

fn live_update<W>(game: &Game<W>) -> &Chain<Game<W>, f32> {
    &game.chains.update
}

fn live_draw<W>(game: &Game<W>) -> &Chain<Game<W>, dyn Renderer> {
    &game.chains.draw
}

fn update_objects_link<W: 'static>(
    game: &mut Game<W>,
    dt: &mut f32,
    next: Next<'_, Game<W>, f32>,
) {
    let ids = game
        .objects
        .try_list(Tag::UPDATABLE)
        .map(IndexList::to_vec)
        .unwrap_or_default();
    let step = *dt;
    for id in ids {
        // removed earlier this frame
        if !game.objects.is_alive(id) {
            continue;
        }
        game.with_behavior(id, |behavior, game| behavior.update(game, id, step));
    }
    game.objects.handle_pending();
    next.run(game, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{Recorder, RED};
    use crate::store::{Body, Entity};
    use macroquad::math::vec2;

    #[derive(Default)]
    struct World {
        updates: Vec<(EntityId, f32)>,
        frames: u32,
        doomed: Option<UpdateLink<World>>,
    }

    thread_local!(static TICKS: std::cell::Cell<f64> = std::cell::Cell::new(0.0));

    /// A clock that moves one second every time it is read.
    fn ticking_clock() -> f64 {
        TICKS.with(|ticks| {
            let now = ticks.get() + 1.0;
            ticks.set(now);
            now
        })
    }

    struct Mover;

    impl Behavior<World> for Mover {
        fn update(&mut self, game: &mut Game<World>, me: EntityId, dt: f32) {
            game.world.updates.push((me, dt));
            if let Some(body) = game.objects.body_mut(me) {
                body.position += body.velocity * dt;
            }
        }

        fn draw_foreground(&self, body: &Body, g: &mut dyn Renderer) {
            g.fill_circle(body.position, 1.0, RED);
        }
    }

    /// Removes every other updatable entity on its first update.
    struct Reaper;

    impl Behavior<World> for Reaper {
        fn update(&mut self, game: &mut Game<World>, me: EntityId, _dt: f32) {
            for id in game.objects.list(Tag::UPDATABLE).to_vec() {
                if id != me {
                    game.objects.remove(id);
                }
            }
        }
    }

    fn game() -> Game<World> {
        Game::new(World::default(), Config::default())
    }

    #[test]
    fn test_update_link_moves_and_flushes() {
        let mut game = game();
        let id = game.objects.add(
            Entity::new(Vec2::ZERO)
                .with_tags(&[Tag::UPDATABLE, Tag::FOREGROUND])
                .with_velocity(vec2(60.0, 0.0))
                .with_behavior(Mover),
        );
        let mut g = Recorder::default();
        let token = game.start().unwrap();

        // first frame only flushes the add
        assert!(game.frame(token, &mut g));
        assert!(game.world.updates.is_empty());
        assert!(game.frame(token, &mut g));
        assert_eq!(game.world.updates, vec![(id, 1.0 / 60.0)]);
        assert_eq!(game.objects.body(id).unwrap().position, vec2(1.0, 0.0));
        assert_eq!(g.circles(), vec![(vec2(1.0, 0.0), 1.0)]);
    }

    #[test]
    fn test_removed_entities_skip_update() {
        let mut game = game();
        game.objects
            .add(Entity::new(Vec2::ZERO).with_tag(Tag::UPDATABLE).with_behavior(Reaper));
        let victim = game
            .objects
            .add(Entity::new(Vec2::ZERO).with_tag(Tag::UPDATABLE).with_behavior(Mover));
        game.objects.handle_pending();

        let mut g = Recorder::default();
        let token = game.start().unwrap();
        game.frame(token, &mut g);

        assert!(game.world.updates.is_empty());
        assert!(!game.objects.contains(victim));
    }

    #[test]
    fn test_start_twice_fails() {
        let mut game = game();
        game.start().unwrap();
        assert_eq!(game.start().unwrap_err(), GameError::AlreadyRunning);
    }

    #[test]
    fn test_stale_token_is_noop() {
        let mut game = game();
        let mut g = Recorder::default();
        let first = game.start().unwrap();
        game.stop();
        let second = game.start().unwrap();

        assert!(!game.frame(first, &mut g));
        assert_eq!(g.frames(), 0);
        assert!(game.frame(second, &mut g));
        assert_eq!(g.frames(), 1);
    }

    #[test]
    fn test_stop_inside_frame_ends_run() {
        let mut game = game();
        game.chains.update.push(UpdateLink::new(|game: &mut Game<World>, dt, next| {
            game.stop();
            next.run(game, dt);
        }));
        let mut g = Recorder::default();
        let token = game.start().unwrap();
        assert!(!game.frame(token, &mut g));
        // the frame that stopped still drew
        assert_eq!(g.frames(), 1);
    }

    #[test]
    fn test_frame_clears_with_background_and_reads_viewport() {
        let mut game = game();
        game.config.background = RED;
        let mut g = Recorder::new(vec2(640.0, 480.0));
        let token = game.start().unwrap();
        game.frame(token, &mut g);

        assert_eq!(g.ops.first(), Some(&crate::graphics::DrawOp::Clear(RED)));
        assert_eq!(game.viewport(), vec2(640.0, 480.0));
    }

    #[test]
    fn test_time_follows_dt_seen_by_the_chain() {
        let mut game = game();
        game.chains.update.unshift(UpdateLink::new(|game: &mut Game<World>, dt, next| {
            let mut half = *dt / 2.0;
            next.run(game, &mut half);
            *dt = half;
        }));
        let mut g = Recorder::default();
        let token = game.start().unwrap();
        game.frame(token, &mut g);
        assert!((game.time() - 1.0 / 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_until_stopped() {
        let mut game = game();
        game.chains.update.push(UpdateLink::new(|game: &mut Game<World>, dt, next| {
            game.world.frames += 1;
            if game.world.frames == 5 {
                game.stop();
            }
            next.run(game, dt);
        }));
        let mut g = Recorder::default();

        futures::executor::block_on(game.run(&mut g, || futures::future::ready(())))
            .unwrap();
        assert_eq!(game.world.frames, 5);
        assert!(!game.is_running());
    }

    #[test]
    fn test_measured_timestep_is_clamped() {
        let mut game = game();
        game.config.timestep = Timestep::Measured { max: 0.05 };
        game.config.clock = ticking_clock;
        let mut g = Recorder::default();
        let token = game.start().unwrap();
        // nothing to measure against yet
        game.frame(token, &mut g);
        assert_eq!(game.time(), 0.0);
        game.frame(token, &mut g);
        assert_eq!(game.time(), 0.05);
    }

    #[test]
    fn test_link_removed_mid_frame_does_not_run() {
        let mut game = game();
        let counter = game.chains.update.push(UpdateLink::new(|game: &mut Game<World>, dt, next| {
            game.world.frames += 1;
            next.run(game, dt);
        }));
        game.world.doomed = Some(counter);
        // stands in for a state change triggered by input at the front of the chain
        game.chains.update.unshift(UpdateLink::new(|game: &mut Game<World>, dt, next| {
            if let Some(link) = game.world.doomed.take() {
                game.chains.update.remove(&link);
                game.chains.update.remove(&game.chains.update_objects);
            }
            next.run(game, dt);
        }));
        let id = game.objects.add(
            Entity::new(Vec2::ZERO)
                .with_tag(Tag::UPDATABLE)
                .with_behavior(Mover),
        );
        game.objects.handle_pending();

        let mut g = Recorder::default();
        let token = game.start().unwrap();
        game.frame(token, &mut g);
        assert_eq!(game.world.frames, 0);
        assert!(game.world.updates.is_empty());
        assert!(game.objects.contains(id));
    }
}
