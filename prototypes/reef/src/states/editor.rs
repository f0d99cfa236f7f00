use std::cell::RefCell;
use std::rc::Rc;

use macroquad::color::colors::BLACK;
use macroquad::math::{vec2, Vec2};
use shoal::{
    DrawLink, EntityId, EventKind, GameEvent, GameState, KeyCode, Listener, MouseButton, Renderer,
    Tag, UpdateLink,
};

use crate::entities::Item;
use crate::level::{change_level, report, Level};
use crate::{Ctx, Reef, EDITOR_PAN_SPEED};

/// What the editor is working on: the selected palette item and the level being laid out.
#[derive(Default)]
pub struct Editor {
    item: usize,
    leveldef: Vec<(Item, Vec2)>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self, game: &Ctx) -> Option<Item> {
        game.world.items.get(self.item).copied()
    }

    pub fn definition(&self) -> &[(Item, Vec2)] {
        &self.leveldef
    }

    /// Moves the palette selection by `step`, wrapping around at both ends.
    pub fn cycle(&mut self, game: &Ctx, step: i32) {
        let count = game.world.items.len() as i32;
        if count == 0 {
            return;
        }
        self.item = (self.item as i32 + step).rem_euclid(count) as usize;
    }

    /// The grid cell under the mouse, in world space.
    pub fn cursor(game: &Ctx) -> Vec2 {
        game.world
            .camera
            .screen_to_world(game.world.mouse, game.viewport())
            .round()
    }

    pub fn place(&mut self, game: &mut Ctx, at: Vec2) -> Option<EntityId> {
        let item = self.selected(game)?;
        self.leveldef.push((item, at));
        log::debug!("placed {} at {}", item.name, at);
        Some(game.objects.add((item.make)(at)))
    }

    /// Removes whatever exportable entities sit in the cell at `at`. Returns how many went.
    pub fn delete(&mut self, game: &mut Ctx, at: Vec2) -> usize {
        let doomed: Vec<EntityId> = game
            .objects
            .list(Tag::EXPORT)
            .iter()
            .filter(|id| {
                game.objects
                    .body(*id)
                    .map_or(false, |b| b.position.round() == at)
            })
            .collect();
        for id in doomed.iter() {
            game.objects.remove(*id);
        }
        self.leveldef.retain(|(_, p)| p.round() != at);
        doomed.len()
    }

    /// Replaces the definition with what the loaded level currently holds.
    pub fn load(&mut self, game: &Ctx) {
        self.leveldef = game
            .objects
            .list(Tag::EXPORT)
            .iter()
            .filter_map(|id| game.objects.get(id))
            .filter_map(|entity| {
                let kind = entity.kind();
                let item = game.world.items.iter().find(|item| item.name == kind);
                if item.is_none() {
                    log::debug!("no palette item for `{}`, leaving it out", kind);
                }
                item.map(|item| (*item, entity.body.position))
            })
            .collect();
        log::info!("loaded {} objects into the editor", self.leveldef.len());
    }

    /// Renders the definition as a listing, one object per line, and logs it. The listing
    /// always ends with a start marker at the origin.
    pub fn save(&self) -> String {
        let listing = self
            .leveldef
            .iter()
            .map(|(item, at)| format!("{} at ({}, {})", item.name, at.x, at.y))
            .chain(std::iter::once("Start at (0, 0)".to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        log::info!("level listing:\n{}", listing);
        listing
    }

    pub fn create_level(&self) -> Level {
        level_from(self.leveldef.clone())
    }

    fn draw(&self, game: &Ctx, g: &mut dyn Renderer) {
        game.objects.draw_foregrounds(Tag::EDITOR_VISIBLE, g);

        let seen = game.world.camera.visible(game.viewport());
        let (left, top) = (seen.x.floor() as i32, seen.y.floor() as i32);
        let (right, bottom) = ((seen.x + seen.w).ceil() as i32, (seen.y + seen.h).ceil() as i32);
        g.save();
        g.set_alpha(0.1);
        for x in left..right {
            let x = x as f32 - 0.5;
            g.stroke_line(vec2(x, top as f32), vec2(x, bottom as f32), 0.05, BLACK);
        }
        for y in top..bottom {
            let y = y as f32 - 0.5;
            g.stroke_line(vec2(left as f32, y), vec2(right as f32, y), 0.05, BLACK);
        }
        g.restore();

        let cursor = Editor::cursor(game);
        g.fill_circle(cursor, 0.1, BLACK);

        if let Some(item) = self.selected(game) {
            let ghost = (item.make)(cursor);
            if let Some(behavior) = ghost.behavior() {
                g.save();
                g.set_alpha(0.5);
                behavior.draw_foreground(&ghost.body, g);
                g.restore();
            }
        }
    }
}

fn level_from(leveldef: Vec<(Item, Vec2)>) -> Level {
    let objects = leveldef.clone();
    Level::new("level", move || {
        Ok(objects.iter().map(|(item, at)| (item.make)(*at)).collect())
    })
    .with_next(move || level_from(leveldef.clone()))
}

struct Installed {
    update: UpdateLink<Reef>,
    draw: DrawLink<Reef>,
    mouse: Listener<Reef>,
    keys: Listener<Reef>,
    /// Links taken out while editing, with the index each one came from.
    parked: Vec<(UpdateLink<Reef>, usize)>,
}

/// Edits the loaded level in place. Simulation stops while the editor is open; the camera is
/// panned with the arrow keys.
pub struct EditorState {
    editor: Rc<RefCell<Editor>>,
    installed: Option<Installed>,
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            editor: Rc::new(RefCell::new(Editor::new())),
            installed: None,
        }
    }

    pub fn editor(&self) -> Rc<RefCell<Editor>> {
        Rc::clone(&self.editor)
    }
}

fn pan(game: &mut Ctx, dt: f32) {
    let held = |key: KeyCode| if game.world.keys.contains(&key) { 1.0 } else { 0.0 };
    let movement = vec2(
        held(KeyCode::Right) - held(KeyCode::Left),
        held(KeyCode::Down) - held(KeyCode::Up),
    );
    game.world.camera.position += movement * dt * EDITOR_PAN_SPEED;
}

impl GameState<Reef> for EditorState {
    fn enable(&mut self, game: &mut Ctx) {
        let mut parked = Vec::new();
        for link in [
            game.world.camera_links.update.clone(),
            game.chains.update_objects.clone(),
            game.chains.touch.clone(),
        ] {
            if let Some(at) = game.chains.update.remove(&link) {
                parked.push((link, at));
            }
        }

        let update = game.chains.update.push(UpdateLink::new(|game: &mut Ctx, dt, next| {
            pan(game, *dt);
            // placed objects still have to show up
            game.objects.handle_pending();
            next.run(game, dt);
        }));

        let editor = self.editor();
        let draw = game.chains.draw.push(DrawLink::new(move |game: &mut Ctx, g, next| {
            next.run(game, g);
            editor.borrow().draw(game, g);
        }));

        let editor = self.editor();
        let mouse = game.events.on(
            EventKind::MouseDown,
            Listener::new(move |game: &mut Ctx, event: &GameEvent| {
                let at = Editor::cursor(game);
                match event {
                    GameEvent::MouseDown(MouseButton::Left) => {
                        editor.borrow_mut().place(game, at);
                    }
                    GameEvent::MouseDown(MouseButton::Right) => {
                        editor.borrow_mut().delete(game, at);
                    }
                    _ => {}
                }
            }),
        );

        let editor = self.editor();
        let keys = game.events.on(
            EventKind::KeyDown,
            Listener::new(move |game: &mut Ctx, event: &GameEvent| {
                let GameEvent::KeyDown(key) = event else {
                    return;
                };
                match key {
                    KeyCode::P => {
                        editor.borrow().save();
                    }
                    KeyCode::I => editor.borrow_mut().load(game),
                    KeyCode::E => crate::enter(game, |s| &s.gameplay),
                    KeyCode::R => {
                        let level = editor.borrow().create_level();
                        report(change_level(game, level));
                    }
                    KeyCode::RightBracket => editor.borrow_mut().cycle(game, 1),
                    KeyCode::LeftBracket => editor.borrow_mut().cycle(game, -1),
                    _ => {}
                }
            }),
        );

        log::info!("editor open");
        self.installed = Some(Installed {
            update,
            draw,
            mouse,
            keys,
            parked,
        });
    }

    fn disable(&mut self, game: &mut Ctx) {
        let Some(installed) = self.installed.take() else {
            return;
        };
        game.chains.update.remove(&installed.update);
        game.chains.draw.remove(&installed.draw);
        game.events.remove_listener(&installed.mouse);
        game.events.remove_listener(&installed.keys);
        for (link, at) in installed.parked.into_iter().rev() {
            game.chains.update.insert(at, link);
        }
        log::info!("editor closed");
    }

    fn name(&self) -> &'static str {
        "editor"
    }
}
