use macroquad::input::{
    get_keys_down, get_keys_pressed, is_mouse_button_pressed, mouse_position, KeyCode,
    MouseButton,
};
use macroquad::math::vec2;
use shoal::{GameEvent, UpdateLink};

use crate::{Ctx, Reef};

const BUTTONS: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

/// Polls macroquad once per frame and turns what happened into events. Goes in front of every
/// other update link so that input still arrives while a state short-circuits the rest.
pub fn install(game: &mut Ctx) -> UpdateLink<Reef> {
    game.chains.update.unshift(UpdateLink::new(|game: &mut Ctx, dt, next| {
        game.world.keys = get_keys_down();

        for key in get_keys_pressed() {
            if key == KeyCode::Escape {
                game.stop();
            }
            game.emit(GameEvent::KeyDown(key));
        }

        for button in BUTTONS {
            if is_mouse_button_pressed(button) {
                game.emit(GameEvent::MouseDown(button));
            }
        }

        let (x, y) = mouse_position();
        let mouse = vec2(x, y);
        if mouse != game.world.mouse {
            game.world.mouse = mouse;
            game.emit(GameEvent::MouseMove(mouse));
        }

        next.run(game, dt);
    }))
}
