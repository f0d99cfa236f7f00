use macroquad::prelude::next_frame;
use reef::level::{change_level, shallows};
use reef::{autorefresh, input, window_conf, AUTO_REFRESH};
use shoal::graphics::Canvas;
use shoal::{Config, Timestep};

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config {
        timestep: Timestep::Measured { max: 1.0 / 20.0 },
        ..Default::default()
    };
    let mut game = match reef::new_game(config) {
        Ok(game) => game,
        Err(err) => {
            log::error!("could not set up the game: {}", err);
            return;
        }
    };

    input::install(&mut game);
    autorefresh::arm(&mut game, AUTO_REFRESH);
    if let Err(err) = change_level(&mut game, shallows()) {
        log::error!("could not load the first level: {}", err);
        return;
    }
    reef::enter(&mut game, |s| &s.menu);

    let mut canvas = Canvas::new();
    if let Err(err) = game.run(&mut canvas, next_frame).await {
        log::error!("{}", err);
    }
}
