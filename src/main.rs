use anyhow::Context;
use log::LevelFilter;
use macroquad::prelude::*;
use path_logic::{FileSource, Game, GameConfig, MacroquadCanvas, CONFIG_PATH};

fn window_conf() -> Conf {
    Conf {
        window_title: "Road builder".into(),
        window_width: 1280,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

/// Browser console on wasm, stderr (overridable with `RUST_LOG`) elsewhere.
fn init_logging(level: LevelFilter) -> anyhow::Result<()> {
    #[cfg(target_arch = "wasm32")]
    if let Some(level) = level.to_level() {
        console_log::init_with_level(level).context("Installing console logger")?;
    }
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("Installing logger")?;
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let source = FileSource::new();
    let config = GameConfig::load(&source, CONFIG_PATH)
        .await
        .with_context(|| format!("Reading configuration {}", CONFIG_PATH))?;
    init_logging(config.log_level)?;

    let seed = config
        .shuffle_seed
        .unwrap_or_else(|| macroquad::miniquad::date::now() as u64);
    macroquad::rand::srand(seed);

    let mut canvas = MacroquadCanvas::new().context("Initialising renderer")?;
    let mut game = Game::new(source, config);
    game.attach_input();
    game.start();

    loop {
        game.frame(get_frame_time(), &mut canvas);
        next_frame().await;
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("path-logic: {:#}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_installs_once() {
        init_logging(LevelFilter::Debug).unwrap();
        assert_ne!(log::max_level(), LevelFilter::Off);
        assert!(init_logging(LevelFilter::Info).is_err());
    }
}
