/// Entry point and game loop.

mod config;
mod domain;
mod flow;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use anyhow::Context;

use config::{GameConfig, Tuning};
use domain::physics::Arena;
use flow::controller::FlowController;
use sim::level::Content;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    if let Err(e) = run(&config) {
        log::error!("fatal: {e:#}");
        eprintln!("Glow Grove stopped: {e:#}");
        std::process::exit(1);
    }
}

/// Log to a file: the terminal belongs to the renderer. `RUST_LOG` wins
/// over the configured level.
fn init_logging(config: &GameConfig) -> anyhow::Result<()> {
    let path = &config.general.log_file;
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;

    let env = env_logger::Env::default().default_filter_or(config.general.log_level.as_str());
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

fn run(config: &GameConfig) -> anyhow::Result<()> {
    match &config.source {
        Some(path) => log::info!("settings from {}", path.display()),
        None => log::info!("no config.toml found, using defaults"),
    }

    let content = Content::load(config.general.content_file.as_deref(), &config.tuning)?;
    let arena = content.arena;
    let mut flow = FlowController::new(content, config.tuning.clone())?;

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut flow, &mut renderer, arena, &config.tuning);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    log::info!(
        "session over after {} ticks: {} levels completed",
        flow.ticks(), flow.session().completed_levels().len(),
    );
    println!();
    println!("{}", flow.session().personalize("Thanks for walking through the grove{name}."));
    if flow.is_celebrating() {
        println!("♥");
    }
    Ok(())
}

fn game_loop(
    flow: &mut FlowController,
    renderer: &mut Renderer,
    arena: Arena,
    tuning: &Tuning,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_release();
    let tick_rate = Duration::from_millis(tuning.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        let inputs = kb.drain_events();
        if kb.quit_requested() {
            log::info!("quit from {:?}", flow.current());
            break;
        }
        for input in inputs {
            flow.handle_input(input)?;
        }

        if last_tick.elapsed() >= tick_rate {
            flow.update()?;
            last_tick = Instant::now();
        }

        renderer.begin_frame(arena)?;
        flow.draw(renderer);
        renderer.end_frame()?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
