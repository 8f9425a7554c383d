//! Terminal runner (default binary).
//!
//! Drives a [`Runtime`] from the wall clock and crossterm events, renders
//! through the framebuffer renderer, and keeps the game in a save file between
//! runs. Logs go to a file because the terminal is in raw mode.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use crossterm::event::{self, Event};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use blockfall::core::GameSnapshot;
use blockfall::engine::Runtime;
use blockfall::input::{should_quit, InputHandler};
use blockfall::savefile;
use blockfall::settings::{project_dirs, Settings};
use blockfall::term::{FrameBuffer, GameView, TerminalRenderer, Viewport};
use blockfall::types::{Command, GameStatus};

// Upper bound on a poll so a held key without release events still times out.
const MAX_POLL_MS: u64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Options {
    /// Ignore any save and start over.
    new_game: bool,
    seed: Option<u32>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--new" => options.new_game = true,
            "--seed" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --seed"))?;
                options.seed = Some(
                    v.parse::<u32>()
                        .map_err(|_| anyhow!("invalid --seed value: {}", v))?,
                );
            }
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(options)
}

fn init_logging() -> Option<WorkerGuard> {
    let dir = project_dirs()
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("blockfall.log")
        .build(&dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockfall=info"));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init()
        .ok()?;
    tracing::info!(log_dir = %dir.display(), "blockfall starting");
    Some(guard)
}

fn fresh_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;
    let _guard = init_logging();

    let settings = Settings::load();
    if let Some(path) = Settings::settings_path().filter(|path| !path.exists()) {
        if let Err(err) = settings.save_to(&path) {
            tracing::warn!(%err, "could not write default settings");
        }
    }
    let seed = options
        .seed
        .or(settings.gameplay.seed)
        .unwrap_or_else(fresh_seed);
    let save_path = savefile::default_path();

    let mut runtime = open_game(&options, &settings, save_path.as_ref(), seed);
    let mut input = InputHandler::new()
        .with_key_release_timeout_ms(settings.gameplay.key_release_timeout_ms);

    let mut term = TerminalRenderer::new();
    term.enter()?;
    let result = run(&mut term, &mut runtime, &mut input, save_path.as_deref());
    // Always try to restore terminal state.
    let _ = term.exit();

    if let Some(path) = &save_path {
        if let Err(err) = savefile::sync(path, runtime.session()) {
            tracing::warn!(%err, "could not update save file");
        }
    }
    tracing::info!(score = runtime.session().score(), "blockfall exiting");
    result
}

fn open_game(
    options: &Options,
    settings: &Settings,
    save_path: Option<&PathBuf>,
    seed: u32,
) -> Runtime {
    let saved = match save_path {
        Some(path) if !options.new_game => savefile::load(path).unwrap_or_else(|err| {
            tracing::warn!(%err, "discarding unreadable save");
            None
        }),
        _ => None,
    };
    if let Some(saved) = saved {
        match Runtime::resume_saved(&saved, seed, settings.engine) {
            Ok(runtime) => {
                tracing::info!("continuing saved game");
                return runtime;
            }
            Err(err) => tracing::warn!(%err, "save rejected, starting a new game"),
        }
    }
    Runtime::start(seed, settings.engine)
}

fn run(
    term: &mut TerminalRenderer,
    runtime: &mut Runtime,
    input: &mut InputHandler,
    save_path: Option<&Path>,
) -> Result<()> {
    let view = GameView::default();
    let mut snap = GameSnapshot::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut dirty = true;
    let mut last = Instant::now();
    let mut was_lost = false;

    loop {
        if dirty {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            runtime.snapshot_into(&mut snap);
            view.render_into(&snap, Viewport::new(w, h), &mut fb);
            term.draw_swap(&mut fb)?;
            dirty = false;
        }

        let mut timeout_ms = runtime.next_wakeup_in().unwrap_or(MAX_POLL_MS);
        if input.held().is_some() && !term.enhanced_keys() {
            timeout_ms = timeout_ms.min(MAX_POLL_MS);
        }

        if event::poll(Duration::from_millis(timeout_ms))? {
            match event::read()? {
                Event::Key(key) => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(command) = input.handle_key(key) {
                        dirty |= runtime.command(command).any();
                    }
                }
                Event::FocusLost => {
                    input.reset();
                    dirty |= runtime.command(Command::FocusLost).any();
                }
                Event::FocusGained => {
                    dirty |= runtime.command(Command::FocusGained).any();
                }
                Event::Resize(_, _) => {
                    term.invalidate();
                    dirty = true;
                }
                _ => {}
            }
        }

        let elapsed_ms = last.elapsed().as_millis() as u64;
        if elapsed_ms > 0 {
            last += Duration::from_millis(elapsed_ms);
            if let Some(command) = input.update(elapsed_ms as u32) {
                dirty |= runtime.command(command).any();
            }
            dirty |= runtime.advance(elapsed_ms).any();
        }

        if let Some(event) = runtime.take_last_event() {
            tracing::debug!(lines = event.lines_cleared, delta = event.score_delta, "piece locked");
            if let Some(path) = save_path {
                if let Err(err) = savefile::checkpoint(path, &event, runtime.session()) {
                    tracing::warn!(%err, "could not checkpoint save file");
                }
            }
        }
        let lost = runtime.session().status() == GameStatus::Lost;
        if lost && !was_lost {
            tracing::info!(score = runtime.session().score(), "game over");
        }
        was_lost = lost;
    }
}
