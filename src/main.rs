// contact-scout entry point.
// Parses options, sets up logging and the runtime, then runs the TUI or a headless crawl.

use std::fs::{self, OpenOptions};
use std::io;
use std::process::ExitCode;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use env_logger::{Env, Target};
use tokio::runtime::Runtime;

use contact_scout::app::App;
use contact_scout::cache::{DEFAULT_TTL, DiskCache, paths};
use contact_scout::config::{Cli, Commands, Settings};
use contact_scout::error::{Result, ScoutError};
use contact_scout::events::EventBus;

fn main() -> ExitCode {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(&cli)?;
    let headless = matches!(cli.command, Some(Commands::Run { .. }));
    init_logging(settings.verbose, headless);

    if cli.clear_cache {
        if let Some(cache) = DiskCache::open_default(DEFAULT_TTL) {
            cache.clear()?;
            log::info!("Cleared page cache");
        }
    }

    let runtime = Runtime::new()?;

    match cli.command {
        Some(Commands::Run { interactive }) => run_headless(&runtime, &settings, interactive),
        None => run_tui(&runtime, settings),
    }
}

/// Log to stderr when headless. The TUI owns the terminal, so it logs to a file.
fn init_logging(verbose: bool, headless: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));

    if !headless {
        let file = paths::log_path().and_then(|path| {
            fs::create_dir_all(path.parent()?).ok()?;
            OpenOptions::new().create(true).append(true).open(path).ok()
        });
        match file {
            Some(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn run_headless(runtime: &Runtime, settings: &Settings, interactive: bool) -> Result<()> {
    let input = settings
        .input
        .clone()
        .ok_or_else(|| ScoutError::Other("run needs --input <CSV>".into()))?;
    let pipeline = settings.pipeline(EventBus::new())?.interactive(interactive);

    let output = runtime.block_on(pipeline.run_file(&input, &settings.output_dir))?;
    println!(
        "{} contacts written to {} and {}",
        output.summary.rows.len(),
        output.updated_path.display(),
        output.merged_path.display()
    );
    println!(
        "Tokens: input {}, output {}, total {}",
        output.summary.usage.input, output.summary.usage.output, output.summary.usage.total
    );
    Ok(())
}

fn run_tui(runtime: &Runtime, settings: Settings) -> Result<()> {
    let mut app = App::new(settings, runtime.handle().clone())?;

    let mut terminal = ratatui::try_init()?;
    if let Err(e) = execute!(io::stdout(), EnableMouseCapture) {
        log::warn!("Mouse capture unavailable: {}", e);
    }
    let result = app.run(&mut terminal);
    // best effort, the terminal is being torn down either way
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    Ok(result?)
}
