use std::fs::File;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use log::error;
use ratatui::prelude::*;

use securemail::app::{App, AppError, AppResult};
use securemail::config::Config;
use securemail::email::{FolderFilter, Role};
use securemail::filter::{self, ViewQuery};
use securemail::ui::{format_timestamp, ui};

/// Terminal inbox simulator over an in-memory set of emails
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to config file
    #[clap(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Write log output to this file instead of stderr
    #[clap(long)]
    log_file: Option<String>,

    /// Role to view as (Admin, User)
    #[clap(short, long)]
    role: Option<Role>,

    /// JSON file with the records to load instead of the built-in set
    #[clap(long)]
    seed: Option<String>,

    /// Skip the loading screen
    #[clap(long)]
    no_delay: bool,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the emails visible for a role, folder and search text
    List {
        /// Folder filter (All, Inbox, Spam, Archived)
        #[clap(short, long, default_value = "All")]
        folder: FolderFilter,

        /// Case-insensitive search text
        #[clap(short, long, default_value = "")]
        search: String,
    },

    /// Write the default config file
    InitConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    let config_path = match &args.config {
        Some(path) => shellexpand::tilde(path).into_owned(),
        None => Config::default_path().to_string_lossy().into_owned(),
    };
    if let Some(Commands::InitConfig) = args.command {
        Config::init_file(&config_path)
            .with_context(|| format!("Failed to write config to {}", config_path))?;
        println!("Wrote config to {}", config_path);
        return Ok(());
    }

    // A missing file yields defaults; an unreadable one is an error
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    if let Some(seed) = args.seed.clone() {
        config.seed_file = Some(seed);
    }
    if args.no_delay {
        config.ui.loading_delay_ms = 0;
    }
    let role = args.role.unwrap_or(config.default_role);

    match args.command {
        Some(Commands::List { folder, search }) => {
            let store = config.load_store()?;
            let query = ViewQuery::new(folder, &search, role);
            let emails = filter::project(&store, &query);
            for email in &emails {
                println!(
                    "{:>3} {} {:<8} {:<25} {}",
                    email.id,
                    if email.read { " " } else { "*" },
                    email.folder,
                    email.sender,
                    email.subject
                );
            }
            println!(
                "{} shown, {} unread in Inbox ({})",
                emails.len(),
                filter::unread_count(&store, role),
                role
            );
            if let Some(latest) = emails.iter().map(|e| e.timestamp).max() {
                println!("Latest: {}", format_timestamp(&latest, &config.ui.detail_date_format));
            }
            return Ok(());
        }
        Some(Commands::InitConfig) | None => {}
    }

    let mut app = App::from_config(&config, role).context("Failed to load seed emails")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("Failed to create terminal")?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    io::stdout()
        .execute(LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;

    if let Err(err) = result {
        error!("Error: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    if let Some(path) = &args.log_file {
        let path = shellexpand::tilde(path).into_owned();
        let file = File::create(&path).with_context(|| format!("Failed to open log file {}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if args.command.is_none() {
        // stderr would draw over the alternate screen
        builder.filter_level(log::LevelFilter::Off);
    }

    builder.init();
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> AppResult<()> {
    let mut consecutive_errors = 0;
    const MAX_CONSECUTIVE_ERRORS: u32 = 10;

    loop {
        if let Err(e) = terminal.draw(|frame| ui(frame, app)) {
            consecutive_errors += 1;
            if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                return Err(AppError::IoError(e));
            }
            continue;
        }
        consecutive_errors = 0;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key_event(key);

                    if app.should_quit {
                        return Ok(());
                    }
                }
            }
        }

        app.tick();
    }
}
