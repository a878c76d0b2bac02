use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use typetrace::terminal::{self, LineInput};
use typetrace::{Config, Library, PracticeMode, ProgressStore};

#[derive(Parser)]
#[command(name = "typetrace")]
#[command(about = "Trace or copy a saved text and check every character as you type")]
#[command(version)]
struct Cli {
    /// Library database file
    #[arg(long, env = "TYPETRACE_DB")]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "TYPETRACE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a UTF-8 text file to the library
    Add {
        /// Display name
        name: String,
        /// File to import
        file: PathBuf,
    },
    /// List saved texts with their progress
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a text and its progress
    Delete { id: String },
    /// Show saved progress for a text
    Progress { id: String },
    /// Type a saved text
    Practice {
        id: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Trace)]
        mode: ModeArg,
        /// Plain output without ANSI colors
        #[arg(long)]
        no_color: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ModeArg {
    Trace,
    Copy,
}

impl From<ModeArg> for PracticeMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Trace => PracticeMode::Trace,
            ModeArg::Copy => PracticeMode::Copy,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(typetrace::default_library_path);
    let library = typetrace::open_library(&db_path)
        .with_context(|| format!("failed to open library at {}", db_path.display()))?;

    let config = typetrace::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Add { name, file } => {
            let id = typetrace::import_file(&library, &name, &file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!("{}", id);
        }
        Commands::List { json } => list(&library, &config, json)?,
        Commands::Delete { id } => {
            if !library.delete_text(&id)? {
                bail!("no text with id {}", id);
            }
            println!("deleted {}", id);
        }
        Commands::Progress { id } => progress(&library, &config, &id)?,
        Commands::Practice { id, mode, no_color } => {
            practice(&library, &id, mode.into(), config, !no_color)?;
        }
    }
    Ok(())
}

fn list(library: &Library, config: &Config, json: bool) -> Result<()> {
    let summaries = typetrace::summarize(library, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("(no saved texts)");
        return Ok(());
    }
    for s in summaries {
        let track = |c: Option<usize>| c.map_or_else(|| "-".to_string(), |c| format!("{}/{}", c, s.chars));
        println!(
            "{}  {}  trace {}  copy {}",
            s.id,
            s.name,
            track(s.trace),
            track(s.copy)
        );
    }
    Ok(())
}

fn progress(library: &Library, config: &Config, id: &str) -> Result<()> {
    let Some(text) = library.text(id)? else {
        bail!("no text with id {}", id);
    };
    let len = typetrace::practice_len(&text.content, config);
    for mode in [PracticeMode::Trace, PracticeMode::Copy] {
        match library.progress(id, mode)? {
            Some(record) => println!(
                "{}: {} / {} (saved {})",
                mode, record.position, len, record.timestamp
            ),
            None => println!("{}: not started", mode),
        }
    }
    Ok(())
}

fn practice(
    library: &Arc<Library>,
    id: &str,
    mode: PracticeMode,
    config: Config,
    color: bool,
) -> Result<()> {
    let mut session = typetrace::start_practice(library, id, mode, config)
        .with_context(|| format!("cannot practice text {}", id))?;
    session.spawn_autosave();

    let stdout = io::stdout();
    redraw(&mut stdout.lock(), session.ledger(), color)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("error reading stdin")?;
        match terminal::parse_line(&line) {
            LineInput::Quit => break,
            LineInput::Restart => session.restart(),
            LineInput::Backspace(n) => {
                terminal::backspace(&mut session, n);
            }
            LineInput::Unknown(cmd) => {
                eprintln!("unknown command: {}", cmd);
                continue;
            }
            LineInput::Events(events) => {
                if terminal::feed(&mut session, events) {
                    redraw(&mut stdout.lock(), session.ledger(), color)?;
                    println!("complete!");
                    continue;
                }
            }
        }
        redraw(&mut stdout.lock(), session.ledger(), color)?;
    }

    if !session.close() {
        eprintln!("warning: final progress could not be saved");
    }
    report_saved(library.as_ref(), id, mode);
    Ok(())
}

fn redraw(out: &mut impl Write, ledger: &typetrace::Ledger, color: bool) -> io::Result<()> {
    writeln!(out, "{}", terminal::render(ledger, color))?;
    writeln!(out, "{}", terminal::status_line(ledger))?;
    out.flush()
}

fn report_saved<S: ProgressStore + ?Sized>(store: &S, id: &str, mode: PracticeMode) {
    if let Ok(Some(cursor)) = store.load_cursor(id, mode) {
        println!("saved {} progress at {}", mode, cursor);
    }
}

