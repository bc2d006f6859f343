use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use fretlog::{
    app_dirs::AppDirs,
    display, export,
    storage::{PracticeStore, SqliteStore},
    store::{SessionId, SongId, TechniqueId},
    Clock, SettingKey, Tracker, TrackerError,
};
use std::{
    error::Error,
    fs::File,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

/// practice journal for guitarists
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Log practice sessions, level up techniques, track song progress, streaks and a weekly goal."
)]
pub struct Cli {
    /// path to the practice database (default: ~/.local/state/fretlog/fretlog.db)
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// print debug logging to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// log a practice session
    Log {
        /// practice date as YYYY-MM-DD (default: today)
        #[clap(short = 'd', long)]
        date: Option<String>,

        /// minutes practiced
        #[clap(short = 'm', long, default_value_t = 30, allow_negative_numbers = true)]
        duration: i64,

        /// id of a technique practiced, repeatable
        #[clap(short = 't', long = "technique")]
        techniques: Vec<u64>,

        /// id of a song practiced, repeatable
        #[clap(short = 's', long = "song")]
        songs: Vec<u64>,

        /// free-text notes
        #[clap(short = 'n', long, default_value = "")]
        notes: String,
    },
    /// delete a session and reverse the progress it made
    Delete {
        id: u64,

        /// skip the confirmation prompt
        #[clap(short = 'y', long)]
        yes: bool,
    },
    /// list sessions, newest first
    Sessions {
        /// only the five most recently logged
        #[clap(long)]
        recent: bool,
    },
    /// list or add techniques
    Techniques {
        #[clap(subcommand)]
        action: Option<EntityAction>,
    },
    /// list or add songs
    Songs {
        #[clap(subcommand)]
        action: Option<EntityAction>,
    },
    /// totals, streak, weekly goal and technique usage
    Stats,
    /// show or change settings
    Settings {
        #[clap(subcommand)]
        action: Option<SettingsAction>,
    },
    /// write all sessions as CSV
    Export {
        /// output file (default: stdout)
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EntityAction {
    /// add a new entry
    Add { name: String },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// change one setting; values below 1 become 1
    Set { key: SettingKey, value: u32 },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_store(path: PathBuf) -> Result<SqliteStore, Box<dyn Error>> {
    match SqliteStore::open(&path) {
        Ok(store) => Ok(store),
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "cannot open database, changes will not be saved"
            );
            Ok(SqliteStore::open_in_memory()?)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = AppDirs::resolve_db_path(cli.db);
    let mut tracker = Tracker::open(open_store(path)?, Clock::System);

    let command = cli.command.unwrap_or(Command::Stats);
    let stdout = io::stdout();
    let stdin = io::stdin();
    match run(&mut tracker, command, &mut stdout.lock(), &mut stdin.lock()) {
        Err(e) if e.is::<TrackerError>() => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e).exit();
        }
        other => other,
    }
}

fn run<S, W, R>(
    tracker: &mut Tracker<S>,
    command: Command,
    out: &mut W,
    input: &mut R,
) -> Result<(), Box<dyn Error>>
where
    S: PracticeStore,
    W: Write,
    R: BufRead,
{
    match command {
        Command::Log {
            date,
            duration,
            techniques,
            songs,
            notes,
        } => {
            let mut draft = tracker.new_draft();
            if let Some(date) = date {
                draft.date = date;
            }
            draft.duration = duration;
            draft.techniques = techniques.into_iter().map(TechniqueId::new).collect();
            draft.songs = songs.into_iter().map(SongId::new).collect();
            draft.notes = notes;

            let outcome = tracker.create_session(&draft)?;
            writeln!(
                out,
                "Logged session {} ({} minutes on {}).",
                outcome.value.session_id,
                draft.duration,
                draft.date.trim()
            )?;
            write!(
                out,
                "{}",
                display::progress_report(tracker.entities(), &outcome.value.progress)
            )?;
            writeln!(out, "Current streak: {} days", tracker.current_streak())?;
        }
        Command::Delete { id, yes } => {
            let (date, duration) = {
                let session = tracker.request_delete(SessionId::new(id))?;
                (session.date, session.duration)
            };
            writeln!(
                out,
                "Delete the practice session from {date} ({duration} minutes)? \
                 This will reverse all progress made during this session."
            )?;
            if !yes {
                write!(out, "[y/N] ")?;
                out.flush()?;
                let mut answer = String::new();
                input.read_line(&mut answer)?;
                if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
                    tracker.cancel_delete();
                    writeln!(out, "Cancelled.")?;
                    return Ok(());
                }
            }
            let outcome = tracker.confirm_delete()?;
            writeln!(out, "Deleted session {id}.")?;
            write!(
                out,
                "{}",
                display::progress_report(tracker.entities(), &outcome.value.progress)
            )?;
        }
        Command::Sessions { recent } => {
            let list = if recent {
                tracker.recent_sessions()
            } else {
                tracker.sessions_newest_first()
            };
            write!(out, "{}", display::sessions(tracker.entities(), &list))?;
        }
        Command::Techniques { action } => match action {
            Some(EntityAction::Add { name }) => {
                let outcome = tracker.add_technique(&name)?;
                writeln!(out, "Added technique {}.", outcome.value)?;
            }
            None => write!(out, "{}", display::techniques(tracker.entities().techniques()))?,
        },
        Command::Songs { action } => match action {
            Some(EntityAction::Add { name }) => {
                let outcome = tracker.add_song(&name)?;
                writeln!(out, "Added song {}.", outcome.value)?;
            }
            None => write!(out, "{}", display::songs(tracker.entities().songs()))?,
        },
        Command::Stats => {
            write!(out, "{}", display::summary(&tracker.summary()))?;
            writeln!(out)?;
            if tracker.entities().sessions().is_empty() {
                writeln!(
                    out,
                    "No practice data available yet. Start logging your practice sessions!"
                )?;
            } else {
                write!(
                    out,
                    "{}",
                    display::weekly(
                        &tracker.weekly_progress(),
                        tracker.settings().goal_minutes_per_week
                    )
                )?;
                writeln!(out)?;
                writeln!(out, "Practice by technique")?;
                write!(out, "{}", display::usage(&tracker.technique_usage()))?;
            }
        }
        Command::Settings { action } => {
            if let Some(SettingsAction::Set { key, value }) = action {
                let outcome = tracker.update_setting(key, value);
                writeln!(out, "{key} set to {}.", outcome.value)?;
            }
            write!(out, "{}", display::settings(tracker.settings()))?;
        }
        Command::Export { output } => {
            let sessions = tracker.sessions_newest_first();
            match output {
                Some(path) => {
                    let file = File::create(&path)?;
                    export::write_sessions_csv(file, tracker.entities(), &sessions)?;
                    writeln!(
                        out,
                        "Exported {} sessions to {}.",
                        sessions.len(),
                        path.display()
                    )?;
                }
                None => export::write_sessions_csv(&mut *out, tracker.entities(), &sessions)?,
            }
        }
    }
    Ok(())
}
