use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use swipe_stats::{
    app_dirs::AppDirs,
    config::{Backend, Config, ConfigStore, FileConfigStore},
    event_log::WordEvent,
    import,
    sessionizer::Sessionizer,
    store::StateStore,
    summary::Summary,
    LoadOutcome, StatsEngine,
};

/// sessionized swipe-typing telemetry
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Records swiped words, splits them into sessions by inactivity, and keeps rolling cpm, wpm, swipe duration and inter-word timing per session and across all history."
)]
pub struct Cli {
    /// keyboard profile whose stats to use
    #[clap(short = 'p', long)]
    profile: Option<String>,

    /// inactivity gap in milliseconds that starts a new session
    #[clap(short = 'g', long)]
    gap_threshold: Option<i64>,

    /// storage backend for the stats record
    #[clap(short = 'b', long, value_enum)]
    backend: Option<Backend>,

    /// directory holding stats records (default: ~/.local/state/swipe-stats)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// config file to read (default: platform config dir)
    #[clap(long)]
    config: Option<PathBuf>,

    /// log debug output to stderr
    #[clap(short = 'v', long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// record one swiped word
    Record {
        text: String,
        start_ms: i64,
        end_ms: i64,
    },
    /// print the aggregate stats
    Show {
        /// also list every session
        #[clap(long)]
        sessions: bool,
    },
    /// append words from a csv file (text,start_time,end_time)
    Import { path: PathBuf },
    /// write every recorded word to a csv file
    Export { path: PathBuf },
    /// clear all recorded words and sessions
    Wipe,
    /// recompute every session and global average
    Recompute,
    /// print the effective config
    Config {
        /// persist the effective config (including flag overrides)
        #[clap(long)]
        save: bool,
    },
}

impl Cli {
    /// Persisted config with command-line overrides applied
    fn effective_config(&self, stored: Config) -> Config {
        Config {
            gap_threshold_ms: self.gap_threshold.unwrap_or(stored.gap_threshold_ms),
            profile: self.profile.clone().unwrap_or(stored.profile),
            backend: self.backend.unwrap_or(stored.backend),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(AppDirs::state_dir)
            .unwrap_or_else(|| PathBuf::from("swipe-stats"))
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("swipe_stats={level}"))),
        )
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> swipe_stats::Result<()> {
    let config_store = cli.config_store();
    let config = cli.effective_config(config_store.load());

    if let Command::Config { save } = &cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if *save {
            config_store.save(&config)?;
            println!("saved to {}", config_store.path().display());
        }
        return Ok(());
    }

    let store = AppDirs::open_store(config.backend, &cli.state_dir())?;
    let mut engine = StatsEngine::from_config(&config);
    if engine.load(store.as_ref())? == LoadOutcome::Discarded {
        eprintln!("warning: stored stats for '{}' were unreadable, starting fresh", config.profile);
    }

    // Loaded sessions reflect whatever threshold was active when they were
    // built; a different configured threshold re-partitions them. Only the
    // mutating commands write the re-partitioned state back.
    if stored_threshold_differs(&engine, &config) {
        engine.set_gap_threshold(config.gap_threshold_ms);
    }

    match &cli.command {
        Command::Record {
            text,
            start_ms,
            end_ms,
        } => {
            let event = WordEvent::new(text.clone(), *start_ms, *end_ms);
            event.validate()?;
            if let Some(previous) = engine.event_log().last() {
                event.validate_after(previous)?;
            }
            let index = engine.record_word(event.text, event.start_time, event.end_time);
            save(&engine, store.as_ref())?;
            println!("recorded '{}' as word #{}", text, index + 1);
        }
        Command::Show { sessions } => {
            println!("{}", Summary::of(&engine));
            if *sessions {
                print_sessions(&engine);
            }
        }
        Command::Import { path } => {
            let events = import::read_events_from_path(path)?;
            let count = engine.import_events(events)?;
            save(&engine, store.as_ref())?;
            println!("imported {count} words");
        }
        Command::Export { path } => {
            import::write_events_to_path(path, engine.event_log())?;
            println!("exported {} words to {}", engine.event_log().len(), path.display());
        }
        Command::Wipe => {
            engine.wipe();
            save(&engine, store.as_ref())?;
            println!("wiped stats for '{}'", engine.profile());
        }
        Command::Recompute => {
            engine.recompute_all();
            save(&engine, store.as_ref())?;
            println!("recomputed {} sessions", engine.sessions().len());
        }
        Command::Config { .. } => unreachable!("handled before loading state"),
    }

    Ok(())
}

/// The persisted partition must match what the configured threshold would build.
fn stored_threshold_differs(engine: &StatsEngine, config: &Config) -> bool {
    let rebuilt = Sessionizer::new(config.gap_threshold_ms)
        .rebuild(engine.event_log());
    rebuilt.len() != engine.sessions().len()
        || rebuilt
            .iter()
            .zip(engine.sessions())
            .any(|(a, b)| a.range() != b.range())
}

fn save(engine: &StatsEngine, store: &dyn StateStore) -> swipe_stats::Result<()> {
    engine.save(store).map_err(|e| {
        eprintln!("stats not saved; this command's changes were not persisted");
        e
    })
}

fn print_sessions(engine: &StatsEngine) {
    println!();
    println!(
        "{:>4}  {:>11}  {:>8}  {:>8}  {:>10}  {:>10}",
        "#", "words", "cpm", "wpm", "swipe ms", "between ms"
    );
    for (i, session) in engine.sessions().iter().enumerate() {
        println!(
            "{:>4}  {:>11}  {:>8.1}  {:>8.1}  {:>10.1}  {:>10.1}",
            i + 1,
            format!("{}..{}", session.start_index, session.end_index),
            session.cpm_avg,
            session.wpm_avg,
            session.swipe_duration_avg,
            session.time_between_words_avg,
        );
    }
}
