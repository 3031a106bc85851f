use std::path::{Path, PathBuf};

mod book;
mod init;
mod list;
mod reset;
mod schedule;
mod show;
mod slots;
mod terminal;
mod unbook;

use anyhow::Context;
use clap::ArgAction;
use labbook::{
    domain::{AdminSecret, Config},
    engine, Engine, JsonFile, Outcome, SlotId,
};
use terminal::Colorize;

/// Directory under the root that holds the configuration and, by default,
/// the bookings file.
const STATE_DIR: &str = ".labbook";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides the configured administrator secret.
const ADMIN_SECRET_ENV: &str = "LABBOOK_ADMIN_SECRET";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the booking directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Schedule(schedule::Command::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create a new booking directory with a fresh administrator secret
    Init(init::Command),

    /// Show the weekly overview of every slot (default)
    Schedule(schedule::Command),

    /// Show the shifts of one piece of equipment on one day
    Slots(slots::Command),

    /// Show who holds a single slot
    Show(show::Command),

    /// Book a free slot
    Book(book::Command),

    /// Cancel a booking with its password or the administrator secret
    Unbook(unbook::Command),

    /// Cancel every booking (administrator only)
    Reset(reset::Command),

    /// List all bookings
    List(list::Command),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(&root)?,
            Self::Schedule(command) => command.run(&root)?,
            Self::Slots(command) => command.run(&root)?,
            Self::Show(command) => command.run(&root)?,
            Self::Book(command) => command.run(&root)?,
            Self::Unbook(command) => command.run(&root)?,
            Self::Reset(command) => command.run(&root)?,
            Self::List(command) => command.run(&root)?,
        }
        Ok(())
    }
}

fn config_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(CONFIG_FILE)
}

/// Loads the configuration, applying the environment override for the
/// administrator secret.
fn load_config(root: &Path) -> anyhow::Result<Config> {
    let path = config_path(root);
    let config = Config::load(&path).with_context(|| {
        format!(
            "failed to load {} (run 'labbook init' first)",
            path.display()
        )
    })?;

    with_env_secret(config, std::env::var(ADMIN_SECRET_ENV).ok())
}

/// Replaces the configured administrator secret with the value of
/// [`ADMIN_SECRET_ENV`], if it is set.
fn with_env_secret(config: Config, secret: Option<String>) -> anyhow::Result<Config> {
    let Some(secret) = secret else {
        return Ok(config);
    };
    tracing::debug!("administrator secret overridden by {ADMIN_SECRET_ENV}");
    let secret =
        AdminSecret::new(secret).with_context(|| format!("invalid {ADMIN_SECRET_ENV}"))?;
    Ok(config.with_admin_secret(secret))
}

/// Opens the engine over the configured JSON file.
///
/// A relative bookings path is resolved against the state directory. If the
/// file cannot be read the engine starts empty and a warning is printed.
fn open_engine(root: &Path) -> anyhow::Result<Engine<JsonFile>> {
    let config = load_config(root)?;
    let bookings = root.join(STATE_DIR).join(config.bookings_file());
    tracing::debug!("using bookings file {}", bookings.display());

    let engine = Engine::open(config, JsonFile::new(bookings));
    if let Some(warning) = engine.load_warning() {
        eprintln!(
            "{}",
            format!("⚠️  Could not load bookings, showing an empty schedule: {warning}").warning()
        );
    }
    Ok(engine)
}

/// Finds a slot by its labels, ignoring case.
fn resolve_slot(
    engine: &Engine<JsonFile>,
    equipment: &str,
    day: &str,
    shift: &str,
) -> anyhow::Result<SlotId> {
    Ok(engine
        .config()
        .catalog()
        .resolve(equipment, day, shift)?)
}

/// Prints the success message of an engine operation, or turns its error
/// into the command's error.
fn report(result: Result<Outcome, engine::Error>) -> anyhow::Result<Outcome> {
    let outcome = result?;
    println!("{}", outcome.to_string().success());
    Ok(outcome)
}

fn prompt_text(prompt: &str) -> anyhow::Result<String> {
    Ok(dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?)
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    Ok(dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use labbook::domain::Catalog;
    use tempfile::TempDir;

    use super::*;

    pub const ADMIN: &str = "test-admin";

    /// Creates a booking directory with the default catalog and a known
    /// administrator secret.
    pub fn setup() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let root = tmp.path().to_path_buf();
        std::fs::create_dir_all(root.join(STATE_DIR)).unwrap();
        Config::new(
            Catalog::default(),
            AdminSecret::new(ADMIN.to_string()).unwrap(),
        )
        .save(&config_path(&root))
        .unwrap();
        (tmp, root)
    }

    #[test]
    fn open_engine_requires_init() {
        let tmp = TempDir::new().unwrap();
        let err = open_engine(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("labbook init"));
    }

    #[test]
    fn open_engine_puts_bookings_in_state_dir() {
        let (_tmp, root) = setup();
        let engine = open_engine(&root).unwrap();
        assert_eq!(
            engine.store().backend().path(),
            root.join(STATE_DIR).join("bookings.json")
        );
        assert!(engine.load_warning().is_none());
    }

    #[test]
    fn env_secret_replaces_configured_secret() {
        let (_tmp, root) = setup();
        let config = Config::load(&config_path(&root)).unwrap();

        let config = with_env_secret(config, Some("from-env".to_string())).unwrap();

        assert!(config.admin_secret().matches("from-env"));
        assert!(!config.admin_secret().matches(ADMIN));
    }

    #[test]
    fn padded_env_secret_is_rejected() {
        let (_tmp, root) = setup();
        let config = Config::load(&config_path(&root)).unwrap();

        let err = with_env_secret(config, Some(" from-env ".to_string())).unwrap_err();

        assert_eq!(err.to_string(), format!("invalid {ADMIN_SECRET_ENV}"));
    }

    #[test]
    fn unset_env_secret_keeps_config() {
        let (_tmp, root) = setup();
        let config = Config::load(&config_path(&root)).unwrap();

        assert_eq!(with_env_secret(config.clone(), None).unwrap(), config);
    }

    #[test]
    fn open_engine_honours_configured_bookings_file() {
        let (_tmp, root) = setup();
        let path = config_path(&root);
        Config::load(&path)
            .unwrap()
            .with_bookings_file(PathBuf::from("data/bookings.json"))
            .save(&path)
            .unwrap();

        let mut engine = open_engine(&root).unwrap();
        let slot = engine.slot("PC 01", "Seg", "Manhã").unwrap();
        engine.book(&slot, "Ana Silva", "1234").unwrap();

        let file = root.join(STATE_DIR).join("data").join("bookings.json");
        assert_eq!(engine.store().backend().path(), file);
        assert!(file.exists());
    }

    #[test]
    fn resolve_slot_is_case_insensitive() {
        let (_tmp, root) = setup();
        let engine = open_engine(&root).unwrap();
        let slot = resolve_slot(&engine, "silva (s)", "seg", "MANHÃ").unwrap();
        assert_eq!(slot.to_string(), "Silva (S)-Seg-Manhã");
    }
}
