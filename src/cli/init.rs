use std::{fs, path::Path};

use labbook::domain::{AdminSecret, Catalog, Config, PasswordScheme};
use tracing::instrument;

use super::{config_path, terminal::Colorize, STATE_DIR};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// How booking passwords are stored
    #[arg(long, value_enum, default_value_t = Scheme::Plain)]
    scheme: Scheme,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Scheme {
    /// Store passwords as typed
    Plain,
    /// Store a salted SHA-256 digest of each password
    SaltedSha256,
}

impl From<Scheme> for PasswordScheme {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Plain => Self::Plain,
            Scheme::SaltedSha256 => Self::SaltedSha256,
        }
    }
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let state_dir = root.join(STATE_DIR);
        if state_dir.exists() {
            anyhow::bail!(
                "Booking directory already initialized (found existing {STATE_DIR} directory)"
            );
        }

        fs::create_dir_all(&state_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create {STATE_DIR} directory: {e}"))?;

        let secret = AdminSecret::generate();
        let config = Config::new(Catalog::default(), secret.clone())
            .with_password_scheme(self.scheme.into());
        config
            .save(&config_path(root))
            .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

        println!("Initialized booking directory in {}", root.display());
        println!("  Created: {STATE_DIR}/config.toml");
        println!();
        println!("Administrator secret: {}", secret.expose().warning());
        println!(
            "{}",
            "Keep it private. It cancels any booking and resets the schedule.".dim()
        );
        println!();
        println!("Next steps:");
        println!("  labbook book \"PC 01\" Seg Manhã");

        Ok(())
    }
}
