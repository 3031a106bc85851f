use std::path::Path;

use labbook::Outcome;
use tracing::instrument;

use super::{open_engine, prompt_password, report, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The administrator secret (prompted for if omitted)
    #[arg(long)]
    password: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut engine = open_engine(root)?;
        let count = engine.bookings().count();

        if !self.yes {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!("Cancel all {count} booking(s)?"))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Reset aborted.".dim());
                return Ok(());
            }
        }

        let password = match self.password {
            Some(password) => password,
            None => prompt_password("Administrator password")?,
        };

        if let Outcome::Reset { cleared } = report(engine.reset(&password))? {
            println!("{}", format!("{cleared} booking(s) cancelled.").dim());
        }
        Ok(())
    }
}
