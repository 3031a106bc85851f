use std::path::Path;

use labbook::{engine::Error, Outcome};
use tracing::instrument;

use super::{open_engine, prompt_password, report, resolve_slot, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The equipment name (case-insensitive)
    equipment: String,

    /// The day (case-insensitive)
    day: String,

    /// The shift (case-insensitive)
    shift: String,

    /// The booking's password or the administrator secret (prompted for if
    /// omitted)
    #[arg(long)]
    password: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self), fields(equipment = %self.equipment, day = %self.day, shift = %self.shift))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut engine = open_engine(root)?;
        let slot = resolve_slot(&engine, &self.equipment, &self.day, &self.shift)?;

        let Some(booking) = engine.inspect(&slot).booking() else {
            return Err(Error::NotFound(slot).into());
        };
        println!(
            "\"{}\" on {}, {} shift is booked by {}.",
            slot.equipment(),
            slot.day(),
            slot.shift(),
            booking.student_name()
        );

        let password = match self.password {
            Some(password) => password,
            None => prompt_password("Password")?,
        };

        if let Outcome::Unbooked { by_admin: true, .. } = report(engine.unbook(&slot, &password))? {
            println!("{}", "Cancelled with the administrator secret.".dim());
        }
        Ok(())
    }
}
