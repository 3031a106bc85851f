use std::path::Path;

use tracing::instrument;

use super::{open_engine, prompt_password, prompt_text, report, resolve_slot};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The equipment name (case-insensitive)
    equipment: String,

    /// The day (case-insensitive)
    day: String,

    /// The shift (case-insensitive)
    shift: String,

    /// The student's full name (prompted for if omitted)
    #[arg(long)]
    name: Option<String>,

    /// A password needed later to cancel the booking (prompted for if
    /// omitted)
    #[arg(long)]
    password: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self), fields(equipment = %self.equipment, day = %self.day, shift = %self.shift))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut engine = open_engine(root)?;
        let slot = resolve_slot(&engine, &self.equipment, &self.day, &self.shift)?;

        // Fail before prompting if the slot is already taken.
        if let Some(booking) = engine.inspect(&slot).booking() {
            anyhow::bail!(
                "Slot '{slot}' is already booked by {}.",
                booking.student_name()
            );
        }

        println!(
            "Booking \"{}\" on {}, {} shift",
            slot.equipment(),
            slot.day(),
            slot.shift()
        );
        let name = match self.name {
            Some(name) => name,
            None => prompt_text("Full name")?,
        };
        let password = match self.password {
            Some(password) => password,
            None => prompt_password("Password (to cancel later)")?,
        };

        report(engine.book(&slot, &name, &password))?;
        Ok(())
    }
}
