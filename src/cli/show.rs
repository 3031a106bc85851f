use std::path::Path;

use labbook::{Engine, SlotId, SlotState};
use tracing::instrument;

use super::{open_engine, resolve_slot};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The equipment name (case-insensitive)
    equipment: String,

    /// The day (case-insensitive)
    day: String,

    /// The shift (case-insensitive)
    shift: String,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let engine = open_engine(root)?;
        let slot = resolve_slot(&engine, &self.equipment, &self.day, &self.shift)?;
        println!("{}", describe(&engine, &slot));
        Ok(())
    }
}

/// A sentence describing who holds the slot.
pub fn describe<P, A>(engine: &Engine<P, A>, slot: &SlotId) -> String {
    let (equipment, day, shift) = (slot.equipment(), slot.day(), slot.shift());
    match engine.inspect(slot) {
        SlotState::Booked(booking) => format!(
            "\"{equipment}\" is booked by {} on {day}, {shift} shift.",
            booking.student_name()
        ),
        SlotState::Free => format!(
            "\"{equipment}\" is free on {day}, {shift} shift. Use 'labbook book' to reserve it."
        ),
    }
}
