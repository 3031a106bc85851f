use std::path::Path;

use labbook::{Engine, SlotId, SlotState};
use tracing::instrument;

use super::{open_engine, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The equipment name (case-insensitive)
    equipment: String,

    /// The day (case-insensitive)
    day: String,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let engine = open_engine(root)?;
        for line in self.lines(&engine)? {
            println!("{line}");
        }
        Ok(())
    }

    fn lines<P, A>(&self, engine: &Engine<P, A>) -> anyhow::Result<Vec<String>> {
        let catalog = engine.config().catalog();
        let equipment = catalog.resolve_equipment(&self.equipment)?;
        let day = catalog.resolve_day(&self.day)?;
        let width = catalog
            .shifts()
            .map(|s| s.as_str().chars().count())
            .max()
            .unwrap_or_default();

        let mut lines = vec![format!("{equipment} · {day}")];
        for shift in catalog.shifts() {
            let slot = SlotId::new(equipment.clone(), day.clone(), shift.clone());
            let status = match engine.inspect(&slot) {
                SlotState::Free => "Free".success(),
                SlotState::Booked(booking) => {
                    format!("Booked by {}", booking.student_name()).taken()
                }
            };
            lines.push(format!("  {:<width$}  {status}", shift.as_str()));
        }
        Ok(lines)
    }
}
