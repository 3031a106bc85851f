use std::path::Path;

use clap::Parser;
use labbook::Engine;
use tracing::instrument;

use super::{open_engine, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Command {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let engine = open_engine(root)?;
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&engine))?),
            OutputFormat::Table => {
                let rows = table(&engine);
                if rows.is_empty() {
                    println!("{}", "No bookings yet.".dim());
                }
                for row in rows {
                    println!("{row}");
                }
            }
        }
        Ok(())
    }
}

/// Bookings in catalog order. Passwords are never included.
fn to_json<P, A>(engine: &Engine<P, A>) -> serde_json::Value {
    use serde_json::json;

    let bookings: Vec<_> = engine
        .bookings()
        .map(|(slot, booking)| {
            json!({
                "equipment": slot.equipment().as_str(),
                "day": slot.day().as_str(),
                "shift": slot.shift().as_str(),
                "studentName": booking.student_name(),
            })
        })
        .collect();

    json!(bookings)
}

fn table<P, A>(engine: &Engine<P, A>) -> Vec<String> {
    let rows: Vec<_> = engine.bookings().collect();
    let width = rows
        .iter()
        .map(|(slot, _)| slot.equipment().as_str().chars().count())
        .max()
        .unwrap_or_default();

    rows.into_iter()
        .map(|(slot, booking)| {
            format!(
                "{:<width$}  {:<4} {:<6} {}",
                slot.equipment().as_str(),
                slot.day().as_str(),
                slot.shift().as_str(),
                booking.student_name()
            )
        })
        .collect()
}
