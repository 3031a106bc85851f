use std::{fmt, path::Path};

use labbook::{domain::Label, Engine, SlotId};
use tracing::instrument;

use super::{
    open_engine,
    terminal::{is_narrow, supports_color, Colorize},
};

const EQUIPMENT_HEADER: &str = "Equipment";
const FREE: &str = "Free";
const GAP: &str = "  ";

#[derive(Debug, Default, clap::Parser)]
pub struct Command {
    /// Only show this day
    #[arg(long)]
    day: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let engine = open_engine(root)?;
        let catalog = engine.config().catalog();

        let days: Vec<Label> = match &self.day {
            Some(day) => vec![catalog.resolve_day(day)?],
            None => catalog.days().cloned().collect(),
        };

        let color = supports_color();
        let layout = Layout::new(&engine);

        if is_narrow(layout.width(days.len())) {
            for day in &days {
                println!("{}", layout.grid(&engine, std::slice::from_ref(day), color));
            }
        } else {
            print!("{}", layout.grid(&engine, &days, color));
        }

        Ok(())
    }
}

/// Column widths for the overview grid.
struct Layout {
    name_width: usize,
    cell_width: usize,
    shifts: usize,
}

impl Layout {
    fn new<P, A>(engine: &Engine<P, A>) -> Self {
        let catalog = engine.config().catalog();
        let name_width = catalog
            .equipment()
            .map(|e| e.as_str().chars().count())
            .chain([EQUIPMENT_HEADER.len()])
            .max()
            .unwrap_or_default();
        let cell_width = engine
            .bookings()
            .map(|(_, booking)| booking.first_name().chars().count())
            .chain([FREE.len()])
            .max()
            .unwrap_or_default();
        Self {
            name_width,
            cell_width,
            shifts: catalog.shifts().count(),
        }
    }

    fn day_width(&self) -> usize {
        self.shifts * self.cell_width + (self.shifts - 1) * GAP.len()
    }

    fn width(&self, days: usize) -> usize {
        self.name_width + days * (GAP.len() + self.day_width())
    }

    const fn grid<'a, P, A>(
        &'a self,
        engine: &'a Engine<P, A>,
        days: &'a [Label],
        color: bool,
    ) -> Grid<'a, P, A> {
        Grid {
            layout: self,
            engine,
            days,
            color,
        }
    }

    fn cell(&self, holder: Option<&str>, color: bool) -> String {
        let padded = format!("{:<w$}", holder.unwrap_or(FREE), w = self.cell_width);
        match (color, holder) {
            (false, _) => padded,
            (true, None) => padded.success(),
            (true, Some(_)) => padded.taken(),
        }
    }
}

/// The overview grid for a set of days, rendered through [`fmt::Display`].
struct Grid<'a, P, A> {
    layout: &'a Layout,
    engine: &'a Engine<P, A>,
    days: &'a [Label],
    color: bool,
}

impl<P, A> fmt::Display for Grid<'_, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            layout,
            engine,
            days,
            color,
        } = self;
        let catalog = engine.config().catalog();

        // Header: day labels spanning their shifts, then shift abbreviations.
        write!(f, "{EQUIPMENT_HEADER:<w$}", w = layout.name_width)?;
        for day in *days {
            write!(f, "{GAP}{:^w$}", day.as_str(), w = layout.day_width())?;
        }
        writeln!(f)?;

        write!(f, "{:<w$}", "", w = layout.name_width)?;
        for _ in *days {
            for shift in catalog.shifts() {
                let short: String = shift.as_str().chars().take(3).collect();
                write!(f, "{GAP}{short:<w$}", w = layout.cell_width)?;
            }
        }
        writeln!(f)?;

        for equipment in catalog.equipment() {
            write!(f, "{:<w$}", equipment.as_str(), w = layout.name_width)?;
            for day in *days {
                for shift in catalog.shifts() {
                    let slot = SlotId::new(equipment.clone(), day.clone(), shift.clone());
                    let holder = engine.inspect(&slot).booking().map(|b| b.first_name());
                    write!(f, "{GAP}{}", layout.cell(holder, *color))?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
