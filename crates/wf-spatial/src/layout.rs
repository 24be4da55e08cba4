//! ASCII floor descriptions.
//!
//! A floor plan is one text line per grid row, one character per cell:
//!
//! ```text
//! C . . . S S
//! . R . . . .
//! P . . R . L
//! ```
//!
//! Whitespace between symbols is ignored, as are blank lines and lines
//! starting with `;`.  Symbols are listed in [`Occupant::symbol`].
//! Positions of each kind are reported in row-major order, which is the
//! order station and robot ids are assigned in by the fleet builder.

use wf_core::GridPos;

use crate::{GridMap, GridMapBuilder, Occupant, SpatialError, SpatialResult};

/// A parsed floor: the immutable map plus where everything is.
#[derive(Clone, Debug)]
pub struct FloorPlan {
    pub map:      GridMap,
    pub robots:   Vec<GridPos>,
    pub charging: Vec<GridPos>,
    pub packing:  Vec<GridPos>,
    pub loading:  Vec<GridPos>,
    pub shelves:  Vec<GridPos>,
}

impl FloorPlan {
    /// Parse an ASCII floor plan.
    pub fn parse(text: &str) -> SpatialResult<FloorPlan> {
        let rows: Vec<(usize, Vec<char>)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with(';'))
            .map(|(n, line)| (n, line.chars().filter(|c| !c.is_whitespace()).collect()))
            .collect();

        let Some((_, first)) = rows.first() else {
            return Err(SpatialError::EmptyPlan);
        };
        let width = first.len();

        let mut builder = GridMapBuilder::new(width as u32, rows.len() as u32);
        for (y, (line, symbols)) in rows.iter().enumerate() {
            if symbols.len() != width {
                return Err(SpatialError::RaggedRow {
                    line:     *line,
                    expected: width,
                    got:      symbols.len(),
                });
            }
            for (x, &symbol) in symbols.iter().enumerate() {
                let occupant = Occupant::from_symbol(symbol)
                    .ok_or(SpatialError::UnknownSymbol { line: *line, symbol })?;
                if occupant != Occupant::Empty {
                    builder.place(GridPos::new(x as i32, y as i32), occupant)?;
                }
            }
        }

        let map = builder.build();
        Ok(FloorPlan {
            robots:   map.positions_of(Occupant::Robot),
            charging: map.positions_of(Occupant::ChargingBay),
            packing:  map.positions_of(Occupant::PackingBay),
            loading:  map.positions_of(Occupant::LoadingBay),
            shelves:  map.positions_of(Occupant::Shelf),
            map,
        })
    }

    /// Render the map back to its ASCII form (one row per line, no spacing).
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.map.cell_count() + self.map.height() as usize);
        for cell in self.map.cells() {
            out.push(cell.occupant.symbol());
            if cell.pos.x as u32 == self.map.width() - 1 {
                out.push('\n');
            }
        }
        out
    }
}
