//! Parallel scan lines covering a polygon.

use log::debug;

use crate::core::{LocalVector3, Polygon};
use crate::error::Result;
use crate::geometry::{PolygonSplitter, SplitAxis};

use super::flight_line::FlightLine;

/// Lines shorter than this are dropped (meters)
const MIN_LINE_LENGTH: f64 = 1e-6;

/// Scan lines over `area`, `spacing` apart, all flown forward.
///
/// Lines sit at `min + spacing/2 + k * spacing` across the scan axis. A
/// concave area can yield several lines at the same offset; they are
/// emitted in along-track order. Line ids start at `first_line_id`.
pub fn scan_lines(area: &Polygon, spacing: f64, rot90: bool, first_line_id: u32) -> Result<Vec<FlightLine>> {
    let mut lines = Vec::new();
    let Some((min, max)) = area.bounds() else {
        return Ok(lines);
    };
    if spacing <= 0.0 || area.len() < 3 {
        return Ok(lines);
    }

    // Cut lines perpendicular to the stacking direction
    let (axis, lo, hi) = if rot90 {
        (SplitAxis::Y, min.y, max.y)
    } else {
        (SplitAxis::X, min.x, max.x)
    };
    let splitter = PolygonSplitter::new(axis);

    let mut line_id = first_line_id;
    let mut offset = lo + spacing * 0.5;
    while offset < hi {
        let crossings = splitter.cut_crossings(area, offset);
        for pair in crossings.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            if b - a < MIN_LINE_LENGTH {
                continue;
            }
            let (start, end) = if rot90 {
                (LocalVector3::new(a, offset, 0.0), LocalVector3::new(b, offset, 0.0))
            } else {
                (LocalVector3::new(offset, a, 0.0), LocalVector3::new(offset, b, 0.0))
            };
            lines.push(FlightLine::new(line_id, vec![start, end], offset, rot90)?);
            line_id += 1;
        }
        offset += spacing;
    }

    debug!(
        "[Coverage] {} lines at {:.1} m spacing (rot90={})",
        lines.len(),
        spacing,
        rot90
    );
    Ok(lines)
}
