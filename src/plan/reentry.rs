//! Reentry point identifiers.
//!
//! A reentry point names a waypoint so that an interrupted mission can be
//! resumed from it. In the planner it is a plain struct; the packed `u64`
//! form exists only for storage and transmission.
//!
//! Packed layout (bit 0 = least significant):
//!
//! | Bits  | Field      |
//! |-------|------------|
//! | 0-19  | ordinal    |
//! | 20-39 | line_id    |
//! | 40-55 | cell_no    |
//! | 56    | rot90      |
//! | 57    | forward    |
//! | 58    | refinement |
//! | 59    | landing    |

use std::fmt;

use crate::error::{PlanError, Result};

const ORDINAL_BITS: u32 = 20;
const LINE_BITS: u32 = 20;
const CELL_BITS: u32 = 16;

const LINE_SHIFT: u32 = ORDINAL_BITS;
const CELL_SHIFT: u32 = LINE_SHIFT + LINE_BITS;
const ROT90_BIT: u32 = CELL_SHIFT + CELL_BITS;
const FORWARD_BIT: u32 = ROT90_BIT + 1;
const REFINEMENT_BIT: u32 = ROT90_BIT + 2;
const LANDING_BIT: u32 = ROT90_BIT + 3;

/// Identifier of a resumable waypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ReentryPointId {
    /// Part of the landing approach
    pub landing: bool,
    /// Produced by terrain refinement rather than a line corner
    pub refinement: bool,
    /// Line flown forward
    pub forward: bool,
    /// Line on the rotated scan axis
    pub rot90: bool,
    /// Flight line
    pub line_id: u32,
    /// Survey cell
    pub cell_no: u32,
    /// Position within the line; 0 = transition waypoint
    pub ordinal: u32,
}

impl ReentryPointId {
    /// Pack into the storage layout.
    pub fn pack(&self) -> Result<u64> {
        let ordinal = checked("ordinal", self.ordinal, ORDINAL_BITS)?;
        let line = checked("line_id", self.line_id, LINE_BITS)?;
        let cell = checked("cell_no", self.cell_no, CELL_BITS)?;

        Ok(ordinal
            | line << LINE_SHIFT
            | cell << CELL_SHIFT
            | (self.rot90 as u64) << ROT90_BIT
            | (self.forward as u64) << FORWARD_BIT
            | (self.refinement as u64) << REFINEMENT_BIT
            | (self.landing as u64) << LANDING_BIT)
    }

    /// Decode a packed identifier. Bits above the layout are ignored.
    pub fn unpack(raw: u64) -> Self {
        let field = |shift: u32, bits: u32| ((raw >> shift) & mask(bits)) as u32;
        let flag = |bit: u32| raw & (1 << bit) != 0;
        Self {
            landing: flag(LANDING_BIT),
            refinement: flag(REFINEMENT_BIT),
            forward: flag(FORWARD_BIT),
            rot90: flag(ROT90_BIT),
            line_id: field(LINE_SHIFT, LINE_BITS),
            cell_no: field(CELL_SHIFT, CELL_BITS),
            ordinal: field(0, ORDINAL_BITS),
        }
    }

    /// Same point with another ordinal
    pub fn with_ordinal(&self, ordinal: u32) -> Self {
        Self { ordinal, ..*self }
    }

    /// True for the altitude transition ahead of a line
    pub fn is_transition(&self) -> bool {
        self.ordinal == 0
    }
}

impl fmt::Display for ReentryPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell {} line {}{} #{}",
            self.cell_no,
            self.line_id,
            if self.forward { "+" } else { "-" },
            self.ordinal
        )
    }
}

#[inline]
fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

fn checked(field: &'static str, value: u32, bits: u32) -> Result<u64> {
    let value = u64::from(value);
    if value > mask(bits) {
        return Err(PlanError::ReentryFieldOverflow { field, value, bits });
    }
    Ok(value)
}
