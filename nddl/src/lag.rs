use std::fmt;

use psp_max_parser::structs::PspMaxSuccessor;

/// A successor distance, read once by its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLag {
    /// The successor starts at least this long after the owner.
    Min(u64),
    /// The owner starts at most this long after the successor.
    Max(u64),
}

impl TimeLag {
    pub fn from_distance(distance: i64) -> Self {
        if distance >= 0 {
            TimeLag::Min(distance.unsigned_abs())
        } else {
            TimeLag::Max(distance.unsigned_abs())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    NegInf,
    Finite(u64),
    PosInf,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => f.write_str("-inf"),
            Bound::Finite(value) => write!(f, "{value}"),
            Bound::PosInf => f.write_str("+inf"),
        }
    }
}

/// `to.start - from.start` restricted to `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalDistance {
    pub from: usize,
    pub to: usize,
    pub lower: Bound,
    pub upper: Bound,
}

impl TemporalDistance {
    pub fn from_edge(owner: usize, successor: &PspMaxSuccessor) -> Self {
        match TimeLag::from_distance(successor.distance) {
            TimeLag::Min(lag) => Self {
                from: owner,
                to: successor.activity,
                lower: Bound::Finite(lag),
                upper: Bound::PosInf,
            },
            // maximum lags are emitted against the reversed edge
            TimeLag::Max(lag) => Self {
                from: successor.activity,
                to: owner,
                lower: Bound::NegInf,
                upper: Bound::Finite(lag),
            },
        }
    }
}

impl fmt::Display for TemporalDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temporalDistance( activity{}.start, [ {} {} ], activity{}.start );",
            self.from, self.lower, self.upper, self.to
        )
    }
}
