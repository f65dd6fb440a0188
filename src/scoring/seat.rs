use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the four fixed table positions, also reused as a round wind.
///
/// Ordering is the cyclic seating order East → South → West → North → East.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    /// East seat (the starting dealer).
    East,
    /// South seat.
    South,
    /// West seat.
    West,
    /// North seat.
    North,
}

impl Seat {
    /// All seats in cyclic order, starting from East.
    pub const ALL: [Seat; 4] = [Seat::East, Seat::South, Seat::West, Seat::North];

    /// Position of this seat in the cycle (East = 0).
    pub fn index(self) -> usize {
        match self {
            Seat::East => 0,
            Seat::South => 1,
            Seat::West => 2,
            Seat::North => 3,
        }
    }

    /// Seat at the given cyclic offset from East (wraps modulo 4).
    pub fn at(index: usize) -> Seat {
        Self::ALL[index % 4]
    }

    /// Next seat in turn order.
    pub fn next(self) -> Seat {
        Seat::at(self.index() + 1)
    }

    /// Previous seat in turn order.
    pub fn prev(self) -> Seat {
        Seat::at(self.index() + 3)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Seat::East => "east",
            Seat::South => "south",
            Seat::West => "west",
            Seat::North => "north",
        };
        f.write_str(label)
    }
}
