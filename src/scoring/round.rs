//! Round, wind, and honba state machine.

use serde::{Deserialize, Serialize};

use crate::scoring::seat::Seat;

/// Current round marker: round wind, hand number within the wind, and the
/// honba repeat counter.
///
/// The dealer seat is always derived from the hand number and never stored,
/// so the two can not drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMarker {
    /// Round wind, cycling East → South → West → North indefinitely.
    pub wind: Seat,
    /// Hand number within the wind, 1 through 4.
    pub round_number: u8,
    /// Repeat counter adding a flat bonus to the next winner.
    pub honba: u32,
}

impl RoundMarker {
    /// East-1, honba 0: the start of a match.
    pub fn east_start() -> Self {
        Self {
            wind: Seat::East,
            round_number: 1,
            honba: 0,
        }
    }

    /// Seat currently dealing, derived from the hand number.
    pub fn dealer(&self) -> Seat {
        Seat::at(usize::from(self.round_number) - 1)
    }

    /// Apply a hand won by `dealer_won`. A dealer win repeats the hand with
    /// one more honba; any other win resets honba and rotates the deal.
    pub fn on_win(&mut self, dealer_won: bool) {
        if dealer_won {
            self.honba += 1;
        } else {
            self.honba = 0;
            self.rotate();
        }
    }

    /// Apply an exhaustive draw. Honba always increments; the deal repeats
    /// only when the dealer was tenpai.
    pub fn on_draw(&mut self, dealer_tenpai: bool) {
        self.honba += 1;
        if !dealer_tenpai {
            self.rotate();
        }
    }

    /// Manual operator navigation: move to the next hand with honba cleared.
    pub fn advance(&mut self) {
        self.honba = 0;
        self.rotate();
    }

    /// Manual operator navigation: step back one hand. East-1 is the floor:
    /// with the wind already on East there is nothing earlier to return to,
    /// so the marker stays put. Honba is left untouched either way.
    pub fn retreat(&mut self) {
        if self.round_number == 1 {
            if self.wind != Seat::East {
                self.round_number = 4;
                self.wind = self.wind.prev();
            }
        } else {
            self.round_number -= 1;
        }
    }

    fn rotate(&mut self) {
        if self.round_number == 4 {
            self.round_number = 1;
            self.wind = self.wind.next();
        } else {
            self.round_number += 1;
        }
    }
}
