//! Exhaustive-draw (ryuukyoku) tenpai/noten payments.

use std::collections::BTreeSet;

use crate::scoring::seat::Seat;

/// A single directed point transfer between two seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Paying seat.
    pub from: Seat,
    /// Receiving seat.
    pub to: Seat,
    /// Amount moved, always positive.
    pub points: i32,
}

/// Compute the tenpai/noten transfers for an exhaustive draw.
///
/// The fixed penalty pool is 3000 points whenever both groups are non-empty:
/// one tenpai seat collects 1000 from each of three noten seats, two tenpai
/// seats collect 750 from each of two noten seats, three tenpai seats collect
/// 1000 from the sole noten seat. All-tenpai and all-noten hands move
/// nothing. The result is zero-sum by construction.
pub fn draw_transfers(tenpai: &BTreeSet<Seat>) -> Vec<Transfer> {
    let noten: Vec<Seat> = Seat::ALL
        .into_iter()
        .filter(|seat| !tenpai.contains(seat))
        .collect();

    let per_pair = match tenpai.len() {
        0 | 4 => return Vec::new(),
        1 | 3 => 1000,
        2 => 750,
        _ => unreachable!("at most four seats"),
    };

    let mut transfers = Vec::with_capacity(tenpai.len() * noten.len());
    for &from in &noten {
        for &to in tenpai {
            transfers.push(Transfer {
                from,
                to,
                points: per_pair,
            });
        }
    }
    transfers
}
