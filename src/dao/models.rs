use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::Seat;

/// Persisted snapshot of one room's authoritative game state.
///
/// This is a plain snapshot overwrite keyed by room id, not an append-only
/// ledger; every accepted mutation replaces the previous document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// The four seats, one entry per seat.
    pub players: Vec<PlayerEntity>,
    /// Round wind, hand number, and honba.
    pub round: RoundEntity,
    /// Riichi stakes on the table, carried pot included.
    pub riichi_stakes: Vec<RiichiStakeEntity>,
    /// Dora indicator tiles as entered by the operator.
    pub dora_indicators: Vec<String>,
    /// Optional scoreboard title.
    pub match_title: Option<String>,
    /// Labelled per-seat score changes from the latest mutation.
    pub last_diffs: IndexMap<Seat, Vec<ScoreDiffEntity>>,
    /// When the latest diff was produced.
    pub last_diff_at: Option<SystemTime>,
    /// Whether the match is running.
    pub is_active: bool,
    /// Last time this snapshot was written.
    pub updated_at: SystemTime,
}

/// Persisted representation of one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Fixed table position.
    pub seat: Seat,
    /// Name shown on overlays.
    pub display_name: String,
    /// Settled score.
    pub score: i32,
    /// Whether the seat has declared riichi in the current hand.
    pub is_riichi: bool,
}

/// Persisted round marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Round wind.
    pub wind: Seat,
    /// Hand number within the wind, 1 through 4.
    pub round_number: u8,
    /// Honba repeat counter.
    pub honba: u32,
}

/// Persisted riichi stake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiichiStakeEntity {
    /// Seat that declared the riichi.
    pub owner: Seat,
    /// Whether the declaration was committed.
    pub confirmed: bool,
    /// Whether the 1000 points were already collected by a draw settlement.
    pub deposited: bool,
}

/// Persisted component of a seat's score change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreDiffEntity {
    /// Signed point change.
    pub value: i32,
    /// Optional human-readable origin label.
    pub label: Option<String>,
}
