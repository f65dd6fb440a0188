use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, system_time_millis},
    scoring::{RiichiLedger, RiichiStake, RoundMarker, ScoreDiff, Seat},
    state::game::{GameState, Player},
};

/// Full game-state snapshot exchanged with overlay and control clients.
///
/// Broadcasts always carry this complete shape, never a delta; clients that
/// want deltas diff consecutive snapshots themselves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    /// The four seats in table order.
    pub players: Vec<PlayerDto>,
    /// Current round wind.
    pub round_wind: Seat,
    /// Hand number within the wind, 1 through 4.
    pub round_number: u8,
    /// Honba repeat counter.
    pub honba: u32,
    /// Number of riichi sticks on the table, always the stake-list length.
    pub riichi_sticks: usize,
    /// The stakes themselves, needed to settle ownership later.
    pub riichi_stakes: Vec<RiichiStakeDto>,
    /// Dora indicator tiles.
    pub dora_indicators: Vec<String>,
    /// Optional scoreboard title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_title: Option<String>,
    /// Labelled per-seat score changes from the latest mutation.
    pub last_score_diffs: IndexMap<Seat, Vec<ScoreDiffItemDto>>,
    /// Milliseconds since epoch of the latest diff.
    #[serde(default)]
    pub last_diff_timestamp: Option<u64>,
    /// Whether the match is running.
    pub is_active: bool,
    /// RFC 3339 timestamp of the last mutation. Informational only and
    /// ignored on inbound full-state overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One seat as shown on overlays.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Table position.
    pub seat: Seat,
    /// Display name.
    pub name: String,
    /// Settled score.
    pub score: i32,
    /// Score with pending riichi stakes subtracted, the value overlays
    /// render between declaration and settlement. Derived; ignored inbound.
    #[serde(default)]
    pub display_score: Option<i32>,
    /// Whether the seat has declared riichi this hand.
    pub is_riichi: bool,
}

/// One riichi stake on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiichiStakeDto {
    /// Declaring seat.
    pub seat: Seat,
    /// Whether the declaration was committed.
    pub confirmed: bool,
    /// Whether the stake already belongs to the carried pot. Must round-trip
    /// through full-state overrides or a carried stake would be charged twice.
    #[serde(default)]
    pub deposited: bool,
}

/// One labelled component of a seat's score change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreDiffItemDto {
    /// Signed point change.
    pub value: i32,
    /// Optional origin label such as "tenpai bonus" or "riichi stake".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Response for room creation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Freshly allocated 6-digit room code.
    pub game_id: String,
}

/// Snapshot response served on the durable read path.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    /// Room the snapshot belongs to.
    pub game_id: String,
    /// The snapshot, or `null` while the room has no state yet.
    pub state: Option<GameStateDto>,
}

/// Reason a full-state override was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateDtoError {
    /// A seat is missing from the player list.
    #[error("player list is missing seat {0}")]
    MissingSeat(Seat),
    /// A seat appears more than once in the player list.
    #[error("player list repeats seat {0}")]
    DuplicateSeat(Seat),
    /// The hand number is outside 1..=4.
    #[error("round number must be within 1..=4 (got {0})")]
    RoundNumberOutOfRange(u8),
}

impl From<&GameState> for GameStateDto {
    fn from(state: &GameState) -> Self {
        Self {
            players: state
                .players
                .iter()
                .map(|player| PlayerDto {
                    id: player.id,
                    seat: player.seat,
                    name: player.display_name.clone(),
                    score: player.score,
                    display_score: Some(state.display_score(player.seat)),
                    is_riichi: player.is_riichi,
                })
                .collect(),
            round_wind: state.round.wind,
            round_number: state.round.round_number,
            honba: state.round.honba,
            riichi_sticks: state.riichi.stick_count(),
            riichi_stakes: state
                .riichi
                .stakes()
                .iter()
                .map(|stake| RiichiStakeDto {
                    seat: stake.owner,
                    confirmed: stake.confirmed,
                    deposited: stake.deposited,
                })
                .collect(),
            dora_indicators: state.dora_indicators.clone(),
            match_title: state.match_title.clone(),
            last_score_diffs: state
                .last_diffs
                .iter()
                .map(|(seat, diffs)| {
                    (
                        *seat,
                        diffs
                            .iter()
                            .map(|diff| ScoreDiffItemDto {
                                value: diff.value,
                                label: diff.label.clone(),
                            })
                            .collect(),
                    )
                })
                .collect(),
            last_diff_timestamp: state.last_diff_at.map(system_time_millis),
            is_active: state.is_active,
            updated_at: Some(format_system_time(state.updated_at)),
        }
    }
}

impl TryFrom<GameStateDto> for GameState {
    type Error = StateDtoError;

    /// Validate and apply a full-state override. Derived fields
    /// (`riichiSticks`, `displayScore`, `updatedAt`) are recomputed rather
    /// than trusted.
    fn try_from(dto: GameStateDto) -> Result<Self, Self::Error> {
        if !(1..=4).contains(&dto.round_number) {
            return Err(StateDtoError::RoundNumberOutOfRange(dto.round_number));
        }

        let mut players: [Option<Player>; 4] = [None, None, None, None];
        for player in dto.players {
            let slot = &mut players[player.seat.index()];
            if slot.is_some() {
                return Err(StateDtoError::DuplicateSeat(player.seat));
            }
            *slot = Some(Player {
                id: player.id,
                seat: player.seat,
                display_name: player.name,
                score: player.score,
                is_riichi: player.is_riichi,
            });
        }
        let mut complete = Vec::with_capacity(4);
        for (index, slot) in players.into_iter().enumerate() {
            complete.push(slot.ok_or(StateDtoError::MissingSeat(Seat::at(index)))?);
        }
        let players: [Player; 4] = complete.try_into().expect("exactly four seats");

        let mut state = GameState::new_match();
        state.players = players;
        state.round = RoundMarker {
            wind: dto.round_wind,
            round_number: dto.round_number,
            honba: dto.honba,
        };
        state.riichi = RiichiLedger::from_stakes(
            dto.riichi_stakes
                .into_iter()
                .map(|stake| RiichiStake {
                    owner: stake.seat,
                    confirmed: stake.confirmed,
                    deposited: stake.deposited,
                })
                .collect(),
        );
        state.dora_indicators = dto.dora_indicators;
        state.match_title = dto.match_title;
        state.last_diffs = dto
            .last_score_diffs
            .into_iter()
            .map(|(seat, diffs)| {
                (
                    seat,
                    diffs
                        .into_iter()
                        .map(|diff| ScoreDiff {
                            value: diff.value,
                            label: diff.label,
                        })
                        .collect(),
                )
            })
            .collect();
        state.last_diff_at = None;
        state.is_active = dto.is_active;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_projects_pending_stakes() {
        let mut state = GameState::new_match();
        state.declare_riichi(Seat::East).unwrap();

        let dto = GameStateDto::from(&state);
        let east = &dto.players[0];
        assert_eq!(east.score, 25000);
        assert_eq!(east.display_score, Some(24000));
        assert_eq!(dto.riichi_sticks, 1);
    }

    #[test]
    fn override_round_trip_keeps_the_ledger() {
        let mut state = GameState::new_match();
        state.declare_riichi(Seat::South).unwrap();
        state.confirm_riichi(Seat::South).unwrap();

        let dto = GameStateDto::from(&state);
        let restored = GameState::try_from(dto).unwrap();
        assert_eq!(restored.riichi.stick_count(), 1);
        assert!(restored.riichi.stakes()[0].confirmed);
        assert_eq!(restored.player(Seat::South).score, 25000);
    }

    #[test]
    fn override_requires_all_four_seats() {
        let mut dto = GameStateDto::from(&GameState::new_match());
        dto.players.remove(3);
        assert_eq!(
            GameState::try_from(dto).unwrap_err(),
            StateDtoError::MissingSeat(Seat::North)
        );

        let mut dto = GameStateDto::from(&GameState::new_match());
        dto.players[1].seat = Seat::East;
        assert_eq!(
            GameState::try_from(dto).unwrap_err(),
            StateDtoError::DuplicateSeat(Seat::East)
        );
    }

    #[test]
    fn override_rejects_bad_round_number() {
        let mut dto = GameStateDto::from(&GameState::new_match());
        dto.round_number = 5;
        assert_eq!(
            GameState::try_from(dto).unwrap_err(),
            StateDtoError::RoundNumberOutOfRange(5)
        );
    }
}
