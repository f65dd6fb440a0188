use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{GameStateEntity, PlayerEntity, RiichiStakeEntity, RoundEntity, ScoreDiffEntity},
    scoring::{
        HandOutcome, LedgerError, RiichiLedger, RiichiStake, RoundMarker, ScoreDiff, Seat,
        SettlementError, settle,
    },
};

/// Score every seat starts a match with.
pub const STARTING_SCORE: i32 = 25_000;
/// Fixed total point pool for a four-player match.
pub const SCORE_POOL: i32 = 100_000;

/// One participant at the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Fixed table position.
    pub seat: Seat,
    /// Name shown on overlays.
    pub display_name: String,
    /// Settled score; provisional riichi deductions are a read-time
    /// projection, never written here.
    pub score: i32,
    /// Whether the seat has declared riichi in the current hand.
    pub is_riichi: bool,
}

/// Authoritative state of one match room.
///
/// Owned and mutated exclusively by the room that holds it; the scoring
/// engine only ever computes a proposed next state from an immutable view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// The four seats in cyclic order starting from East.
    pub players: [Player; 4],
    /// Round wind, hand number, and honba.
    pub round: RoundMarker,
    /// Riichi stakes on the table, carried pot included.
    pub riichi: RiichiLedger,
    /// Dora indicator tiles, operator-entered strings like `m5` or `p7`.
    pub dora_indicators: Vec<String>,
    /// Optional title shown above the scoreboard.
    pub match_title: Option<String>,
    /// Labelled per-seat score changes from the most recent mutation.
    pub last_diffs: IndexMap<Seat, Vec<ScoreDiff>>,
    /// When the last diff was produced.
    pub last_diff_at: Option<SystemTime>,
    /// Whether the match is running (cleared by a full-state override only).
    pub is_active: bool,
    /// Last mutation time, persisted for auditing.
    pub updated_at: SystemTime,
}

impl GameState {
    /// Fresh match state: 25000 points each, East-1, honba 0, no stakes.
    pub fn new_match() -> Self {
        let players = Seat::ALL.map(|seat| Player {
            id: Uuid::new_v4(),
            seat,
            display_name: format!("Player {}", seat.index() + 1),
            score: STARTING_SCORE,
            is_riichi: false,
        });
        Self {
            players,
            round: RoundMarker::east_start(),
            riichi: RiichiLedger::new(),
            dora_indicators: Vec::new(),
            match_title: None,
            last_diffs: IndexMap::new(),
            last_diff_at: None,
            is_active: true,
            updated_at: SystemTime::now(),
        }
    }

    /// Borrow the player at `seat`.
    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    fn player_mut(&mut self, seat: Seat) -> &mut Player {
        &mut self.players[seat.index()]
    }

    /// Score shown on overlays: the settled score minus 1000 for each of the
    /// seat's stakes that has not yet been collected by a settlement.
    pub fn display_score(&self, seat: Seat) -> i32 {
        self.player(seat).score - 1000 * self.riichi.pending_count(seat) as i32
    }

    /// Scores plus the carried riichi pot. Equals [`SCORE_POOL`] whenever the
    /// settlement engine was the only writer.
    pub fn pool_total(&self) -> i32 {
        let carried = self
            .riichi
            .stakes()
            .iter()
            .filter(|stake| stake.deposited)
            .count() as i32;
        self.players.iter().map(|p| p.score).sum::<i32>() + carried * 1000
    }

    /// Record a riichi declaration. No points move until settlement.
    pub fn declare_riichi(&mut self, seat: Seat) -> Result<(), LedgerError> {
        self.riichi.declare(seat)?;
        self.player_mut(seat).is_riichi = true;
        self.touch();
        Ok(())
    }

    /// Withdraw a declaration whose discard was not yet committed.
    pub fn cancel_riichi(&mut self, seat: Seat) -> Result<(), LedgerError> {
        self.riichi.cancel(seat)?;
        self.player_mut(seat).is_riichi = false;
        self.touch();
        Ok(())
    }

    /// Commit a declaration, making the stake irrevocable.
    pub fn confirm_riichi(&mut self, seat: Seat) -> Result<(), LedgerError> {
        self.riichi.confirm(seat)?;
        self.touch();
        Ok(())
    }

    /// Settle a hand outcome and move to the next hand.
    ///
    /// Applied atomically: on error the state is untouched. On success the
    /// scores, round marker, ledger, and diff log are replaced together, all
    /// riichi flags reset, and the dora indicators cleared for the new hand.
    pub fn apply_outcome(&mut self, outcome: &HandOutcome) -> Result<(), SettlementError> {
        let scores = self.players.each_ref().map(|p| p.score);
        let settlement = settle(scores, &self.round, &self.riichi, outcome)?;

        for player in &mut self.players {
            player.score = settlement.scores[player.seat.index()];
            player.is_riichi = false;
        }
        self.round = settlement.round;
        self.riichi = settlement.ledger;
        self.last_diffs = settlement.diffs;
        self.last_diff_at = Some(SystemTime::now());
        self.dora_indicators.clear();
        self.touch();
        Ok(())
    }

    /// Manual score override, bypassing settlement. The raw delta is logged
    /// as the seat's diff; no pool re-normalisation happens here.
    pub fn set_score(&mut self, seat: Seat, score: i32) {
        let delta = score - self.player(seat).score;
        self.player_mut(seat).score = score;
        self.last_diffs = IndexMap::from([(
            seat,
            vec![ScoreDiff {
                value: delta,
                label: None,
            }],
        )]);
        self.last_diff_at = Some(SystemTime::now());
        self.touch();
    }

    /// Replace the dora indicator tiles.
    pub fn set_dora(&mut self, tiles: Vec<String>) {
        self.dora_indicators = tiles;
        self.touch();
    }

    /// Rename the player at `seat`.
    pub fn set_player_name(&mut self, seat: Seat, name: String) {
        self.player_mut(seat).display_name = name;
        self.touch();
    }

    /// Set or clear the scoreboard title.
    pub fn set_match_title(&mut self, title: Option<String>) {
        self.match_title = title;
        self.touch();
    }

    /// Manual navigation to the next hand (honba cleared).
    pub fn advance_round(&mut self) {
        self.round.advance();
        self.touch();
    }

    /// Manual navigation back one hand.
    pub fn retreat_round(&mut self) {
        self.round.retreat();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

impl From<&GameState> for GameStateEntity {
    fn from(state: &GameState) -> Self {
        Self {
            players: state.players.iter().map(PlayerEntity::from).collect(),
            round: RoundEntity {
                wind: state.round.wind,
                round_number: state.round.round_number,
                honba: state.round.honba,
            },
            riichi_stakes: state
                .riichi
                .stakes()
                .iter()
                .map(|stake| RiichiStakeEntity {
                    owner: stake.owner,
                    confirmed: stake.confirmed,
                    deposited: stake.deposited,
                })
                .collect(),
            dora_indicators: state.dora_indicators.clone(),
            match_title: state.match_title.clone(),
            last_diffs: state
                .last_diffs
                .iter()
                .map(|(seat, diffs)| {
                    (
                        *seat,
                        diffs
                            .iter()
                            .map(|diff| ScoreDiffEntity {
                                value: diff.value,
                                label: diff.label.clone(),
                            })
                            .collect(),
                    )
                })
                .collect(),
            last_diff_at: state.last_diff_at,
            is_active: state.is_active,
            updated_at: state.updated_at,
        }
    }
}

impl From<&Player> for PlayerEntity {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            seat: player.seat,
            display_name: player.display_name.clone(),
            score: player.score,
            is_riichi: player.is_riichi,
        }
    }
}

impl From<GameStateEntity> for GameState {
    fn from(entity: GameStateEntity) -> Self {
        // Seed all four seats first so a truncated persisted player list can
        // never produce a table with holes.
        let mut players = Seat::ALL.map(|seat| Player {
            id: Uuid::new_v4(),
            seat,
            display_name: format!("Player {}", seat.index() + 1),
            score: STARTING_SCORE,
            is_riichi: false,
        });
        for persisted in entity.players {
            players[persisted.seat.index()] = Player {
                id: persisted.id,
                seat: persisted.seat,
                display_name: persisted.display_name,
                score: persisted.score,
                is_riichi: persisted.is_riichi,
            };
        }

        Self {
            players,
            round: RoundMarker {
                wind: entity.round.wind,
                round_number: entity.round.round_number.clamp(1, 4),
                honba: entity.round.honba,
            },
            riichi: RiichiLedger::from_stakes(
                entity
                    .riichi_stakes
                    .into_iter()
                    .map(|stake| RiichiStake {
                        owner: stake.owner,
                        confirmed: stake.confirmed,
                        deposited: stake.deposited,
                    })
                    .collect(),
            ),
            dora_indicators: entity.dora_indicators,
            match_title: entity.match_title,
            last_diffs: entity
                .last_diffs
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
                .collect(),
            last_diff_at: entity.last_diff_at,
            is_active: entity.is_active,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_match_is_balanced() {
        let state = GameState::new_match();
        assert_eq!(state.pool_total(), SCORE_POOL);
        assert_eq!(state.round.dealer(), Seat::East);
        assert!(state.players.iter().all(|p| p.score == STARTING_SCORE));
    }

    #[test]
    fn display_score_projects_pending_stakes() {
        let mut state = GameState::new_match();
        state.declare_riichi(Seat::South).unwrap();

        assert_eq!(state.player(Seat::South).score, STARTING_SCORE);
        assert_eq!(state.display_score(Seat::South), STARTING_SCORE - 1000);
        assert!(state.player(Seat::South).is_riichi);

        state.cancel_riichi(Seat::South).unwrap();
        assert_eq!(state.display_score(Seat::South), STARTING_SCORE);
        assert!(!state.player(Seat::South).is_riichi);
    }

    #[test]
    fn outcome_resets_per_hand_markers() {
        let mut state = GameState::new_match();
        state.set_dora(vec!["m5".into()]);
        state.declare_riichi(Seat::East).unwrap();
        state.confirm_riichi(Seat::East).unwrap();

        state
            .apply_outcome(&HandOutcome::Tsumo {
                winner: Seat::East,
                han: 3,
                fu: 30,
            })
            .unwrap();

        assert!(state.dora_indicators.is_empty());
        assert!(state.players.iter().all(|p| !p.is_riichi));
        assert_eq!(state.riichi.stick_count(), 0);
        // 2000 all; the declarer's own stake comes straight back.
        assert_eq!(state.player(Seat::East).score, 31000);
        assert_eq!(state.pool_total(), SCORE_POOL);
        assert!(state.last_diff_at.is_some());
    }

    #[test]
    fn entity_round_trip_preserves_the_pot() {
        let mut state = GameState::new_match();
        state.declare_riichi(Seat::West).unwrap();
        state.confirm_riichi(Seat::West).unwrap();
        state
            .apply_outcome(&HandOutcome::Draw {
                tenpai: [Seat::West].into_iter().collect(),
            })
            .unwrap();

        let entity = GameStateEntity::from(&state);
        let restored = GameState::from(entity);

        assert_eq!(restored.riichi.stick_count(), 1);
        assert!(restored.riichi.stakes()[0].deposited);
        assert_eq!(restored.pool_total(), SCORE_POOL);
        assert_eq!(restored.players, state.players);
        assert_eq!(restored.round, state.round);
    }

    #[test]
    fn manual_override_records_the_delta() {
        let mut state = GameState::new_match();
        state.set_score(Seat::North, 30000);
        assert_eq!(state.player(Seat::North).score, 30000);
        assert_eq!(state.last_diffs[&Seat::North][0].value, 5000);
    }
}
