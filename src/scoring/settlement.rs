//! Settlement of one hand outcome into a complete next state.
//!
//! This is the only place where the point table, the riichi ledger, the draw
//! penalties, and the round clock meet. A settlement is computed as a whole
//! from immutable inputs; callers swap the result in atomically or not at
//! all.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{
    draw::draw_transfers,
    points::{self, ScoreError},
    riichi::{RiichiLedger, StakeResolution},
    round::RoundMarker,
    seat::Seat,
};

/// Diff label for the 1000 points a riichi declarer forfeits.
pub const LABEL_RIICHI_STAKE: &str = "riichi stake";
/// Diff label for the pot collected by a winner.
pub const LABEL_RIICHI_POT: &str = "riichi pot";
/// Diff label for points collected by a tenpai seat at a draw.
pub const LABEL_TENPAI_BONUS: &str = "tenpai bonus";
/// Diff label for points paid by a noten seat at a draw.
pub const LABEL_NOTEN_PENALTY: &str = "noten penalty";
/// Diff label for the rounding residual assigned to the winner.
pub const LABEL_ADJUSTMENT: &str = "adjustment";

/// The one way a hand can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOutcome {
    /// Win off another seat's discard.
    Ron {
        /// Winning seat.
        winner: Seat,
        /// Discarding seat, pays the full amount.
        loser: Seat,
        /// Hand value in han.
        han: u8,
        /// Hand value in fu.
        fu: u8,
    },
    /// Self-drawn win, paid by all three other seats.
    Tsumo {
        /// Winning seat.
        winner: Seat,
        /// Hand value in han.
        han: u8,
        /// Hand value in fu.
        fu: u8,
    },
    /// Exhaustive draw with the given seats tenpai.
    Draw {
        /// Seats that were tenpai when the wall ran out.
        tenpai: BTreeSet<Seat>,
    },
}

/// Error raised before any state is produced; the current hand is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Hand value outside the point table's domain.
    #[error(transparent)]
    Score(#[from] ScoreError),
    /// A ron must involve two distinct seats.
    #[error("ron winner and loser must differ (both {0})")]
    WinnerIsLoser(Seat),
}

/// One labelled component of a seat's score change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDiff {
    /// Signed point change.
    pub value: i32,
    /// Human-auditable origin of the change; `None` for the plain win/loss
    /// transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ScoreDiff {
    fn plain(value: i32) -> Self {
        Self { value, label: None }
    }

    fn labelled(value: i32, label: &str) -> Self {
        Self {
            value,
            label: Some(label.to_string()),
        }
    }
}

/// Complete result of settling one hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// New scores indexed by [`Seat::index`].
    pub scores: [i32; 4],
    /// Round marker for the next hand.
    pub round: RoundMarker,
    /// Remaining stakes (the carried pot after a draw, empty after a win).
    pub ledger: RiichiLedger,
    /// Per-seat labelled diffs, in seat order, only for seats with changes.
    pub diffs: IndexMap<Seat, Vec<ScoreDiff>>,
}

/// Settle `outcome` against the current scores, round marker, and riichi
/// ledger.
///
/// Order of application: raw points (with the honba bonus folded into the
/// win transfer), riichi resolution, round clock, residual re-normalisation.
/// Every component of a seat's change is surfaced as its own diff entry even
/// when the components cancel out.
pub fn settle(
    scores: [i32; 4],
    round: &RoundMarker,
    ledger: &RiichiLedger,
    outcome: &HandOutcome,
) -> Result<Settlement, SettlementError> {
    let mut next = Working {
        scores,
        ledger: ledger.clone(),
        diffs: Default::default(),
    };
    let mut round = *round;
    let dealer = round.dealer();

    match outcome {
        HandOutcome::Ron {
            winner,
            loser,
            han,
            fu,
        } => {
            if winner == loser {
                return Err(SettlementError::WinnerIsLoser(*winner));
            }
            let points = points::ron_points(*han, *fu, *winner == dealer)?;
            let amount = points + 300 * round.honba as i32;
            next.apply(*loser, -amount, None);
            next.apply(*winner, amount, None);
            next.resolve_riichi(*winner);
            round.on_win(*winner == dealer);
            next.normalise(*winner);
        }
        HandOutcome::Tsumo { winner, han, fu } => {
            let payments = points::tsumo_points(*han, *fu, *winner == dealer)?;
            let mut collected = 0;
            for seat in Seat::ALL {
                if seat == *winner {
                    continue;
                }
                let base = if seat == dealer {
                    payments.dealer_pays
                } else {
                    payments.non_dealer_pays
                };
                let amount = base + 100 * round.honba as i32;
                next.apply(seat, -amount, None);
                collected += amount;
            }
            next.apply(*winner, collected, None);
            next.resolve_riichi(*winner);
            round.on_win(*winner == dealer);
            next.normalise(*winner);
        }
        HandOutcome::Draw { tenpai } => {
            for transfer in draw_transfers(tenpai) {
                next.apply(transfer.from, -transfer.points, Some(LABEL_NOTEN_PENALTY));
                next.apply(transfer.to, transfer.points, Some(LABEL_TENPAI_BONUS));
            }
            for resolution in next.ledger.settle_on_draw() {
                next.apply(resolution.seat, resolution.delta, Some(LABEL_RIICHI_STAKE));
            }
            round.on_draw(tenpai.contains(&dealer));
        }
    }

    let Working {
        scores,
        ledger,
        diffs,
    } = next;
    Ok(Settlement {
        scores,
        round,
        ledger,
        diffs: in_seat_order(diffs),
    })
}

/// Re-emit the diff map in fixed seat order for stable display.
fn in_seat_order(mut diffs: IndexMap<Seat, Vec<ScoreDiff>>) -> IndexMap<Seat, Vec<ScoreDiff>> {
    let mut ordered = IndexMap::new();
    for seat in Seat::ALL {
        if let Some(entries) = diffs.shift_remove(&seat) {
            ordered.insert(seat, entries);
        }
    }
    ordered
}

/// Mutable scratch space while a settlement is assembled.
struct Working {
    scores: [i32; 4],
    ledger: RiichiLedger,
    diffs: IndexMap<Seat, Vec<ScoreDiff>>,
}

impl Working {
    fn apply(&mut self, seat: Seat, value: i32, label: Option<&str>) {
        if value == 0 {
            return;
        }
        self.scores[seat.index()] += value;
        let diff = match label {
            Some(label) => ScoreDiff::labelled(value, label),
            None => ScoreDiff::plain(value),
        };
        self.diffs.entry(seat).or_default().push(diff);
    }

    fn resolve_riichi(&mut self, winner: Seat) {
        let resolutions: Vec<StakeResolution> = self.ledger.settle_on_win(winner);
        for resolution in resolutions {
            let label = if resolution.delta < 0 {
                LABEL_RIICHI_STAKE
            } else {
                LABEL_RIICHI_POT
            };
            self.apply(resolution.seat, resolution.delta, Some(label));
        }
    }

    /// Assign any rounding residual to the winner so the pool total is exact.
    /// With per-payer `ceil100` the transfers are already balanced; a nonzero
    /// residual here means a carried pot was just claimed or points were
    /// previously overridden by hand.
    fn normalise(&mut self, winner: Seat) {
        let carried = self.ledger.stakes().iter().filter(|s| s.deposited).count() as i32;
        let total: i32 = self.scores.iter().sum::<i32>() + carried * 1000;
        let residual = 100_000 - total;
        if residual != 0 {
            self.apply(winner, residual, Some(LABEL_ADJUSTMENT));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVEN: [i32; 4] = [25000; 4];

    fn east_one() -> RoundMarker {
        RoundMarker::east_start()
    }

    fn pool(settlement: &Settlement) -> i32 {
        let carried = settlement
            .ledger
            .stakes()
            .iter()
            .filter(|s| s.deposited)
            .count() as i32;
        settlement.scores.iter().sum::<i32>() + carried * 1000
    }

    #[test]
    fn dealer_tsumo_from_even_scores() {
        // 3 han 30 fu dealer tsumo: 2000 from everyone, deal repeats.
        let outcome = HandOutcome::Tsumo {
            winner: Seat::East,
            han: 3,
            fu: 30,
        };
        let settlement = settle(EVEN, &east_one(), &RiichiLedger::new(), &outcome).unwrap();

        assert_eq!(settlement.scores, [31000, 23000, 23000, 23000]);
        assert_eq!(settlement.round.wind, Seat::East);
        assert_eq!(settlement.round.round_number, 1);
        assert_eq!(settlement.round.honba, 1);
        assert_eq!(pool(&settlement), 100_000);
    }

    #[test]
    fn ron_with_honba_bonus() {
        let round = RoundMarker {
            wind: Seat::East,
            round_number: 1,
            honba: 2,
        };
        // Non-dealer 2 han 30 fu ron: 2000 + 600 honba.
        let outcome = HandOutcome::Ron {
            winner: Seat::South,
            loser: Seat::East,
            han: 2,
            fu: 30,
        };
        let settlement = settle(EVEN, &round, &RiichiLedger::new(), &outcome).unwrap();

        assert_eq!(settlement.scores[Seat::South.index()], 27600);
        assert_eq!(settlement.scores[Seat::East.index()], 22400);
        // Non-dealer win: honba resets and the deal rotates.
        assert_eq!(settlement.round.honba, 0);
        assert_eq!(settlement.round.round_number, 2);
        assert_eq!(pool(&settlement), 100_000);
    }

    #[test]
    fn tsumo_with_honba_charges_each_payer() {
        let round = RoundMarker {
            wind: Seat::East,
            round_number: 2,
            honba: 3,
        };
        // Non-dealer mangan tsumo: dealer 4000+300, others 2000+300 each.
        let outcome = HandOutcome::Tsumo {
            winner: Seat::East,
            han: 5,
            fu: 30,
        };
        let settlement = settle(EVEN, &round, &RiichiLedger::new(), &outcome).unwrap();

        assert_eq!(settlement.scores[Seat::East.index()], 25000 + 8000 + 900);
        assert_eq!(settlement.scores[Seat::South.index()], 25000 - 4300);
        assert_eq!(settlement.scores[Seat::West.index()], 25000 - 2300);
        assert_eq!(settlement.scores[Seat::North.index()], 25000 - 2300);
        assert_eq!(pool(&settlement), 100_000);
    }

    #[test]
    fn riichi_stakes_flow_to_the_winner() {
        let mut ledger = RiichiLedger::new();
        ledger.declare(Seat::East).unwrap();
        ledger.declare(Seat::South).unwrap();

        let outcome = HandOutcome::Tsumo {
            winner: Seat::South,
            han: 1,
            fu: 40,
        };
        let settlement = settle(EVEN, &east_one(), &ledger, &outcome).unwrap();

        // South: -1000 stake +2000 pot on top of the tsumo income.
        // 1 han 40 fu non-dealer: dealer 700, others 400.
        assert_eq!(
            settlement.scores[Seat::South.index()],
            25000 + 700 + 400 + 400 - 1000 + 2000
        );
        assert_eq!(settlement.scores[Seat::East.index()], 25000 - 700 - 1000);
        assert!(settlement.ledger.stakes().is_empty());
        assert_eq!(pool(&settlement), 100_000);

        let south_diffs = &settlement.diffs[&Seat::South];
        assert!(south_diffs
            .iter()
            .any(|d| d.label.as_deref() == Some(LABEL_RIICHI_STAKE) && d.value == -1000));
        assert!(south_diffs
            .iter()
            .any(|d| d.label.as_deref() == Some(LABEL_RIICHI_POT) && d.value == 2000));
    }

    #[test]
    fn draw_keeps_the_pot_and_every_component_is_labelled() {
        let mut ledger = RiichiLedger::new();
        ledger.declare(Seat::West).unwrap();
        ledger.confirm(Seat::West).unwrap();

        let outcome = HandOutcome::Draw {
            tenpai: [Seat::West].into_iter().collect(),
        };
        let settlement = settle(EVEN, &east_one(), &ledger, &outcome).unwrap();

        // West collects 3000 tenpai bonus but forfeits the riichi stake.
        assert_eq!(settlement.scores[Seat::West.index()], 25000 + 3000 - 1000);
        assert_eq!(settlement.scores[Seat::East.index()], 24000);
        assert_eq!(settlement.ledger.stick_count(), 1);
        assert!(settlement.ledger.stakes()[0].deposited);
        assert_eq!(pool(&settlement), 100_000);

        // Dealer (East) was noten: deal rotates, honba increments.
        assert_eq!(settlement.round.round_number, 2);
        assert_eq!(settlement.round.honba, 1);

        let west = &settlement.diffs[&Seat::West];
        assert_eq!(west.len(), 2);
        assert!(west.iter().any(|d| d.label.as_deref() == Some(LABEL_TENPAI_BONUS)));
        assert!(west.iter().any(|d| d.label.as_deref() == Some(LABEL_RIICHI_STAKE)));
    }

    #[test]
    fn carried_pot_is_claimed_by_the_next_winner() {
        let mut ledger = RiichiLedger::new();
        ledger.declare(Seat::North).unwrap();

        // Hand one: all-noten draw. North's stake is deposited.
        let draw = HandOutcome::Draw {
            tenpai: BTreeSet::new(),
        };
        let after_draw = settle(EVEN, &east_one(), &ledger, &draw).unwrap();
        assert_eq!(after_draw.scores[Seat::North.index()], 24000);
        assert_eq!(pool(&after_draw), 100_000);

        // Hand two: East rons South and also picks up the carried stick.
        let ron = HandOutcome::Ron {
            winner: Seat::East,
            loser: Seat::South,
            han: 1,
            fu: 30,
        };
        let final_state = settle(
            after_draw.scores,
            &after_draw.round,
            &after_draw.ledger,
            &ron,
        )
        .unwrap();

        // 1 han 30 fu non-dealer ron is 1000, honba 1 adds 300.
        let east = final_state.scores[Seat::East.index()];
        assert_eq!(east, 25000 + 1000 + 300 + 1000);
        assert!(final_state.ledger.stakes().is_empty());
        assert_eq!(final_state.scores.iter().sum::<i32>(), 100_000);
    }

    #[test]
    fn ron_against_self_is_rejected() {
        let outcome = HandOutcome::Ron {
            winner: Seat::West,
            loser: Seat::West,
            han: 2,
            fu: 30,
        };
        let err = settle(EVEN, &east_one(), &RiichiLedger::new(), &outcome).unwrap_err();
        assert_eq!(err, SettlementError::WinnerIsLoser(Seat::West));
    }

    #[test]
    fn invalid_hand_value_leaves_no_partial_state() {
        let outcome = HandOutcome::Ron {
            winner: Seat::East,
            loser: Seat::South,
            han: 0,
            fu: 30,
        };
        assert!(matches!(
            settle(EVEN, &east_one(), &RiichiLedger::new(), &outcome),
            Err(SettlementError::Score(_))
        ));
    }
}
