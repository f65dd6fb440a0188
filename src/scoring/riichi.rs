//! Riichi-stick bookkeeping with deferred point movement.
//!
//! Declaring a riichi never moves points on its own; the 1000-point stake is
//! collected once, either by the win settlement or by the first draw
//! settlement after the declaration. Stakes deducted at a draw stay in the
//! ledger as the carried pot until a later winner claims them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::seat::Seat;

/// One declared riichi stake sitting on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiichiStake {
    /// Seat that declared the riichi.
    pub owner: Seat,
    /// Set once the riichi discard is committed; a confirmed stake can no
    /// longer be cancelled.
    pub confirmed: bool,
    /// Set once the 1000 points were collected by a draw settlement. A
    /// deposited stake is part of the carried pot and must not be charged
    /// again.
    pub deposited: bool,
}

/// Error raised on an invalid ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The seat already has a live stake this hand.
    #[error("seat {0} already has a pending riichi stake")]
    AlreadyDeclared(Seat),
    /// No stake for this seat that could be confirmed.
    #[error("seat {0} has no unconfirmed riichi stake")]
    NothingToConfirm(Seat),
    /// No cancelable stake: either none exists or it is already confirmed.
    #[error("seat {0} has no cancelable riichi stake")]
    NothingToCancel(Seat),
}

/// A point movement produced by resolving stakes at settlement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeResolution {
    /// Seat whose score changes.
    pub seat: Seat,
    /// Signed point delta.
    pub delta: i32,
}

/// Ordered list of riichi stakes for the current match.
///
/// The displayed stick count is always `len()`, carried pot included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiichiLedger {
    stakes: Vec<RiichiStake>,
}

impl RiichiLedger {
    /// Empty ledger for a fresh match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted stakes.
    pub fn from_stakes(stakes: Vec<RiichiStake>) -> Self {
        Self { stakes }
    }

    /// Number of sticks on the table, which clients display verbatim.
    pub fn stick_count(&self) -> usize {
        self.stakes.len()
    }

    /// All stakes in declaration order.
    pub fn stakes(&self) -> &[RiichiStake] {
        &self.stakes
    }

    /// Whether this seat has a stake declared in the current hand.
    pub fn has_pending(&self, seat: Seat) -> bool {
        self.stakes
            .iter()
            .any(|stake| stake.owner == seat && !stake.deposited)
    }

    /// Number of this seat's stakes whose 1000 points have not moved yet,
    /// used for the read-time display projection.
    pub fn pending_count(&self, seat: Seat) -> usize {
        self.stakes
            .iter()
            .filter(|stake| stake.owner == seat && !stake.deposited)
            .count()
    }

    /// Append an unconfirmed stake for `seat`. Points do not move.
    pub fn declare(&mut self, seat: Seat) -> Result<(), LedgerError> {
        if self.has_pending(seat) {
            return Err(LedgerError::AlreadyDeclared(seat));
        }
        self.stakes.push(RiichiStake {
            owner: seat,
            confirmed: false,
            deposited: false,
        });
        Ok(())
    }

    /// Mark the most recent unconfirmed stake for `seat` as committed.
    pub fn confirm(&mut self, seat: Seat) -> Result<(), LedgerError> {
        let stake = self
            .stakes
            .iter_mut()
            .rev()
            .find(|stake| stake.owner == seat && !stake.confirmed && !stake.deposited)
            .ok_or(LedgerError::NothingToConfirm(seat))?;
        stake.confirmed = true;
        Ok(())
    }

    /// Remove one still-unconfirmed stake owned by `seat`.
    pub fn cancel(&mut self, seat: Seat) -> Result<(), LedgerError> {
        let position = self
            .stakes
            .iter()
            .rposition(|stake| stake.owner == seat && !stake.confirmed && !stake.deposited)
            .ok_or(LedgerError::NothingToCancel(seat))?;
        self.stakes.remove(position);
        Ok(())
    }

    /// Resolve every stake at a win: owners of stakes not yet deposited pay
    /// their 1000 now, and the winner collects the full pot. Empties the
    /// ledger.
    pub fn settle_on_win(&mut self, winner: Seat) -> Vec<StakeResolution> {
        let mut resolutions = Vec::new();
        for stake in &self.stakes {
            if !stake.deposited {
                resolutions.push(StakeResolution {
                    seat: stake.owner,
                    delta: -1000,
                });
            }
        }
        let pot = self.stakes.len() as i32 * 1000;
        if pot > 0 {
            resolutions.push(StakeResolution {
                seat: winner,
                delta: pot,
            });
        }
        self.stakes.clear();
        resolutions
    }

    /// Resolve stakes at an exhaustive draw: collect 1000 from each owner not
    /// yet charged and keep every stake as the carried pot for the next hand.
    pub fn settle_on_draw(&mut self) -> Vec<StakeResolution> {
        let mut resolutions = Vec::new();
        for stake in &mut self.stakes {
            if !stake.deposited {
                resolutions.push(StakeResolution {
                    seat: stake.owner,
                    delta: -1000,
                });
                stake.deposited = true;
            }
        }
        resolutions
    }
}
