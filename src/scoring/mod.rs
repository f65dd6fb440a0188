//! Pure scoring and settlement engine: point tables, riichi-stick ledger,
//! round clock, draw penalties, and the coordinator that combines them into
//! one atomic hand settlement. Nothing in this tree performs IO or touches
//! shared state.

pub mod draw;
pub mod points;
pub mod riichi;
pub mod round;
pub mod seat;
pub mod settlement;

pub use self::riichi::{LedgerError, RiichiLedger, RiichiStake};
pub use self::round::RoundMarker;
pub use self::seat::Seat;
pub use self::settlement::{HandOutcome, ScoreDiff, Settlement, SettlementError, settle};
