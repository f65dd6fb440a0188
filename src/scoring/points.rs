//! Point tables mapping a hand value (han, fu) to ron and tsumo payments.

use thiserror::Error;

/// Error raised when a caller submits a hand value outside the table's domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Han below 1 is never a valid winning hand.
    #[error("han must be at least 1 (got {0})")]
    HanTooLow(u8),
    /// Fu below 20 cannot occur for hands scored by the normal formula.
    #[error("fu must be at least 20 below mangan (got {0})")]
    FuTooLow(u8),
}

/// Capped scoring tier a hand falls into once han (and fu, near the
/// boundary) are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Scored by the `fu * 2^(han+2)` formula.
    Normal,
    /// 8000 / 12000 class, including the kiriage round-up.
    Mangan,
    /// 12000 / 18000 class.
    Haneman,
    /// 16000 / 24000 class.
    Baiman,
    /// 24000 / 36000 class.
    Sanbaiman,
    /// 32000 / 48000 class.
    Yakuman,
}

/// Per-payer tsumo amounts. For a dealer winner both fields are equal (the
/// "ALL" payment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsumoPayments {
    /// What the dealer seat pays to the winner.
    pub dealer_pays: i32,
    /// What each non-dealer seat pays to the winner.
    pub non_dealer_pays: i32,
}

impl TsumoPayments {
    /// Total received by the winner from the three payers.
    pub fn total(&self, winner_is_dealer: bool) -> i32 {
        if winner_is_dealer {
            self.non_dealer_pays * 3
        } else {
            self.dealer_pays + self.non_dealer_pays * 2
        }
    }
}

/// Classify a hand value into its scoring tier.
///
/// Tier selection depends on han alone except at the mangan boundary, where
/// 4 han 30+ fu and 3 han 70+ fu round up to mangan.
pub fn classify(han: u8, fu: u8) -> Tier {
    match han {
        13.. => Tier::Yakuman,
        11 | 12 => Tier::Sanbaiman,
        8..=10 => Tier::Baiman,
        6 | 7 => Tier::Haneman,
        5 => Tier::Mangan,
        4 if fu >= 30 => Tier::Mangan,
        3 if fu >= 70 => Tier::Mangan,
        _ => Tier::Normal,
    }
}

/// Points paid to the winner on a ron, before any honba bonus.
pub fn ron_points(han: u8, fu: u8, is_dealer: bool) -> Result<i32, ScoreError> {
    let tier = validate(han, fu)?;
    let points = match tier {
        Tier::Normal => ceil100(base_points(han, fu) * if is_dealer { 6 } else { 4 }),
        capped => {
            let (non_dealer, dealer) = capped_ron(capped);
            if is_dealer { dealer } else { non_dealer }
        }
    };
    Ok(points)
}

/// Per-payer tsumo amounts, before any honba bonus.
pub fn tsumo_points(han: u8, fu: u8, is_dealer: bool) -> Result<TsumoPayments, ScoreError> {
    let tier = validate(han, fu)?;
    let payments = match (tier, is_dealer) {
        (Tier::Normal, true) => {
            let each = ceil100(base_points(han, fu) * 2);
            TsumoPayments {
                dealer_pays: each,
                non_dealer_pays: each,
            }
        }
        (Tier::Normal, false) => TsumoPayments {
            dealer_pays: ceil100(base_points(han, fu) * 2),
            non_dealer_pays: ceil100(base_points(han, fu)),
        },
        (capped, true) => {
            let each = capped_tsumo_all(capped);
            TsumoPayments {
                dealer_pays: each,
                non_dealer_pays: each,
            }
        }
        (capped, false) => {
            let (non_dealer, dealer) = capped_tsumo_split(capped);
            TsumoPayments {
                dealer_pays: dealer,
                non_dealer_pays: non_dealer,
            }
        }
    };
    Ok(payments)
}

/// Round up to the next multiple of 100, applied per payer.
fn ceil100(points: i32) -> i32 {
    (points + 99) / 100 * 100
}

/// Basic points `fu * 2^(han+2)`, only meaningful in the normal tier.
fn base_points(han: u8, fu: u8) -> i32 {
    i32::from(fu) << (u32::from(han) + 2)
}

fn validate(han: u8, fu: u8) -> Result<Tier, ScoreError> {
    if han < 1 {
        return Err(ScoreError::HanTooLow(han));
    }
    let tier = classify(han, fu);
    if tier == Tier::Normal && fu < 20 {
        return Err(ScoreError::FuTooLow(fu));
    }
    Ok(tier)
}

/// Ron payment for capped tiers as (non-dealer winner, dealer winner).
fn capped_ron(tier: Tier) -> (i32, i32) {
    match tier {
        Tier::Mangan => (8000, 12000),
        Tier::Haneman => (12000, 18000),
        Tier::Baiman => (16000, 24000),
        Tier::Sanbaiman => (24000, 36000),
        Tier::Yakuman => (32000, 48000),
        Tier::Normal => unreachable!("normal tier has no capped payment"),
    }
}

/// Dealer-tsumo "ALL" payment per seat for capped tiers.
fn capped_tsumo_all(tier: Tier) -> i32 {
    match tier {
        Tier::Mangan => 4000,
        Tier::Haneman => 6000,
        Tier::Baiman => 8000,
        Tier::Sanbaiman => 12000,
        Tier::Yakuman => 16000,
        Tier::Normal => unreachable!("normal tier has no capped payment"),
    }
}

/// Non-dealer tsumo split for capped tiers as (each non-dealer pays, dealer pays).
fn capped_tsumo_split(tier: Tier) -> (i32, i32) {
    match tier {
        Tier::Mangan => (2000, 4000),
        Tier::Haneman => (3000, 6000),
        Tier::Baiman => (4000, 8000),
        Tier::Sanbaiman => (6000, 12000),
        Tier::Yakuman => (8000, 16000),
        Tier::Normal => unreachable!("normal tier has no capped payment"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ron_payments_are_multiples_of_100() {
        for han in 1..=13 {
            for fu in [20, 25, 30, 40, 50, 70, 110] {
                for dealer in [false, true] {
                    let points = ron_points(han, fu, dealer).unwrap();
                    assert_eq!(points % 100, 0, "han={han} fu={fu} dealer={dealer}");
                }
            }
        }
    }

    #[test]
    fn ron_is_non_decreasing_in_han_for_fixed_fu() {
        for fu in [20, 25, 30, 40, 50, 60, 70] {
            for dealer in [false, true] {
                let mut previous = 0;
                for han in 1..=14 {
                    let points = ron_points(han, fu, dealer).unwrap();
                    assert!(
                        points >= previous,
                        "han={han} fu={fu} dealer={dealer}: {points} < {previous}"
                    );
                    previous = points;
                }
            }
        }
    }

    #[test]
    fn mangan_round_up_boundaries() {
        assert_eq!(ron_points(4, 30, false).unwrap(), 8000);
        assert_eq!(ron_points(5, 20, false).unwrap(), 8000);
        assert_eq!(ron_points(3, 70, false).unwrap(), 8000);
        assert_ne!(ron_points(3, 69, false).unwrap(), 8000);
        // Just below the 4-han boundary the normal formula still applies.
        assert_eq!(ron_points(4, 25, false).unwrap(), 6400);
    }

    #[test]
    fn capped_tier_tables() {
        assert_eq!(ron_points(6, 30, false).unwrap(), 12000);
        assert_eq!(ron_points(8, 30, true).unwrap(), 24000);
        assert_eq!(ron_points(11, 30, false).unwrap(), 24000);
        assert_eq!(ron_points(13, 30, true).unwrap(), 48000);

        let yakuman = tsumo_points(13, 30, false).unwrap();
        assert_eq!(yakuman.dealer_pays, 16000);
        assert_eq!(yakuman.non_dealer_pays, 8000);
        assert_eq!(tsumo_points(13, 30, true).unwrap().non_dealer_pays, 16000);
    }

    #[test]
    fn normal_tier_formula() {
        // 3 han 30 fu: base 960; dealer tsumo 2000 all.
        let payments = tsumo_points(3, 30, true).unwrap();
        assert_eq!(payments.non_dealer_pays, 2000);
        assert_eq!(payments.total(true), 6000);

        // 2 han 40 fu non-dealer: dealer pays 1300, others 700.
        let payments = tsumo_points(2, 40, false).unwrap();
        assert_eq!(payments.dealer_pays, 1300);
        assert_eq!(payments.non_dealer_pays, 700);

        // 1 han 30 fu ron: 240 * 4 = 960 -> 1000.
        assert_eq!(ron_points(1, 30, false).unwrap(), 1000);
        assert_eq!(ron_points(1, 30, true).unwrap(), 1500);
    }

    #[test]
    fn tsumo_totals_match_documented_sums_per_tier() {
        // Non-dealer winner: dealer + 2 * non-dealer.
        for (han, expected) in [(5, 8000), (6, 12000), (8, 16000), (11, 24000), (13, 32000)] {
            let payments = tsumo_points(han, 30, false).unwrap();
            assert_eq!(payments.total(false), expected, "han={han}");
        }
    }

    #[test]
    fn out_of_domain_hands_are_rejected() {
        assert_eq!(ron_points(0, 30, false), Err(ScoreError::HanTooLow(0)));
        assert_eq!(ron_points(2, 10, false), Err(ScoreError::FuTooLow(10)));
        assert_eq!(tsumo_points(1, 0, true), Err(ScoreError::FuTooLow(0)));
        // Fu is irrelevant once the tier is capped.
        assert!(ron_points(5, 0, false).is_ok());
        assert!(tsumo_points(13, 0, false).is_ok());
    }
}
