//! Plaintext settlement arithmetic.
//!
//! `settle_wager` in the circuit crate computes the same value over the
//! encrypted position; the callback recomputes it here from the revealed
//! position and totals and refuses to credit anything that disagrees.

use anchor_lang::prelude::*;

use crate::error::ErrorCode;
use crate::state::{MatchResult, NoWinnerPolicy, RevealedTotals};

pub fn settlement_payout(
    direction: u8,
    units: u64,
    result: MatchResult,
    totals: &RevealedTotals,
    stake_unit: u64,
    policy: NoWinnerPolicy,
) -> Result<u64> {
    let winning_total = totals.winning_total(result)?;

    if winning_total == 0 {
        return match policy {
            NoWinnerPolicy::Unclaimable => Ok(0),
            NoWinnerPolicy::RefundStake => units
                .checked_mul(stake_unit)
                .ok_or_else(|| error!(ErrorCode::MathOverflow)),
        };
    }

    if direction != result.code() {
        return Ok(0);
    }

    let share = (units as u128) * (totals.pool_points(stake_unit)? as u128) / (winning_total as u128);
    u64::try_from(share).map_err(|_| error!(ErrorCode::MathOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STAKE_UNIT;

    fn totals(home: u64, away: u64, draw: u64) -> RevealedTotals {
        RevealedTotals {
            home,
            away,
            draw,
            aggregate: home + away + draw,
        }
    }

    #[test]
    fn sole_winner_takes_the_pool() {
        let t = totals(5, 0, 0);
        let payout = settlement_payout(1, 5, MatchResult::HomeWin, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable);
        assert_eq!(payout.unwrap(), 500);
    }

    #[test]
    fn loser_gets_nothing_and_winner_gets_everything() {
        let t = totals(3, 2, 0);
        let x = settlement_payout(1, 3, MatchResult::AwayWin, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        let y = settlement_payout(2, 2, MatchResult::AwayWin, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        assert_eq!(x, 0);
        assert_eq!(y, 500);
    }

    #[test]
    fn winners_split_pro_rata_and_truncate() {
        let t = totals(1, 2, 4);
        // pool = 700 points, draw backers hold 4 units
        let a = settlement_payout(3, 1, MatchResult::Draw, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        let b = settlement_payout(3, 3, MatchResult::Draw, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        assert_eq!(a, 175);
        assert_eq!(b, 525);

        let t = totals(3, 0, 1);
        // pool = 400 points over 3 home units
        let c = settlement_payout(1, 1, MatchResult::HomeWin, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        assert_eq!(c, 133);
        assert!(3 * c <= t.pool_points(STAKE_UNIT).unwrap());
    }

    #[test]
    fn no_winners_follow_the_policy() {
        let t = totals(3, 2, 0);
        let kept = settlement_payout(1, 3, MatchResult::Draw, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap();
        let refunded = settlement_payout(1, 3, MatchResult::Draw, &t, STAKE_UNIT, NoWinnerPolicy::RefundStake).unwrap();
        assert_eq!(kept, 0);
        assert_eq!(refunded, 300);
    }

    #[test]
    fn empty_position_earns_nothing() {
        let t = totals(4, 0, 0);
        let payout = settlement_payout(0, 0, MatchResult::HomeWin, &t, STAKE_UNIT, NoWinnerPolicy::RefundStake);
        assert_eq!(payout.unwrap(), 0);
    }

    #[test]
    fn unset_result_cannot_settle() {
        let t = totals(1, 1, 1);
        assert_eq!(
            settlement_payout(1, 1, MatchResult::Unset, &t, STAKE_UNIT, NoWinnerPolicy::Unclaimable).unwrap_err(),
            ErrorCode::NotFinished.into()
        );
    }
}
