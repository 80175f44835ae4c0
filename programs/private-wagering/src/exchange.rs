use anchor_lang::prelude::*;
use solana_native_token::LAMPORTS_PER_SOL;

use crate::error::ErrorCode;

/// Points credited for a lamport deposit at the configured rate, truncated.
pub fn points_for_deposit(lamports: u64, points_per_sol: u64) -> Result<u64> {
    let points = (lamports as u128) * (points_per_sol as u128) / (LAMPORTS_PER_SOL as u128);
    let points = u64::try_from(points).map_err(|_| error!(ErrorCode::MathOverflow))?;
    require!(points > 0, ErrorCode::DepositTooSmall);
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_POINTS_PER_SOL;

    #[test]
    fn one_sol_buys_the_default_rate() {
        assert_eq!(
            points_for_deposit(LAMPORTS_PER_SOL, DEFAULT_POINTS_PER_SOL).unwrap(),
            100_000
        );
    }

    #[test]
    fn deposits_accumulate_linearly() {
        let first = points_for_deposit(LAMPORTS_PER_SOL / 2, DEFAULT_POINTS_PER_SOL).unwrap();
        let second = points_for_deposit(3 * LAMPORTS_PER_SOL / 10, DEFAULT_POINTS_PER_SOL).unwrap();
        assert_eq!(first + second, 80_000);
    }

    #[test]
    fn dust_is_refused() {
        assert_eq!(
            points_for_deposit(0, DEFAULT_POINTS_PER_SOL).unwrap_err(),
            ErrorCode::DepositTooSmall.into()
        );
        // 10_000 lamports buys exactly one point at the default rate
        assert_eq!(
            points_for_deposit(9_999, DEFAULT_POINTS_PER_SOL).unwrap_err(),
            ErrorCode::DepositTooSmall.into()
        );
        assert_eq!(points_for_deposit(10_000, DEFAULT_POINTS_PER_SOL).unwrap(), 1);
    }

    #[test]
    fn custom_rate_applies() {
        assert_eq!(points_for_deposit(2 * LAMPORTS_PER_SOL, 7).unwrap(), 14);
    }
}
