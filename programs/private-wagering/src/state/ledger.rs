use anchor_lang::prelude::*;

use crate::error::ErrorCode;

/// What settlement pays when nobody backed the result that occurred.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub enum NoWinnerPolicy {
    /// Every settlement pays zero; the pool stays in the ledger.
    #[default]
    Unclaimable,
    /// Every bettor is credited back its own stake.
    RefundStake,
}

#[account]
#[derive(InitSpace, Default)]
pub struct LedgerConfig {
    pub bump: u8,
    pub operator: Pubkey,
    /// Id assigned to the next match.
    pub match_count: u64,
    pub points_per_sol: u64,
    pub no_winner_policy: NoWinnerPolicy,
}

impl LedgerConfig {
    pub fn next_match_id(&mut self) -> Result<u64> {
        let id = self.match_count;
        self.match_count = id.checked_add(1).ok_or(ErrorCode::MathOverflow)?;
        Ok(id)
    }
}

/// Holds deposited lamports. Program owned so payouts can debit it directly.
#[account]
#[derive(InitSpace, Default)]
pub struct DepositVault {
    pub bump: u8,
    /// Lamports of deposits whose credit computation has not called back yet.
    pub pending_lamports: u64,
}

impl DepositVault {
    /// Lamports the operator may take without touching rent or in-flight deposits.
    pub fn withdrawable(&self, balance: u64, rent_floor: u64) -> u64 {
        balance
            .saturating_sub(rent_floor)
            .saturating_sub(self.pending_lamports)
    }

    pub fn hold(&mut self, lamports: u64) -> Result<()> {
        self.pending_lamports = self
            .pending_lamports
            .checked_add(lamports)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn clear(&mut self, lamports: u64) {
        self.pending_lamports = self.pending_lamports.saturating_sub(lamports);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ids_are_sequential() {
        let mut ledger = LedgerConfig::default();
        assert_eq!(ledger.next_match_id().unwrap(), 0);
        assert_eq!(ledger.next_match_id().unwrap(), 1);
        assert_eq!(ledger.match_count, 2);
    }

    #[test]
    fn match_counter_does_not_wrap() {
        let mut ledger = LedgerConfig {
            match_count: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            ledger.next_match_id().unwrap_err(),
            ErrorCode::MathOverflow.into()
        );
        assert_eq!(ledger.match_count, u64::MAX);
    }

    #[test]
    fn withdrawable_excludes_rent_and_held_deposits() {
        let mut vault = DepositVault::default();
        assert_eq!(vault.withdrawable(10_000, 1_000), 9_000);

        vault.hold(4_000).unwrap();
        assert_eq!(vault.withdrawable(10_000, 1_000), 5_000);

        vault.clear(4_000);
        assert_eq!(vault.withdrawable(10_000, 1_000), 9_000);
        assert_eq!(vault.withdrawable(500, 1_000), 0);
    }
}
