use anchor_lang::prelude::*;

use super::ComputationLock;
use crate::error::ErrorCode;

/// An account's points balance, encrypted to the owner's x25519 key.
#[account]
#[derive(InitSpace, Default)]
pub struct PointsAccount {
    pub bump: u8,
    /// Must stay first: the cluster reads it at `CIPHERTEXT_OFFSET`.
    pub balance_state: [u8; 32],
    pub balance_nonce: u128,
    pub owner: Pubkey,
    pub encryption_pubkey: [u8; 32],
    pub is_open: bool,
    pub pending: bool,
    /// Lamports and points of the deposit currently being credited.
    pub pending_lamports: u64,
    pub pending_points: u64,
    /// Plaintext sum of deposits; deposits are public lamport transfers anyway.
    pub deposited_points: u64,
}

impl ComputationLock for PointsAccount {
    fn pending_flag(&mut self) -> &mut bool {
        &mut self.pending
    }
}

impl PointsAccount {
    pub fn ensure_open(&self) -> Result<()> {
        require!(self.is_open, ErrorCode::AccountNotOpen);
        Ok(())
    }

    /// Ciphertexts fed to the cluster must be encrypted to the registered key,
    /// otherwise the output would be unreadable by the owner.
    pub fn ensure_key(&self, encryption_pubkey: &[u8; 32]) -> Result<()> {
        require!(
            self.encryption_pubkey == *encryption_pubkey,
            ErrorCode::InvalidProof
        );
        Ok(())
    }

    pub fn stage_deposit(&mut self, lamports: u64, points: u64) -> Result<()> {
        self.lock()?;
        self.pending_lamports = lamports;
        self.pending_points = points;
        Ok(())
    }

    /// Ends the in-flight deposit. Returns the lamports it held.
    pub fn complete_deposit(&mut self, credited: Option<([u8; 32], u128)>) -> Result<u64> {
        let lamports = self.pending_lamports;
        if let Some((balance, nonce)) = credited {
            self.balance_state = balance;
            self.balance_nonce = nonce;
            self.is_open = true;
            self.deposited_points = self
                .deposited_points
                .checked_add(self.pending_points)
                .ok_or(ErrorCode::MathOverflow)?;
        }
        self.pending_lamports = 0;
        self.pending_points = 0;
        self.release();
        Ok(lamports)
    }

    pub fn store_balance(&mut self, balance: [u8; 32], nonce: u128) {
        self.balance_state = balance;
        self.balance_nonce = nonce;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_account() -> PointsAccount {
        PointsAccount {
            is_open: true,
            encryption_pubkey: [7; 32],
            ..Default::default()
        }
    }

    #[test]
    fn second_computation_is_refused_while_one_is_in_flight() {
        let mut account = open_account();
        account.lock().unwrap();
        assert_eq!(account.lock().unwrap_err(), ErrorCode::ComputationPending.into());

        account.release();
        assert!(account.lock().is_ok());
    }

    #[test]
    fn foreign_key_is_rejected() {
        let account = open_account();
        assert!(account.ensure_key(&[7; 32]).is_ok());
        assert_eq!(
            account.ensure_key(&[8; 32]).unwrap_err(),
            ErrorCode::InvalidProof.into()
        );
    }

    #[test]
    fn deposits_accumulate() {
        let mut account = PointsAccount::default();
        assert_eq!(account.ensure_open().unwrap_err(), ErrorCode::AccountNotOpen.into());

        account.stage_deposit(500_000_000, 50_000).unwrap();
        let held = account.complete_deposit(Some(([1; 32], 11))).unwrap();
        assert_eq!(held, 500_000_000);
        assert!(account.is_open);

        account.stage_deposit(300_000_000, 30_000).unwrap();
        account.complete_deposit(Some(([2; 32], 12))).unwrap();

        assert_eq!(account.deposited_points, 80_000);
        assert_eq!(account.balance_state, [2; 32]);
        assert_eq!(account.balance_nonce, 12);
        assert!(!account.pending);
    }

    #[test]
    fn aborted_deposit_keeps_the_old_balance() {
        let mut account = open_account();
        account.store_balance([3; 32], 5);
        account.deposited_points = 1_000;

        account.stage_deposit(10_000_000, 1_000).unwrap();
        let refund = account.complete_deposit(None).unwrap();

        assert_eq!(refund, 10_000_000);
        assert_eq!(account.balance_state, [3; 32]);
        assert_eq!(account.deposited_points, 1_000);
        assert_eq!(account.pending_lamports, 0);
        assert!(!account.pending);
    }
}
