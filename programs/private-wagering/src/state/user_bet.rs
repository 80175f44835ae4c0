use anchor_lang::prelude::*;

use super::ComputationLock;
use crate::error::ErrorCode;

/// One account's position on one match.
#[account]
#[derive(InitSpace, Default)]
pub struct UserBet {
    pub bump: u8,
    /// Must stay first: `Enc<Mxe, Position>` (direction, units).
    pub position_state: [[u8; 32]; 2],
    pub position_nonce: u128,
    pub match_id: u64,
    pub owner: Pubkey,
    /// Wagers that reached the book. Zero until the first callback lands.
    pub wager_count: u32,
    pub pending: bool,
    pub settle_requested: bool,
    pub settled: bool,
    pub revealed_direction: u8,
    pub revealed_units: u64,
    pub payout: u64,
}

impl ComputationLock for UserBet {
    fn pending_flag(&mut self) -> &mut bool {
        &mut self.pending
    }
}

impl UserBet {
    /// Fills in identity on the first wager; later wagers leave it untouched.
    pub fn open(&mut self, bump: u8, match_id: u64, owner: Pubkey) {
        if self.owner == Pubkey::default() {
            self.bump = bump;
            self.match_id = match_id;
            self.owner = owner;
        }
    }

    /// Whether the cluster must start from an empty position.
    pub fn is_first_wager(&self) -> bool {
        self.wager_count == 0
    }

    /// Infallible: runs inside a callback after the cluster has debited the bettor.
    pub fn record_wager(&mut self, position: [[u8; 32]; 2], nonce: u128) {
        self.position_state = position;
        self.position_nonce = nonce;
        self.wager_count = self.wager_count.saturating_add(1);
    }

    pub fn ensure_has_wager(&self) -> Result<()> {
        require!(self.wager_count > 0, ErrorCode::NoBet);
        Ok(())
    }

    pub fn begin_settlement(&mut self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.owner, ErrorCode::Unauthorized);
        self.ensure_has_wager()?;
        require!(!self.settled, ErrorCode::AlreadySettled);
        require!(!self.settle_requested, ErrorCode::RevealAlreadyRequested);
        self.lock()?;
        self.settle_requested = true;
        Ok(())
    }

    /// Marks the position settled. Monotone: a settled bet never settles again.
    pub fn complete_settlement(&mut self, direction: u8, units: u64, payout: u64) -> Result<()> {
        require!(!self.settled, ErrorCode::AlreadySettled);
        self.revealed_direction = direction;
        self.revealed_units = units;
        self.payout = payout;
        self.settled = true;
        self.settle_requested = false;
        self.release();
        Ok(())
    }

    pub fn abandon_settlement(&mut self) {
        self.settle_requested = false;
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(owner: Pubkey) -> UserBet {
        let mut bet = UserBet::default();
        bet.open(254, 0, owner);
        bet.record_wager([[1; 32], [2; 32]], 42);
        bet
    }

    #[test]
    fn identity_is_fixed_by_the_first_wager() {
        let first = Pubkey::new_unique();
        let mut bet = UserBet::default();
        assert!(bet.is_first_wager());

        bet.open(250, 3, first);
        bet.record_wager([[1; 32], [2; 32]], 1);
        bet.open(1, 9, Pubkey::new_unique());

        assert_eq!(bet.owner, first);
        assert_eq!(bet.match_id, 3);
        assert!(!bet.is_first_wager());
    }

    #[test]
    fn repeated_wagers_accumulate_into_one_record() {
        let owner = Pubkey::new_unique();
        let mut bet = placed(owner);
        bet.record_wager([[3; 32], [4; 32]], 43);
        assert_eq!(bet.wager_count, 2);
        assert_eq!(bet.position_state, [[3; 32], [4; 32]]);
        assert_eq!(bet.position_nonce, 43);
    }

    #[test]
    fn wager_count_saturates_instead_of_failing() {
        let mut bet = placed(Pubkey::new_unique());
        bet.wager_count = u32::MAX;
        bet.record_wager([[5; 32], [6; 32]], 44);
        assert_eq!(bet.wager_count, u32::MAX);
        assert_eq!(bet.position_state, [[5; 32], [6; 32]]);
    }

    #[test]
    fn only_the_owner_settles() {
        let mut bet = placed(Pubkey::new_unique());
        assert_eq!(
            bet.begin_settlement(&Pubkey::new_unique()).unwrap_err(),
            ErrorCode::Unauthorized.into()
        );
        assert!(!bet.settle_requested);
    }

    #[test]
    fn empty_record_has_no_bet() {
        let owner = Pubkey::new_unique();
        let mut bet = UserBet::default();
        bet.open(1, 0, owner);
        assert_eq!(bet.begin_settlement(&owner).unwrap_err(), ErrorCode::NoBet.into());
    }

    #[test]
    fn settlement_happens_once() {
        let owner = Pubkey::new_unique();
        let mut bet = placed(owner);

        bet.begin_settlement(&owner).unwrap();
        assert_eq!(
            bet.begin_settlement(&owner).unwrap_err(),
            ErrorCode::RevealAlreadyRequested.into()
        );

        bet.complete_settlement(1, 5, 500).unwrap();
        assert!(bet.settled);
        assert_eq!(bet.payout, 500);

        assert_eq!(
            bet.begin_settlement(&owner).unwrap_err(),
            ErrorCode::AlreadySettled.into()
        );
        assert_eq!(
            bet.complete_settlement(1, 5, 500).unwrap_err(),
            ErrorCode::AlreadySettled.into()
        );
        assert_eq!(bet.payout, 500);
    }

    #[test]
    fn losing_settlement_is_still_final() {
        let owner = Pubkey::new_unique();
        let mut bet = placed(owner);
        bet.begin_settlement(&owner).unwrap();
        bet.complete_settlement(2, 3, 0).unwrap();
        assert!(bet.settled);
        assert_eq!(
            bet.begin_settlement(&owner).unwrap_err(),
            ErrorCode::AlreadySettled.into()
        );
    }

    #[test]
    fn aborted_settlement_can_be_retried() {
        let owner = Pubkey::new_unique();
        let mut bet = placed(owner);
        bet.begin_settlement(&owner).unwrap();
        bet.abandon_settlement();

        assert!(!bet.settled);
        assert!(bet.begin_settlement(&owner).is_ok());
    }

    #[test]
    fn settlement_waits_for_in_flight_wager() {
        let owner = Pubkey::new_unique();
        let mut bet = placed(owner);
        bet.lock().unwrap();
        assert_eq!(
            bet.begin_settlement(&owner).unwrap_err(),
            ErrorCode::ComputationPending.into()
        );
        assert!(!bet.settle_requested);
    }
}
