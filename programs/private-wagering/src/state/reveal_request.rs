use anchor_lang::prelude::*;

use super::RevealSlot;
use crate::error::ErrorCode;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub enum RequestStatus {
    #[default]
    Outstanding,
    Fulfilled,
    Failed,
}

/// Durable record of one queued reveal, keyed by its computation offset.
/// The callback that resolves it must present this record.
#[account]
#[derive(InitSpace, Default)]
pub struct RevealRequest {
    pub bump: u8,
    pub request_id: u64,
    pub match_id: u64,
    pub slot: RevealSlot,
    /// Requester for a book total, bettor for a wager.
    pub account: Pubkey,
    pub status: RequestStatus,
    pub requested_at: i64,
    pub resolved_at: i64,
}

impl RevealRequest {
    pub fn open(
        &mut self,
        bump: u8,
        request_id: u64,
        match_id: u64,
        slot: RevealSlot,
        account: Pubkey,
        now: i64,
    ) {
        self.bump = bump;
        self.request_id = request_id;
        self.match_id = match_id;
        self.slot = slot;
        self.account = account;
        self.status = RequestStatus::Outstanding;
        self.requested_at = now;
        self.resolved_at = 0;
    }

    pub fn ensure_outstanding_for(&self, match_id: u64) -> Result<()> {
        require!(
            self.status == RequestStatus::Outstanding && self.match_id == match_id,
            ErrorCode::UnknownOrStaleRequest
        );
        Ok(())
    }

    pub fn ensure_wager_of(&self, match_id: u64, owner: &Pubkey) -> Result<()> {
        self.ensure_outstanding_for(match_id)?;
        require!(
            self.slot == RevealSlot::Wager && self.account == *owner,
            ErrorCode::UnknownOrStaleRequest
        );
        Ok(())
    }

    pub fn fulfil(&mut self, now: i64) {
        self.status = RequestStatus::Fulfilled;
        self.resolved_at = now;
    }

    pub fn fail(&mut self, now: i64) {
        self.status = RequestStatus::Failed;
        self.resolved_at = now;
    }
}
