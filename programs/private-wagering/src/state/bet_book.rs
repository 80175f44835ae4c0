use anchor_lang::prelude::*;

use super::{ComputationLock, MatchResult};
use crate::error::ErrorCode;

/// Which value a reveal request decrypts.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub enum RevealSlot {
    #[default]
    HomeTotal,
    AwayTotal,
    DrawTotal,
    AggregateTotal,
    /// A single bettor's position, revealed at settlement.
    Wager,
}

/// Bits of `BetBook::revealed_mask` once every total is known.
pub const ALL_TOTALS: u8 = 0b1111;

impl RevealSlot {
    pub const TOTALS: [RevealSlot; 4] = [
        RevealSlot::HomeTotal,
        RevealSlot::AwayTotal,
        RevealSlot::DrawTotal,
        RevealSlot::AggregateTotal,
    ];

    /// Index of the total inside the `BookTotals` circuit struct.
    pub fn total_index(self) -> Result<u8> {
        match self {
            RevealSlot::HomeTotal => Ok(0),
            RevealSlot::AwayTotal => Ok(1),
            RevealSlot::DrawTotal => Ok(2),
            RevealSlot::AggregateTotal => Ok(3),
            RevealSlot::Wager => err!(ErrorCode::UnknownOrStaleRequest),
        }
    }

    fn bit(self) -> Result<u8> {
        Ok(1 << self.total_index()?)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RevealedTotals {
    pub home: u64,
    pub away: u64,
    pub draw: u64,
    pub aggregate: u64,
}

impl RevealedTotals {
    /// Units staked on the result that occurred.
    pub fn winning_total(&self, result: MatchResult) -> Result<u64> {
        match result {
            MatchResult::HomeWin => Ok(self.home),
            MatchResult::AwayWin => Ok(self.away),
            MatchResult::Draw => Ok(self.draw),
            MatchResult::Unset => err!(ErrorCode::NotFinished),
        }
    }

    pub fn pool_points(&self, stake_unit: u64) -> Result<u64> {
        self.aggregate
            .checked_mul(stake_unit)
            .ok_or_else(|| error!(ErrorCode::MathOverflow))
    }
}

/// Per-match encrypted totals plus their revealed plaintext.
#[account]
#[derive(InitSpace, Default)]
pub struct BetBook {
    pub bump: u8,
    /// Must stay first: `Enc<Mxe, BookTotals>` (home, away, draw, total).
    pub totals_state: [[u8; 32]; 4],
    pub totals_nonce: u128,
    pub match_id: u64,
    /// Set once the zeroed totals have been encrypted by the cluster.
    pub is_ready: bool,
    pub pending: bool,
    pub wager_count: u32,
    /// Totals with an outstanding reveal request.
    pub requested_mask: u8,
    /// Totals whose plaintext has been written back.
    pub revealed_mask: u8,
    pub totals_revealed: bool,
    pub home_total: u64,
    pub away_total: u64,
    pub draw_total: u64,
    pub aggregate_total: u64,
}

impl ComputationLock for BetBook {
    fn pending_flag(&mut self) -> &mut bool {
        &mut self.pending
    }
}

impl BetBook {
    /// Reserves the book for an `init_book` computation.
    pub fn begin_init(&mut self) -> Result<()> {
        require!(!self.is_ready, ErrorCode::BookAlreadyReady);
        self.lock()
    }

    pub fn complete_init(&mut self, totals: [[u8; 32]; 4], nonce: u128) {
        self.totals_state = totals;
        self.totals_nonce = nonce;
        self.is_ready = true;
        self.release();
    }

    pub fn ensure_ready(&self) -> Result<()> {
        require!(self.is_ready, ErrorCode::ComputationPending);
        Ok(())
    }

    /// Stores the totals written back by a wager and releases the book.
    pub fn record_wager(&mut self, totals: [[u8; 32]; 4], nonce: u128) {
        self.totals_state = totals;
        self.totals_nonce = nonce;
        self.wager_count = self.wager_count.saturating_add(1);
        self.release();
    }

    /// Reserves a slot for a reveal. The book must be quiet: a wager still in
    /// flight would be missing from the revealed value.
    pub fn begin_reveal(&mut self, slot: RevealSlot) -> Result<()> {
        let bit = slot.bit()?;
        self.ensure_ready()?;
        require!(!self.pending, ErrorCode::ComputationPending);
        require!(
            (self.requested_mask | self.revealed_mask) & bit == 0,
            ErrorCode::RevealAlreadyRequested
        );
        self.requested_mask |= bit;
        Ok(())
    }

    /// Frees a slot whose request failed so it can be requested again.
    pub fn abandon_reveal(&mut self, slot: RevealSlot) -> Result<()> {
        self.requested_mask &= !slot.bit()?;
        Ok(())
    }

    /// Writes back one revealed total. Returns true when this completes the set.
    pub fn record_total(&mut self, slot: RevealSlot, value: u64) -> Result<bool> {
        let bit = slot.bit()?;
        require!(
            self.requested_mask & bit != 0 && self.revealed_mask & bit == 0,
            ErrorCode::UnknownOrStaleRequest
        );

        match slot {
            RevealSlot::HomeTotal => self.home_total = value,
            RevealSlot::AwayTotal => self.away_total = value,
            RevealSlot::DrawTotal => self.draw_total = value,
            RevealSlot::AggregateTotal => self.aggregate_total = value,
            RevealSlot::Wager => return err!(ErrorCode::UnknownOrStaleRequest),
        }
        self.requested_mask &= !bit;
        self.revealed_mask |= bit;
        self.totals_revealed = self.revealed_mask == ALL_TOTALS;
        Ok(self.totals_revealed)
    }

    pub fn revealed_totals(&self) -> Result<RevealedTotals> {
        require!(self.totals_revealed, ErrorCode::TotalsNotRevealed);
        Ok(RevealedTotals {
            home: self.home_total,
            away: self.away_total,
            draw: self.draw_total,
            aggregate: self.aggregate_total,
        })
    }
}
