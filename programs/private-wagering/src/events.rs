use anchor_lang::prelude::*;

use crate::state::{MatchResult, NoWinnerPolicy, RevealSlot};

/// Which queued computation a callback was resolving.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComputationKind {
    InitBook,
    OpenBalance,
    CreditPoints,
    PlaceBet,
    RevealTotal,
    SettleWager,
}

#[event]
pub struct LedgerInitializedEvent {
    pub operator: Pubkey,
    pub points_per_sol: u64,
    pub no_winner_policy: NoWinnerPolicy,
}

#[event]
pub struct LedgerConfigUpdatedEvent {
    pub points_per_sol: u64,
    pub no_winner_policy: NoWinnerPolicy,
}

#[event]
pub struct PointsDepositedEvent {
    pub owner: Pubkey,
    pub lamports: u64,
    pub points: u64,
    pub timestamp: i64,
}

#[event]
pub struct DepositsWithdrawnEvent {
    pub operator: Pubkey,
    pub lamports: u64,
}

#[event]
pub struct MatchCreatedEvent {
    pub match_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub match_name: String,
    pub betting_open: i64,
    pub betting_close: i64,
    pub event_time: i64,
}

#[event]
pub struct BookReadyEvent {
    pub match_id: u64,
}

/// Carries neither direction nor size.
#[event]
pub struct BetPlacedEvent {
    pub match_id: u64,
    pub bettor: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct MatchFinishedEvent {
    pub match_id: u64,
    pub result: MatchResult,
    pub no_winner_policy: NoWinnerPolicy,
}

#[event]
pub struct RevealRequestedEvent {
    pub request_id: u64,
    pub match_id: u64,
    pub slot: RevealSlot,
    pub requester: Pubkey,
}

#[event]
pub struct TotalRevealedEvent {
    pub request_id: u64,
    pub match_id: u64,
    pub slot: RevealSlot,
    pub value: u64,
}

#[event]
pub struct TotalsRevealedEvent {
    pub match_id: u64,
    pub home_total: u64,
    pub away_total: u64,
    pub draw_total: u64,
    pub aggregate_total: u64,
}

#[event]
pub struct BetSettledEvent {
    pub request_id: u64,
    pub match_id: u64,
    pub bettor: Pubkey,
    pub direction: u8,
    pub units: u64,
    pub payout: u64,
}

#[event]
pub struct ComputationAbortedEvent {
    pub kind: ComputationKind,
    pub account: Pubkey,
    pub match_id: Option<u64>,
}
