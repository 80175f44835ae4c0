use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Cluster not set")]
    ClusterNotSet,
    #[msg("Caller is not allowed to perform this action")]
    Unauthorized,
    #[msg("Match not found")]
    NotFound,
    #[msg("No wager recorded for this account on this match")]
    NoBet,
    #[msg("Betting must open in the future and close after it opens")]
    InvalidSchedule,
    #[msg("Result must be home win, away win or draw")]
    InvalidResult,
    #[msg("Name is empty or too long")]
    InvalidName,
    #[msg("Betting is not open for this match")]
    BettingNotOpen,
    #[msg("Match is not finished")]
    NotFinished,
    #[msg("Match already finished")]
    AlreadyFinished,
    #[msg("A reveal for this value is already outstanding or complete")]
    RevealAlreadyRequested,
    #[msg("Bet book totals have not been revealed")]
    TotalsNotRevealed,
    #[msg("Callback does not match an outstanding request")]
    UnknownOrStaleRequest,
    #[msg("Bet already settled")]
    AlreadySettled,
    #[msg("Ciphertext was not produced for this account")]
    InvalidProof,
    #[msg("A computation on this record is still in flight")]
    ComputationPending,
    #[msg("Bet book is already initialised")]
    BookAlreadyReady,
    #[msg("Points account already opened")]
    AccountAlreadyOpen,
    #[msg("Points account has not been opened")]
    AccountNotOpen,
    #[msg("Deposit converts to zero points")]
    DepositTooSmall,
    #[msg("Deposit rate must be positive")]
    InvalidRate,
    #[msg("Vault cannot cover this withdrawal")]
    InsufficientVaultFunds,
    #[msg("Math overflow")]
    MathOverflow,
}
