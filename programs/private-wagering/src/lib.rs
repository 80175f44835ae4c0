#![allow(ambiguous_glob_reexports)]

use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod exchange;
pub mod instructions;
pub mod payout;
pub mod state;
pub mod wager;

pub use error::ErrorCode;
pub use instructions::*;
pub use state::*;

pub const COMP_DEF_OFFSET_OPEN_BALANCE: u32 = comp_def_offset("open_balance");
pub const COMP_DEF_OFFSET_CREDIT_POINTS: u32 = comp_def_offset("credit_points");
pub const COMP_DEF_OFFSET_INIT_BOOK: u32 = comp_def_offset("init_book");
pub const COMP_DEF_OFFSET_PLACE_BET: u32 = comp_def_offset("place_bet");
pub const COMP_DEF_OFFSET_REVEAL_TOTAL: u32 = comp_def_offset("reveal_total");
pub const COMP_DEF_OFFSET_SETTLE_WAGER: u32 = comp_def_offset("settle_wager");

declare_id!("11111111111111111111111111111111");

#[arcium_program]
pub mod private_wagering {
    use super::*;

    // ================================================================
    // Computation Definition Initializers
    // ================================================================

    pub fn init_open_balance_comp_def(ctx: Context<InitOpenBalanceCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_credit_points_comp_def(ctx: Context<InitCreditPointsCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_book_comp_def(ctx: Context<InitBookCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_place_bet_comp_def(ctx: Context<InitPlaceBetCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_reveal_total_comp_def(ctx: Context<InitRevealTotalCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    pub fn init_settle_wager_comp_def(ctx: Context<InitSettleWagerCompDef>) -> Result<()> {
        init_comp_def(ctx.accounts, None, None)?;
        Ok(())
    }

    // ================================================================
    // Ledger
    // ================================================================

    /// The signer becomes the operator. `points_per_sol` defaults to
    /// 100 000 points per SOL.
    pub fn initialize_ledger(
        ctx: Context<InitializeLedger>,
        points_per_sol: Option<u64>,
        no_winner_policy: NoWinnerPolicy,
    ) -> Result<()> {
        instructions::initialize_ledger(ctx, points_per_sol, no_winner_policy)
    }

    pub fn update_ledger_config(
        ctx: Context<UpdateLedgerConfig>,
        points_per_sol: Option<u64>,
        no_winner_policy: Option<NoWinnerPolicy>,
    ) -> Result<()> {
        instructions::update_ledger_config(ctx, points_per_sol, no_winner_policy)
    }

    pub fn withdraw_deposits(ctx: Context<WithdrawDeposits>, lamports: u64) -> Result<()> {
        instructions::withdraw_deposits(ctx, lamports)
    }

    // ================================================================
    // Points
    // ================================================================

    pub fn open_points_account(
        ctx: Context<OpenPointsAccount>,
        computation_offset: u64,
        lamports: u64,
        encryption_pubkey: [u8; 32],
        nonce: u128,
    ) -> Result<()> {
        instructions::open_points_account(ctx, computation_offset, lamports, encryption_pubkey, nonce)
    }

    #[arcium_callback(encrypted_ix = "open_balance")]
    pub fn open_balance_callback(
        ctx: Context<OpenBalanceCallback>,
        output: SignedComputationOutputs<OpenBalanceOutput>,
    ) -> Result<()> {
        instructions::open_balance_callback(ctx, output)
    }

    pub fn deposit_points(
        ctx: Context<DepositPoints>,
        computation_offset: u64,
        lamports: u64,
    ) -> Result<()> {
        instructions::deposit_points(ctx, computation_offset, lamports)
    }

    #[arcium_callback(encrypted_ix = "credit_points")]
    pub fn credit_points_callback(
        ctx: Context<CreditPointsCallback>,
        output: SignedComputationOutputs<CreditPointsOutput>,
    ) -> Result<()> {
        instructions::credit_points_callback(ctx, output)
    }

    // ================================================================
    // Match Lifecycle
    // ================================================================

    /// Operator only. Betting runs over `[betting_open, betting_close)`.
    pub fn create_match(
        ctx: Context<CreateMatch>,
        computation_offset: u64,
        home_team: String,
        away_team: String,
        match_name: String,
        betting_open: i64,
        betting_close: i64,
        event_time: i64,
        nonce: u128,
    ) -> Result<()> {
        instructions::create_match(
            ctx,
            computation_offset,
            home_team,
            away_team,
            match_name,
            betting_open,
            betting_close,
            event_time,
            nonce,
        )
    }

    #[arcium_callback(encrypted_ix = "init_book")]
    pub fn init_book_callback(
        ctx: Context<InitBookCallback>,
        output: SignedComputationOutputs<InitBookOutput>,
    ) -> Result<()> {
        instructions::init_book_callback(ctx, output)
    }

    /// Operator only. Re-queues a book whose initialisation aborted.
    pub fn retry_init_book(
        ctx: Context<RetryInitBook>,
        computation_offset: u64,
        match_id: u64,
        nonce: u128,
    ) -> Result<()> {
        instructions::retry_init_book(ctx, computation_offset, match_id, nonce)
    }

    /// Operator only. `result`: 1 home win, 2 away win, 3 draw.
    pub fn finish_match(ctx: Context<FinishMatch>, match_id: u64, result: u8) -> Result<()> {
        instructions::finish_match(ctx, match_id, result)
    }

    // ================================================================
    // Betting
    // ================================================================

    pub fn place_bet(
        ctx: Context<PlaceBet>,
        computation_offset: u64,
        match_id: u64,
        encrypted_direction: [u8; 32],
        encrypted_units: [u8; 32],
        encryption_pubkey: [u8; 32],
        nonce: u128,
    ) -> Result<()> {
        instructions::place_bet(
            ctx,
            computation_offset,
            match_id,
            encrypted_direction,
            encrypted_units,
            encryption_pubkey,
            nonce,
        )
    }

    #[arcium_callback(encrypted_ix = "place_bet")]
    pub fn place_bet_callback(
        ctx: Context<PlaceBetCallback>,
        output: SignedComputationOutputs<PlaceBetOutput>,
    ) -> Result<()> {
        instructions::place_bet_callback(ctx, output)
    }

    // ================================================================
    // Reveal & Settlement
    // ================================================================

    /// Requests ONE of the four totals (`slot`). Clients call it once per
    /// `RevealSlot::TOTALS` entry, each with its own `computation_offset`;
    /// settlement unlocks only after all four have called back.
    pub fn request_totals_reveal(
        ctx: Context<RequestTotalsReveal>,
        computation_offset: u64,
        match_id: u64,
        slot: RevealSlot,
    ) -> Result<()> {
        instructions::request_totals_reveal(ctx, computation_offset, match_id, slot)
    }

    #[arcium_callback(encrypted_ix = "reveal_total")]
    pub fn reveal_total_callback(
        ctx: Context<RevealTotalCallback>,
        output: SignedComputationOutputs<RevealTotalOutput>,
    ) -> Result<()> {
        instructions::reveal_total_callback(ctx, output)
    }

    pub fn settle_bet(
        ctx: Context<SettleBet>,
        computation_offset: u64,
        match_id: u64,
    ) -> Result<()> {
        instructions::settle_bet(ctx, computation_offset, match_id)
    }

    #[arcium_callback(encrypted_ix = "settle_wager")]
    pub fn settle_wager_callback(
        ctx: Context<SettleWagerCallback>,
        output: SignedComputationOutputs<SettleWagerOutput>,
    ) -> Result<()> {
        instructions::settle_wager_callback(ctx, output)
    }
}
