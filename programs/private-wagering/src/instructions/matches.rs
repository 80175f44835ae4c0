use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;
use crate::{ArciumSignerAccount, ID, ID_CONST};
use arcium_client::idl::arcium::types::CallbackAccount;

use crate::constants::{BOOK_SEED, LEDGER_SEED, MATCH_SEED};
use crate::error::ErrorCode;
use crate::events::{
    BookReadyEvent, ComputationAbortedEvent, ComputationKind, MatchCreatedEvent,
    MatchFinishedEvent,
};
use crate::state::{BetBook, ComputationLock, LedgerConfig, MatchAccount, MatchResult};
use crate::COMP_DEF_OFFSET_INIT_BOOK;

// ================================================================
// Match creation
// ================================================================

#[queue_computation_accounts("init_book", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64)]
pub struct CreateMatch<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_BOOK))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        mut,
        seeds = [LEDGER_SEED],
        bump = ledger.bump,
        constraint = ledger.operator == payer.key() @ ErrorCode::Unauthorized,
    )]
    pub ledger: Box<Account<'info, LedgerConfig>>,
    #[account(
        init, payer = payer,
        space = 8 + MatchAccount::INIT_SPACE,
        seeds = [MATCH_SEED, ledger.match_count.to_le_bytes().as_ref()],
        bump,
    )]
    pub match_acc: Box<Account<'info, MatchAccount>>,
    #[account(
        init, payer = payer,
        space = 8 + BetBook::INIT_SPACE,
        seeds = [BOOK_SEED, ledger.match_count.to_le_bytes().as_ref()],
        bump,
    )]
    pub book_acc: Box<Account<'info, BetBook>>,
}

/// Register a match under the next sequential id and queue the encryption
/// of its empty bet book. Bets are refused until the book is ready.
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
    let now = Clock::get()?.unix_timestamp;
    MatchAccount::validate_schedule(now, betting_open, betting_close)?;
    MatchAccount::validate_names(&home_team, &away_team, &match_name)?;

    let match_id = ctx.accounts.ledger.next_match_id()?;

    let match_acc = &mut ctx.accounts.match_acc;
    match_acc.bump = ctx.bumps.match_acc;
    match_acc.id = match_id;
    match_acc.home_team = home_team;
    match_acc.away_team = away_team;
    match_acc.match_name = match_name;
    match_acc.betting_open = betting_open;
    match_acc.betting_close = betting_close;
    match_acc.event_time = event_time;
    match_acc.created_at = now;
    match_acc.is_finished = false;
    match_acc.result = MatchResult::Unset;
    match_acc.result_set_by_operator = false;

    let book = &mut ctx.accounts.book_acc;
    book.bump = ctx.bumps.book_acc;
    book.match_id = match_id;
    book.is_ready = false;
    book.begin_init()?;

    emit!(MatchCreatedEvent {
        match_id,
        home_team: match_acc.home_team.clone(),
        away_team: match_acc.away_team.clone(),
        match_name: match_acc.match_name.clone(),
        betting_open,
        betting_close,
        event_time,
    });

    let args = ArgBuilder::new().plaintext_u128(nonce).build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![InitBookCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[CallbackAccount {
                pubkey: ctx.accounts.book_acc.key(),
                is_writable: true,
            }],
        )?],
        1,
        0,
    )?;

    Ok(())
}

#[callback_accounts("init_book")]
#[derive(Accounts)]
pub struct InitBookCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_BOOK))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(address = ::anchor_lang::solana_program::sysvar::instructions::ID)]
    /// CHECK: instructions_sysvar
    pub instructions_sysvar: AccountInfo<'info>,
    #[account(mut)]
    pub book_acc: Box<Account<'info, BetBook>>,
}

pub fn init_book_callback(
    ctx: Context<InitBookCallback>,
    output: SignedComputationOutputs<InitBookOutput>,
) -> Result<()> {
    let verified = output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    );

    let book = &mut ctx.accounts.book_acc;
    let o = match verified {
        Ok(InitBookOutput { field_0 }) => field_0,
        Err(_) => {
            book.release();
            msg!("Book for match {} not initialised, operator may retry", book.match_id);
            emit!(ComputationAbortedEvent {
                kind: ComputationKind::InitBook,
                account: book.key(),
                match_id: Some(book.match_id),
            });
            return Ok(());
        }
    };

    book.complete_init(o.ciphertexts, o.nonce);

    emit!(BookReadyEvent {
        match_id: book.match_id,
    });

    Ok(())
}

#[queue_computation_accounts("init_book", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, match_id: u64)]
pub struct RetryInitBook<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(
        init_if_needed, space = 9, payer = payer,
        seeds = [&SIGN_PDA_SEED], bump,
        address = derive_sign_pda!(),
    )]
    pub sign_pda_account: Account<'info, ArciumSignerAccount>,
    #[account(address = derive_mxe_pda!())]
    pub mxe_account: Account<'info, MXEAccount>,
    #[account(mut, address = derive_mempool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: mempool_account
    pub mempool_account: UncheckedAccount<'info>,
    #[account(mut, address = derive_execpool_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: executing_pool
    pub executing_pool: UncheckedAccount<'info>,
    #[account(mut, address = derive_comp_pda!(computation_offset, mxe_account, ErrorCode::ClusterNotSet))]
    /// CHECK: computation_account
    pub computation_account: UncheckedAccount<'info>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_INIT_BOOK))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(
        seeds = [LEDGER_SEED],
        bump = ledger.bump,
        constraint = ledger.operator == payer.key() @ ErrorCode::Unauthorized,
    )]
    pub ledger: Box<Account<'info, LedgerConfig>>,
    #[account(
        mut,
        seeds = [BOOK_SEED, match_id.to_le_bytes().as_ref()],
        bump = book_acc.bump,
        constraint = book_acc.match_id == match_id @ ErrorCode::NotFound,
    )]
    pub book_acc: Box<Account<'info, BetBook>>,
}

/// Re-queue the encryption of a book whose `init_book` computation aborted.
pub fn retry_init_book(
    ctx: Context<RetryInitBook>,
    computation_offset: u64,
    match_id: u64,
    nonce: u128,
) -> Result<()> {
    ctx.accounts.book_acc.begin_init()?;
    msg!("Retrying book initialisation for match {}", match_id);

    let args = ArgBuilder::new().plaintext_u128(nonce).build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![InitBookCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[CallbackAccount {
                pubkey: ctx.accounts.book_acc.key(),
                is_writable: true,
            }],
        )?],
        1,
        0,
    )?;

    Ok(())
}

// ================================================================
// Match result
// ================================================================

#[derive(Accounts)]
#[instruction(match_id: u64)]
pub struct FinishMatch<'info> {
    pub operator: Signer<'info>,
    #[account(
        seeds = [LEDGER_SEED],
        bump = ledger.bump,
        constraint = ledger.operator == operator.key() @ ErrorCode::Unauthorized,
    )]
    pub ledger: Account<'info, LedgerConfig>,
    #[account(
        mut,
        seeds = [MATCH_SEED, match_id.to_le_bytes().as_ref()],
        bump = match_acc.bump,
        constraint = match_acc.id == match_id @ ErrorCode::NotFound,
    )]
    pub match_acc: Account<'info, MatchAccount>,
}

/// Declare the result. Betting stops immediately; totals stay encrypted
/// until someone requests their reveal.
pub fn finish_match(ctx: Context<FinishMatch>, match_id: u64, result: u8) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let policy = ctx.accounts.ledger.no_winner_policy;
    let match_acc = &mut ctx.accounts.match_acc;
    match_acc.finish(result, policy, now)?;

    msg!(
        "Match {} ({} v {}) finished: {:?}",
        match_id,
        match_acc.home_team,
        match_acc.away_team,
        match_acc.result
    );

    emit!(MatchFinishedEvent {
        match_id,
        result: match_acc.result,
        no_winner_policy: policy,
    });

    Ok(())
}
