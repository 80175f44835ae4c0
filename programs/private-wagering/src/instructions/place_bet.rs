use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;
use crate::{ArciumSignerAccount, ID, ID_CONST};
use arcium_client::idl::arcium::types::CallbackAccount;

use crate::constants::{
    BALANCE_CIPHERTEXT_LEN, BET_SEED, BOOK_CIPHERTEXT_LEN, BOOK_SEED, CIPHERTEXT_OFFSET,
    MATCH_SEED, POINTS_SEED, POSITION_CIPHERTEXT_LEN, STAKE_UNIT,
};
use crate::error::ErrorCode;
use crate::events::{BetPlacedEvent, ComputationAbortedEvent, ComputationKind};
use crate::state::{BetBook, ComputationLock, MatchAccount, PointsAccount, UserBet};
use crate::COMP_DEF_OFFSET_PLACE_BET;

#[queue_computation_accounts("place_bet", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, match_id: u64)]
pub struct PlaceBet<'info> {
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
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_PLACE_BET))]
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
        seeds = [MATCH_SEED, match_id.to_le_bytes().as_ref()],
        bump = match_acc.bump,
    )]
    pub match_acc: Box<Account<'info, MatchAccount>>,
    #[account(
        mut,
        seeds = [BOOK_SEED, match_id.to_le_bytes().as_ref()],
        bump = book_acc.bump,
    )]
    pub book_acc: Box<Account<'info, BetBook>>,
    #[account(
        mut,
        seeds = [POINTS_SEED, payer.key().as_ref()],
        bump = points_account.bump,
    )]
    pub points_account: Box<Account<'info, PointsAccount>>,
    #[account(
        init_if_needed, payer = payer,
        space = 8 + UserBet::INIT_SPACE,
        seeds = [BET_SEED, match_id.to_le_bytes().as_ref(), payer.key().as_ref()],
        bump,
    )]
    pub user_bet: Box<Account<'info, UserBet>>,
}

/// Place an encrypted wager on a match.
///
/// `encrypted_direction` and `encrypted_units` are ciphertexts under the
/// bettor's registered x25519 key. Validation (direction, affordability,
/// consistency with an earlier wager) happens inside the cluster; a wager
/// that fails it is applied as zero units and costs nothing.
pub fn place_bet(
    ctx: Context<PlaceBet>,
    computation_offset: u64,
    match_id: u64,
    encrypted_direction: [u8; 32],
    encrypted_units: [u8; 32],
    encryption_pubkey: [u8; 32],
    nonce: u128,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.match_acc.ensure_betting_open(now)?;

    let points = &mut ctx.accounts.points_account;
    points.ensure_open()?;
    points.ensure_key(&encryption_pubkey)?;

    let book = &mut ctx.accounts.book_acc;
    book.ensure_ready()?;
    book.lock()?;
    points.lock()?;

    let user_bet = &mut ctx.accounts.user_bet;
    user_bet.open(ctx.bumps.user_bet, match_id, ctx.accounts.payer.key());
    require!(!user_bet.settled, ErrorCode::AlreadySettled);
    user_bet.lock()?;
    let first_wager = user_bet.is_first_wager();

    // place_bet(wager_ctxt: Enc<Shared, Wager>, balance_ctxt: Enc<Shared, u64>,
    //           book_ctxt: Enc<Mxe, BookTotals>, position_ctxt: Enc<Mxe, Position>,
    //           first_wager: bool, stake_unit: u64)
    let args = ArgBuilder::new()
        .x25519_pubkey(encryption_pubkey)
        .plaintext_u128(nonce)
        .encrypted_u8(encrypted_direction)
        .encrypted_u64(encrypted_units)
        .x25519_pubkey(points.encryption_pubkey)
        .plaintext_u128(points.balance_nonce)
        .account(points.key(), CIPHERTEXT_OFFSET, BALANCE_CIPHERTEXT_LEN)
        .plaintext_u128(book.totals_nonce)
        .account(book.key(), CIPHERTEXT_OFFSET, BOOK_CIPHERTEXT_LEN)
        .plaintext_u128(user_bet.position_nonce)
        .account(user_bet.key(), CIPHERTEXT_OFFSET, POSITION_CIPHERTEXT_LEN)
        .plaintext_bool(first_wager)
        .plaintext_u64(STAKE_UNIT)
        .build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![PlaceBetCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[
                CallbackAccount {
                    pubkey: ctx.accounts.book_acc.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.points_account.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.user_bet.key(),
                    is_writable: true,
                },
            ],
        )?],
        1,
        0,
    )?;

    Ok(())
}

#[callback_accounts("place_bet")]
#[derive(Accounts)]
pub struct PlaceBetCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_PLACE_BET))]
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
    #[account(mut)]
    pub points_account: Box<Account<'info, PointsAccount>>,
    #[account(
        mut,
        constraint = user_bet.match_id == book_acc.match_id @ ErrorCode::UnknownOrStaleRequest,
        constraint = user_bet.owner == points_account.owner @ ErrorCode::UnknownOrStaleRequest,
    )]
    pub user_bet: Box<Account<'info, UserBet>>,
}

pub fn place_bet_callback(
    ctx: Context<PlaceBetCallback>,
    output: SignedComputationOutputs<PlaceBetOutput>,
) -> Result<()> {
    let verified = output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    );

    let book = &mut ctx.accounts.book_acc;
    let points = &mut ctx.accounts.points_account;
    let user_bet = &mut ctx.accounts.user_bet;
    book.release();
    points.release();
    user_bet.release();

    let o = match verified {
        Ok(PlaceBetOutput { field_0 }) => field_0,
        Err(_) => {
            msg!("Wager on match {} aborted, nothing debited", book.match_id);
            emit!(ComputationAbortedEvent {
                kind: ComputationKind::PlaceBet,
                account: user_bet.owner,
                match_id: Some(book.match_id),
            });
            return Ok(());
        }
    };

    points.store_balance(o.field_0.ciphertexts[0], o.field_0.nonce);
    book.record_wager(o.field_1.ciphertexts, o.field_1.nonce);
    user_bet.record_wager(o.field_2.ciphertexts, o.field_2.nonce);

    emit!(BetPlacedEvent {
        match_id: book.match_id,
        bettor: user_bet.owner,
        timestamp: Clock::get().map(|c| c.unix_timestamp).unwrap_or_default(),
    });

    Ok(())
}
