use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;
use crate::{ArciumSignerAccount, ID, ID_CONST};
use arcium_client::idl::arcium::types::CallbackAccount;

use crate::constants::{BOOK_CIPHERTEXT_LEN, BOOK_SEED, CIPHERTEXT_OFFSET, MATCH_SEED, REVEAL_SEED};
use crate::error::ErrorCode;
use crate::events::{
    ComputationAbortedEvent, ComputationKind, RevealRequestedEvent, TotalRevealedEvent,
    TotalsRevealedEvent,
};
use crate::state::{BetBook, MatchAccount, RevealRequest, RevealSlot};
use crate::COMP_DEF_OFFSET_REVEAL_TOTAL;

#[queue_computation_accounts("reveal_total", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, match_id: u64)]
pub struct RequestTotalsReveal<'info> {
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
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_REVEAL_TOTAL))]
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
        init, payer = payer,
        space = 8 + RevealRequest::INIT_SPACE,
        seeds = [REVEAL_SEED, computation_offset.to_le_bytes().as_ref()],
        bump,
    )]
    pub reveal_request: Box<Account<'info, RevealRequest>>,
}

/// Ask the cluster to decrypt one total of a finished match.
///
/// Anyone may call this. It must be called once for each of the four
/// slots in `RevealSlot::TOTALS` (home, away, draw, aggregate), each call
/// with its own `computation_offset`, which is the request id. A slot can be
/// requested again only after its earlier request failed. Totals stay
/// unavailable to settlement until all four have called back.
pub fn request_totals_reveal(
    ctx: Context<RequestTotalsReveal>,
    computation_offset: u64,
    match_id: u64,
    slot: RevealSlot,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.match_acc.ensure_finished()?;

    let index = slot.total_index()?;
    let book = &mut ctx.accounts.book_acc;
    book.begin_reveal(slot)?;

    let requester = ctx.accounts.payer.key();
    ctx.accounts.reveal_request.open(
        ctx.bumps.reveal_request,
        computation_offset,
        match_id,
        slot,
        requester,
        now,
    );

    emit!(RevealRequestedEvent {
        request_id: computation_offset,
        match_id,
        slot,
        requester,
    });

    // reveal_total(book_ctxt: Enc<Mxe, BookTotals>, slot: u8)
    let args = ArgBuilder::new()
        .plaintext_u128(book.totals_nonce)
        .account(book.key(), CIPHERTEXT_OFFSET, BOOK_CIPHERTEXT_LEN)
        .plaintext_u8(index)
        .build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![RevealTotalCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[
                CallbackAccount {
                    pubkey: ctx.accounts.book_acc.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.reveal_request.key(),
                    is_writable: true,
                },
            ],
        )?],
        1,
        0,
    )?;

    Ok(())
}

#[callback_accounts("reveal_total")]
#[derive(Accounts)]
pub struct RevealTotalCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_REVEAL_TOTAL))]
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
    pub reveal_request: Box<Account<'info, RevealRequest>>,
}

pub fn reveal_total_callback(
    ctx: Context<RevealTotalCallback>,
    output: SignedComputationOutputs<RevealTotalOutput>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let book = &mut ctx.accounts.book_acc;
    let request = &mut ctx.accounts.reveal_request;
    request.ensure_outstanding_for(book.match_id)?;

    let value = match output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    ) {
        Ok(RevealTotalOutput { field_0 }) => field_0,
        Err(_) => {
            book.abandon_reveal(request.slot)?;
            request.fail(now);
            msg!(
                "Reveal {} of {:?} for match {} aborted",
                request.request_id,
                request.slot,
                book.match_id
            );
            emit!(ComputationAbortedEvent {
                kind: ComputationKind::RevealTotal,
                account: request.account,
                match_id: Some(book.match_id),
            });
            return Ok(());
        }
    };

    let complete = book.record_total(request.slot, value)?;
    request.fulfil(now);

    emit!(TotalRevealedEvent {
        request_id: request.request_id,
        match_id: book.match_id,
        slot: request.slot,
        value,
    });

    if complete {
        let totals = book.revealed_totals()?;
        msg!(
            "Match {} totals: home {} away {} draw {} aggregate {}",
            book.match_id,
            totals.home,
            totals.away,
            totals.draw,
            totals.aggregate
        );
        emit!(TotalsRevealedEvent {
            match_id: book.match_id,
            home_total: totals.home,
            away_total: totals.away,
            draw_total: totals.draw,
            aggregate_total: totals.aggregate,
        });
    }

    Ok(())
}
