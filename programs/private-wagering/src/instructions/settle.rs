use anchor_lang::prelude::*;
use arcium_anchor::prelude::*;
use crate::{ArciumSignerAccount, ID, ID_CONST};
use arcium_client::idl::arcium::types::CallbackAccount;

use crate::constants::{
    BALANCE_CIPHERTEXT_LEN, BET_SEED, BOOK_SEED, CIPHERTEXT_OFFSET, MATCH_SEED, POINTS_SEED,
    POSITION_CIPHERTEXT_LEN, REVEAL_SEED, STAKE_UNIT,
};
use crate::error::ErrorCode;
use crate::events::{BetSettledEvent, ComputationAbortedEvent, ComputationKind};
use crate::payout::settlement_payout;
use crate::state::{
    BetBook, ComputationLock, MatchAccount, NoWinnerPolicy, PointsAccount, RevealRequest,
    RevealSlot, UserBet,
};
use crate::wager;
use crate::COMP_DEF_OFFSET_SETTLE_WAGER;

#[queue_computation_accounts("settle_wager", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64, match_id: u64)]
pub struct SettleBet<'info> {
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
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_SETTLE_WAGER))]
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
    // Seeded by the recorded owner so a foreign bet resolves and is refused
    // with Unauthorized rather than a seeds mismatch.
    #[account(
        mut,
        seeds = [BET_SEED, match_id.to_le_bytes().as_ref(), user_bet.owner.as_ref()],
        bump = user_bet.bump,
    )]
    pub user_bet: Box<Account<'info, UserBet>>,
    #[account(
        init, payer = payer,
        space = 8 + RevealRequest::INIT_SPACE,
        seeds = [REVEAL_SEED, computation_offset.to_le_bytes().as_ref()],
        bump,
    )]
    pub reveal_request: Box<Account<'info, RevealRequest>>,
}

/// Settle the caller's own position on a finished, fully revealed match.
///
/// The cluster reveals the position, computes the payout from the public
/// totals and credits it to the encrypted balance in the same step.
pub fn settle_bet(ctx: Context<SettleBet>, computation_offset: u64, match_id: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let caller = ctx.accounts.payer.key();

    let match_acc = &ctx.accounts.match_acc;
    let user_bet = &mut ctx.accounts.user_bet;
    require_keys_eq!(caller, user_bet.owner, ErrorCode::Unauthorized);
    user_bet.ensure_has_wager()?;
    match_acc.ensure_finished()?;
    let totals = ctx.accounts.book_acc.revealed_totals()?;
    let winning_total = totals.winning_total(match_acc.result)?;
    let pool_points = totals.pool_points(STAKE_UNIT)?;

    user_bet.begin_settlement(&caller)?;
    let points = &mut ctx.accounts.points_account;
    points.ensure_open()?;
    points.lock()?;

    ctx.accounts.reveal_request.open(
        ctx.bumps.reveal_request,
        computation_offset,
        match_id,
        RevealSlot::Wager,
        caller,
        now,
    );

    // settle_wager(position_ctxt: Enc<Mxe, Position>, balance_ctxt: Enc<Shared, u64>,
    //              result: u8, winning_total: u64, pool_points: u64, stake_unit: u64,
    //              refund_without_winners: bool)
    let args = ArgBuilder::new()
        .plaintext_u128(user_bet.position_nonce)
        .account(user_bet.key(), CIPHERTEXT_OFFSET, POSITION_CIPHERTEXT_LEN)
        .x25519_pubkey(points.encryption_pubkey)
        .plaintext_u128(points.balance_nonce)
        .account(points.key(), CIPHERTEXT_OFFSET, BALANCE_CIPHERTEXT_LEN)
        .plaintext_u8(match_acc.result.code())
        .plaintext_u64(winning_total)
        .plaintext_u64(pool_points)
        .plaintext_u64(STAKE_UNIT)
        .plaintext_bool(match_acc.no_winner_policy == NoWinnerPolicy::RefundStake)
        .build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![SettleWagerCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[
                CallbackAccount {
                    pubkey: ctx.accounts.match_acc.key(),
                    is_writable: false,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.book_acc.key(),
                    is_writable: false,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.points_account.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.user_bet.key(),
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

#[callback_accounts("settle_wager")]
#[derive(Accounts)]
pub struct SettleWagerCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_SETTLE_WAGER))]
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
    pub match_acc: Box<Account<'info, MatchAccount>>,
    #[account(constraint = book_acc.match_id == match_acc.id @ ErrorCode::UnknownOrStaleRequest)]
    pub book_acc: Box<Account<'info, BetBook>>,
    #[account(mut)]
    pub points_account: Box<Account<'info, PointsAccount>>,
    #[account(
        mut,
        constraint = user_bet.match_id == match_acc.id @ ErrorCode::UnknownOrStaleRequest,
        constraint = user_bet.owner == points_account.owner @ ErrorCode::UnknownOrStaleRequest,
    )]
    pub user_bet: Box<Account<'info, UserBet>>,
    #[account(mut)]
    pub reveal_request: Box<Account<'info, RevealRequest>>,
}

pub fn settle_wager_callback(
    ctx: Context<SettleWagerCallback>,
    output: SignedComputationOutputs<SettleWagerOutput>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let match_acc = &ctx.accounts.match_acc;
    let points = &mut ctx.accounts.points_account;
    let user_bet = &mut ctx.accounts.user_bet;
    let request = &mut ctx.accounts.reveal_request;
    request.ensure_wager_of(match_acc.id, &user_bet.owner)?;

    let o = match output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    ) {
        Ok(SettleWagerOutput { field_0 }) => field_0,
        Err(_) => {
            abandon_settlement(points, user_bet, request, now);
            msg!("Settlement of match {} aborted, retry allowed", match_acc.id);
            emit!(ComputationAbortedEvent {
                kind: ComputationKind::SettleWager,
                account: user_bet.owner,
                match_id: Some(match_acc.id),
            });
            return Ok(());
        }
    };

    let revealed = RevealedSettlement {
        direction: o.field_1,
        units: o.field_2,
        payout: o.field_3,
        balance: o.field_0.ciphertexts[0],
        balance_nonce: o.field_0.nonce,
    };
    let (direction, units, payout) = (revealed.direction, revealed.units, revealed.payout);

    if !land_settlement(
        match_acc,
        &ctx.accounts.book_acc,
        points,
        user_bet,
        request,
        revealed,
        now,
    ) {
        msg!(
            "Settlement of match {} dropped: payout {} disagrees with the revealed totals",
            match_acc.id,
            payout
        );
        emit!(ComputationAbortedEvent {
            kind: ComputationKind::SettleWager,
            account: user_bet.owner,
            match_id: Some(match_acc.id),
        });
        return Ok(());
    }

    msg!(
        "Settled match {} for {}: {} units on {}, payout {}",
        match_acc.id,
        user_bet.owner,
        units,
        direction,
        payout
    );
    emit!(BetSettledEvent {
        request_id: request.request_id,
        match_id: match_acc.id,
        bettor: user_bet.owner,
        direction,
        units,
        payout,
    });

    Ok(())
}

/// Settlement values the cluster revealed for one position.
#[derive(Clone, Copy, Debug)]
struct RevealedSettlement {
    direction: u8,
    units: u64,
    payout: u64,
    balance: [u8; 32],
    balance_nonce: u128,
}

/// Releases everything `settle_bet` locked. The bet can be settled again.
fn abandon_settlement(
    points: &mut PointsAccount,
    user_bet: &mut UserBet,
    request: &mut RevealRequest,
    now: i64,
) {
    user_bet.abandon_settlement();
    points.release();
    request.fail(now);
}

/// Credits a revealed settlement when its payout agrees with the public
/// totals, otherwise abandons it. Never fails: an error here would revert
/// the lock releases along with everything else.
fn land_settlement(
    match_acc: &MatchAccount,
    book: &BetBook,
    points: &mut PointsAccount,
    user_bet: &mut UserBet,
    request: &mut RevealRequest,
    revealed: RevealedSettlement,
    now: i64,
) -> bool {
    let expected = book.revealed_totals().and_then(|totals| {
        settlement_payout(
            revealed.direction,
            revealed.units,
            match_acc.result,
            &totals,
            STAKE_UNIT,
            match_acc.no_winner_policy,
        )
    });
    let agrees = wager::is_settleable(revealed.direction, revealed.units)
        && matches!(expected, Ok(value) if value == revealed.payout);

    let landed = agrees
        && user_bet
            .complete_settlement(revealed.direction, revealed.units, revealed.payout)
            .is_ok();
    if !landed {
        abandon_settlement(points, user_bet, request, now);
        return false;
    }

    points.store_balance(revealed.balance, revealed.balance_nonce);
    points.release();
    request.fulfil(now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RequestStatus;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        match_acc: MatchAccount,
        book: BetBook,
        points: PointsAccount,
        user_bet: UserBet,
        request: RevealRequest,
    }

    /// X staked 3 units on home, Y 2 units on away, the away side won.
    /// The fixture is Y's settlement, queued and waiting for its callback.
    fn away_win_settlement_in_flight() -> Fixture {
        let bettor = Pubkey::new_unique();

        let mut match_acc = MatchAccount {
            id: 4,
            ..Default::default()
        };
        match_acc.finish(2, NoWinnerPolicy::Unclaimable, NOW).unwrap();

        let mut book = BetBook {
            is_ready: true,
            match_id: 4,
            ..Default::default()
        };
        for (slot, value) in [
            (RevealSlot::HomeTotal, 3),
            (RevealSlot::AwayTotal, 2),
            (RevealSlot::DrawTotal, 0),
            (RevealSlot::AggregateTotal, 5),
        ] {
            book.begin_reveal(slot).unwrap();
            book.record_total(slot, value).unwrap();
        }

        let mut points = PointsAccount {
            is_open: true,
            owner: bettor,
            balance_state: [1; 32],
            balance_nonce: 10,
            ..Default::default()
        };
        points.lock().unwrap();

        let mut user_bet = UserBet::default();
        user_bet.open(255, 4, bettor);
        user_bet.record_wager([[2; 32], [3; 32]], 7);
        user_bet.begin_settlement(&bettor).unwrap();

        let mut request = RevealRequest::default();
        request.open(254, 99, 4, RevealSlot::Wager, bettor, NOW);

        Fixture {
            match_acc,
            book,
            points,
            user_bet,
            request,
        }
    }

    fn revealed(payout: u64) -> RevealedSettlement {
        RevealedSettlement {
            direction: 2,
            units: 2,
            payout,
            balance: [8; 32],
            balance_nonce: 11,
        }
    }

    fn land(f: &mut Fixture, payout: u64) -> bool {
        land_settlement(
            &f.match_acc,
            &f.book,
            &mut f.points,
            &mut f.user_bet,
            &mut f.request,
            revealed(payout),
            NOW + 60,
        )
    }

    #[test]
    fn agreeing_payout_is_credited_once() {
        let mut f = away_win_settlement_in_flight();
        assert!(land(&mut f, 500));

        assert!(f.user_bet.settled);
        assert_eq!(f.user_bet.payout, 500);
        assert_eq!(f.user_bet.revealed_direction, 2);
        assert_eq!(f.points.balance_state, [8; 32]);
        assert_eq!(f.points.balance_nonce, 11);
        assert!(!f.points.pending);
        assert!(!f.user_bet.pending);
        assert_eq!(f.request.status, RequestStatus::Fulfilled);
        let owner = f.user_bet.owner;
        assert_eq!(
            f.user_bet.begin_settlement(&owner).unwrap_err(),
            ErrorCode::AlreadySettled.into()
        );
    }

    #[test]
    fn disagreeing_payout_releases_every_lock() {
        let mut f = away_win_settlement_in_flight();
        assert!(!land(&mut f, 400));

        assert!(!f.user_bet.settled);
        assert!(!f.user_bet.settle_requested);
        assert!(!f.user_bet.pending);
        assert!(!f.points.pending);
        assert_eq!(f.points.balance_state, [1; 32]);
        assert_eq!(f.points.balance_nonce, 10);
        assert_eq!(f.request.status, RequestStatus::Failed);
        assert_eq!(f.request.resolved_at, NOW + 60);

        // The account can deposit and settle again.
        assert!(f.points.stage_deposit(1_000_000_000, 100_000).is_ok());
        let owner = f.user_bet.owner;
        assert!(f.user_bet.begin_settlement(&owner).is_ok());
    }

    #[test]
    fn losing_position_settles_for_zero() {
        let mut f = away_win_settlement_in_flight();
        let lost = RevealedSettlement {
            direction: 1,
            units: 3,
            payout: 0,
            balance: [8; 32],
            balance_nonce: 11,
        };
        assert!(land_settlement(
            &f.match_acc,
            &f.book,
            &mut f.points,
            &mut f.user_bet,
            &mut f.request,
            lost,
            NOW + 60,
        ));
        assert!(f.user_bet.settled);
        assert_eq!(f.user_bet.payout, 0);
        assert!(!f.points.pending);
    }

    #[test]
    fn position_without_an_outcome_is_not_settled() {
        let mut f = away_win_settlement_in_flight();
        let stray = RevealedSettlement {
            direction: 0,
            units: 3,
            payout: 0,
            balance: [8; 32],
            balance_nonce: 11,
        };
        assert!(!land_settlement(
            &f.match_acc,
            &f.book,
            &mut f.points,
            &mut f.user_bet,
            &mut f.request,
            stray,
            NOW + 60,
        ));
        assert!(!f.user_bet.settled);
        assert!(!f.points.pending);
        assert_eq!(f.points.balance_state, [1; 32]);
    }

    #[test]
    fn unrevealed_totals_never_credit() {
        let mut f = away_win_settlement_in_flight();
        f.book.totals_revealed = false;
        assert!(!land(&mut f, 500));
        assert!(!f.points.pending);
        assert_eq!(f.request.status, RequestStatus::Failed);
    }
}
