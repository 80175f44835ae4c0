use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use arcium_anchor::prelude::*;
use crate::{ArciumSignerAccount, ID, ID_CONST};
use arcium_client::idl::arcium::types::CallbackAccount;

use super::ledger::pay_from_vault;
use crate::constants::{BALANCE_CIPHERTEXT_LEN, CIPHERTEXT_OFFSET, LEDGER_SEED, POINTS_SEED, VAULT_SEED};
use crate::error::ErrorCode;
use crate::events::{ComputationAbortedEvent, ComputationKind, PointsDepositedEvent};
use crate::exchange::points_for_deposit;
use crate::state::{DepositVault, LedgerConfig, PointsAccount};
use crate::{
    COMP_DEF_OFFSET_CREDIT_POINTS, COMP_DEF_OFFSET_OPEN_BALANCE,
};

// ================================================================
// First deposit
// ================================================================

#[queue_computation_accounts("open_balance", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64)]
pub struct OpenPointsAccount<'info> {
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
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_OPEN_BALANCE))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Box<Account<'info, LedgerConfig>>,
    #[account(mut, seeds = [VAULT_SEED], bump = vault.bump)]
    pub vault: Box<Account<'info, DepositVault>>,
    // init_if_needed so an aborted first deposit can be retried
    #[account(
        init_if_needed, payer = payer,
        space = 8 + PointsAccount::INIT_SPACE,
        seeds = [POINTS_SEED, payer.key().as_ref()],
        bump,
    )]
    pub points_account: Box<Account<'info, PointsAccount>>,
}

/// Open a points account with its first deposit.
///
/// `encryption_pubkey` is the owner's x25519 key; the balance is encrypted
/// to it for the life of the account.
pub fn open_points_account(
    ctx: Context<OpenPointsAccount>,
    computation_offset: u64,
    lamports: u64,
    encryption_pubkey: [u8; 32],
    nonce: u128,
) -> Result<()> {
    let points = points_for_deposit(lamports, ctx.accounts.ledger.points_per_sol)?;

    {
        let account = &mut ctx.accounts.points_account;
        require!(!account.is_open, ErrorCode::AccountAlreadyOpen);
        account.bump = ctx.bumps.points_account;
        account.owner = ctx.accounts.payer.key();
        account.encryption_pubkey = encryption_pubkey;
        account.stage_deposit(lamports, points)?;
    }
    ctx.accounts.vault.hold(lamports)?;

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.payer.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
            },
        ),
        lamports,
    )?;

    // open_balance(owner: Shared, points: u64)
    let args = ArgBuilder::new()
        .x25519_pubkey(encryption_pubkey)
        .plaintext_u128(nonce)
        .plaintext_u64(points)
        .build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![OpenBalanceCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[
                CallbackAccount {
                    pubkey: ctx.accounts.points_account.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.vault.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.payer.key(),
                    is_writable: true,
                },
            ],
        )?],
        1,
        0,
    )?;

    Ok(())
}

#[callback_accounts("open_balance")]
#[derive(Accounts)]
pub struct OpenBalanceCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_OPEN_BALANCE))]
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
    pub points_account: Box<Account<'info, PointsAccount>>,
    #[account(mut, seeds = [VAULT_SEED], bump = vault.bump)]
    pub vault: Box<Account<'info, DepositVault>>,
    /// CHECK: refund target, pinned to the points account owner
    #[account(mut, address = points_account.owner)]
    pub owner: UncheckedAccount<'info>,
}

pub fn open_balance_callback(
    ctx: Context<OpenBalanceCallback>,
    output: SignedComputationOutputs<OpenBalanceOutput>,
) -> Result<()> {
    let credited = match output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    ) {
        Ok(OpenBalanceOutput { field_0 }) => Some((field_0.ciphertexts[0], field_0.nonce)),
        Err(_) => None,
    };

    finish_deposit(
        &mut ctx.accounts.points_account,
        &mut ctx.accounts.vault,
        &ctx.accounts.owner.to_account_info(),
        credited,
        ComputationKind::OpenBalance,
    )
}

// ================================================================
// Further deposits
// ================================================================

#[queue_computation_accounts("credit_points", payer)]
#[derive(Accounts)]
#[instruction(computation_offset: u64)]
pub struct DepositPoints<'info> {
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
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_CREDIT_POINTS))]
    pub comp_def_account: Account<'info, ComputationDefinitionAccount>,
    #[account(mut, address = derive_cluster_pda!(mxe_account, ErrorCode::ClusterNotSet))]
    pub cluster_account: Account<'info, Cluster>,
    #[account(mut, address = ARCIUM_FEE_POOL_ACCOUNT_ADDRESS)]
    pub pool_account: Account<'info, FeePool>,
    #[account(mut, address = ARCIUM_CLOCK_ACCOUNT_ADDRESS)]
    pub clock_account: Account<'info, ClockAccount>,
    pub system_program: Program<'info, System>,
    pub arcium_program: Program<'info, Arcium>,
    #[account(seeds = [LEDGER_SEED], bump = ledger.bump)]
    pub ledger: Box<Account<'info, LedgerConfig>>,
    #[account(mut, seeds = [VAULT_SEED], bump = vault.bump)]
    pub vault: Box<Account<'info, DepositVault>>,
    #[account(
        mut,
        seeds = [POINTS_SEED, payer.key().as_ref()],
        bump = points_account.bump,
    )]
    pub points_account: Box<Account<'info, PointsAccount>>,
}

/// Credit `lamports * rate` points to an already open account.
pub fn deposit_points(
    ctx: Context<DepositPoints>,
    computation_offset: u64,
    lamports: u64,
) -> Result<()> {
    let points = points_for_deposit(lamports, ctx.accounts.ledger.points_per_sol)?;

    {
        let account = &mut ctx.accounts.points_account;
        account.ensure_open()?;
        account.stage_deposit(lamports, points)?;
    }
    ctx.accounts.vault.hold(lamports)?;

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.payer.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
            },
        ),
        lamports,
    )?;

    // credit_points(balance_ctxt: Enc<Shared, u64>, points: u64)
    let args = ArgBuilder::new()
        .x25519_pubkey(ctx.accounts.points_account.encryption_pubkey)
        .plaintext_u128(ctx.accounts.points_account.balance_nonce)
        .account(
            ctx.accounts.points_account.key(),
            CIPHERTEXT_OFFSET,
            BALANCE_CIPHERTEXT_LEN,
        )
        .plaintext_u64(points)
        .build();

    ctx.accounts.sign_pda_account.bump = ctx.bumps.sign_pda_account;

    queue_computation(
        ctx.accounts,
        computation_offset,
        args,
        vec![CreditPointsCallback::callback_ix(
            computation_offset,
            &ctx.accounts.mxe_account,
            &[
                CallbackAccount {
                    pubkey: ctx.accounts.points_account.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.vault.key(),
                    is_writable: true,
                },
                CallbackAccount {
                    pubkey: ctx.accounts.payer.key(),
                    is_writable: true,
                },
            ],
        )?],
        1,
        0,
    )?;

    Ok(())
}

#[callback_accounts("credit_points")]
#[derive(Accounts)]
pub struct CreditPointsCallback<'info> {
    pub arcium_program: Program<'info, Arcium>,
    #[account(address = derive_comp_def_pda!(COMP_DEF_OFFSET_CREDIT_POINTS))]
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
    pub points_account: Box<Account<'info, PointsAccount>>,
    #[account(mut, seeds = [VAULT_SEED], bump = vault.bump)]
    pub vault: Box<Account<'info, DepositVault>>,
    /// CHECK: refund target, pinned to the points account owner
    #[account(mut, address = points_account.owner)]
    pub owner: UncheckedAccount<'info>,
}

pub fn credit_points_callback(
    ctx: Context<CreditPointsCallback>,
    output: SignedComputationOutputs<CreditPointsOutput>,
) -> Result<()> {
    let credited = match output.verify_output(
        &ctx.accounts.cluster_account,
        &ctx.accounts.computation_account,
    ) {
        Ok(CreditPointsOutput { field_0 }) => Some((field_0.ciphertexts[0], field_0.nonce)),
        Err(_) => None,
    };

    finish_deposit(
        &mut ctx.accounts.points_account,
        &mut ctx.accounts.vault,
        &ctx.accounts.owner.to_account_info(),
        credited,
        ComputationKind::CreditPoints,
    )
}

/// Lands a deposit computation. An aborted one hands the lamports back.
fn finish_deposit<'info>(
    account: &mut PointsAccount,
    vault: &mut Account<'info, DepositVault>,
    owner: &AccountInfo<'info>,
    credited: Option<([u8; 32], u128)>,
    kind: ComputationKind,
) -> Result<()> {
    let aborted = credited.is_none();
    let points = account.pending_points;
    let lamports = account.complete_deposit(credited)?;
    vault.clear(lamports);

    if aborted {
        pay_from_vault(&vault.to_account_info(), owner, lamports)?;
        msg!("Deposit aborted, refunded {} lamports", lamports);
        emit!(ComputationAbortedEvent {
            kind,
            account: account.owner,
            match_id: None,
        });
        return Ok(());
    }

    emit!(PointsDepositedEvent {
        owner: account.owner,
        lamports,
        points,
        timestamp: Clock::get().map(|c| c.unix_timestamp).unwrap_or_default(),
    });

    Ok(())
}
