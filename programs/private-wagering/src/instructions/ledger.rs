use anchor_lang::prelude::*;

use crate::constants::{DEFAULT_POINTS_PER_SOL, LEDGER_SEED, VAULT_SEED};
use crate::error::ErrorCode;
use crate::events::{DepositsWithdrawnEvent, LedgerConfigUpdatedEvent, LedgerInitializedEvent};
use crate::state::{DepositVault, LedgerConfig, NoWinnerPolicy};

#[derive(Accounts)]
pub struct InitializeLedger<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,
    #[account(
        init, payer = operator,
        space = 8 + LedgerConfig::INIT_SPACE,
        seeds = [LEDGER_SEED],
        bump,
    )]
    pub ledger: Account<'info, LedgerConfig>,
    #[account(
        init, payer = operator,
        space = 8 + DepositVault::INIT_SPACE,
        seeds = [VAULT_SEED],
        bump,
    )]
    pub vault: Account<'info, DepositVault>,
    pub system_program: Program<'info, System>,
}

pub fn initialize_ledger(
    ctx: Context<InitializeLedger>,
    points_per_sol: Option<u64>,
    no_winner_policy: NoWinnerPolicy,
) -> Result<()> {
    let points_per_sol = points_per_sol.unwrap_or(DEFAULT_POINTS_PER_SOL);
    require!(points_per_sol > 0, ErrorCode::InvalidRate);

    let ledger = &mut ctx.accounts.ledger;
    ledger.bump = ctx.bumps.ledger;
    ledger.operator = ctx.accounts.operator.key();
    ledger.match_count = 0;
    ledger.points_per_sol = points_per_sol;
    ledger.no_winner_policy = no_winner_policy;

    ctx.accounts.vault.bump = ctx.bumps.vault;
    ctx.accounts.vault.pending_lamports = 0;

    emit!(LedgerInitializedEvent {
        operator: ledger.operator,
        points_per_sol,
        no_winner_policy,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct UpdateLedgerConfig<'info> {
    pub operator: Signer<'info>,
    #[account(
        mut,
        seeds = [LEDGER_SEED],
        bump = ledger.bump,
        constraint = ledger.operator == operator.key() @ ErrorCode::Unauthorized,
    )]
    pub ledger: Account<'info, LedgerConfig>,
}

/// Changes apply to deposits made and matches finished afterwards.
pub fn update_ledger_config(
    ctx: Context<UpdateLedgerConfig>,
    points_per_sol: Option<u64>,
    no_winner_policy: Option<NoWinnerPolicy>,
) -> Result<()> {
    let ledger = &mut ctx.accounts.ledger;

    if let Some(rate) = points_per_sol {
        require!(rate > 0, ErrorCode::InvalidRate);
        ledger.points_per_sol = rate;
    }
    if let Some(policy) = no_winner_policy {
        ledger.no_winner_policy = policy;
    }

    emit!(LedgerConfigUpdatedEvent {
        points_per_sol: ledger.points_per_sol,
        no_winner_policy: ledger.no_winner_policy,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct WithdrawDeposits<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,
    #[account(
        seeds = [LEDGER_SEED],
        bump = ledger.bump,
        constraint = ledger.operator == operator.key() @ ErrorCode::Unauthorized,
    )]
    pub ledger: Account<'info, LedgerConfig>,
    #[account(mut, seeds = [VAULT_SEED], bump = vault.bump)]
    pub vault: Account<'info, DepositVault>,
}

pub fn withdraw_deposits(ctx: Context<WithdrawDeposits>, lamports: u64) -> Result<()> {
    let vault_info = ctx.accounts.vault.to_account_info();
    let rent_floor = Rent::get()?.minimum_balance(vault_info.data_len());
    let available = ctx.accounts.vault.withdrawable(vault_info.lamports(), rent_floor);
    require!(lamports <= available, ErrorCode::InsufficientVaultFunds);

    pay_from_vault(&vault_info, &ctx.accounts.operator.to_account_info(), lamports)?;

    msg!("Operator withdrew {} lamports", lamports);
    emit!(DepositsWithdrawnEvent {
        operator: ctx.accounts.operator.key(),
        lamports,
    });

    Ok(())
}

/// Moves lamports out of the program owned vault.
pub(crate) fn pay_from_vault<'info>(
    vault: &AccountInfo<'info>,
    recipient: &AccountInfo<'info>,
    lamports: u64,
) -> Result<()> {
    if lamports == 0 {
        return Ok(());
    }
    let mut from = vault.try_borrow_mut_lamports()?;
    let mut to = recipient.try_borrow_mut_lamports()?;
    **from = from.checked_sub(lamports).ok_or(ErrorCode::InsufficientVaultFunds)?;
    **to = to.checked_add(lamports).ok_or(ErrorCode::MathOverflow)?;
    Ok(())
}
