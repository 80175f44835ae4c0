pub const LEDGER_SEED: &[u8] = b"ledger";
pub const VAULT_SEED: &[u8] = b"vault";
pub const POINTS_SEED: &[u8] = b"points";
pub const MATCH_SEED: &[u8] = b"match";
pub const BOOK_SEED: &[u8] = b"book";
pub const BET_SEED: &[u8] = b"bet";
pub const REVEAL_SEED: &[u8] = b"reveal";

/// Points debited per wager unit.
pub const STAKE_UNIT: u64 = 100;

/// Default deposit rate: 1 SOL buys 100 000 points.
pub const DEFAULT_POINTS_PER_SOL: u64 = 100_000;

pub const MAX_TEAM_NAME_LEN: usize = 32;
pub const MAX_MATCH_NAME_LEN: usize = 64;

// Ciphertext windows read by the MPC cluster via `ArgBuilder::account`.
// Each sits directly after the 8 byte discriminator and the bump.
pub const CIPHERTEXT_OFFSET: u32 = 8 + 1;
pub const BALANCE_CIPHERTEXT_LEN: u32 = 32;
pub const BOOK_CIPHERTEXT_LEN: u32 = 32 * 4;
pub const POSITION_CIPHERTEXT_LEN: u32 = 32 * 2;
