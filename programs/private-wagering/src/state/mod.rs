use anchor_lang::prelude::*;

use crate::error::ErrorCode;

pub mod bet_book;
pub mod ledger;
pub mod match_account;
pub mod points;
pub mod reveal_request;
pub mod user_bet;

pub use bet_book::*;
pub use ledger::*;
pub use match_account::*;
pub use points::*;
pub use reveal_request::*;
pub use user_bet::*;

/// A record whose ciphertext is rewritten by a queued computation.
///
/// The flag is raised when the computation is queued and dropped by its
/// callback, so no two computations ever read the same ciphertext.
pub trait ComputationLock {
    fn pending_flag(&mut self) -> &mut bool;

    fn lock(&mut self) -> Result<()> {
        let pending = self.pending_flag();
        require!(!*pending, ErrorCode::ComputationPending);
        *pending = true;
        Ok(())
    }

    fn release(&mut self) {
        *self.pending_flag() = false;
    }
}
