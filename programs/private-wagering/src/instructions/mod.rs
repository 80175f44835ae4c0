pub mod comp_defs;
pub mod ledger;
pub mod matches;
pub mod place_bet;
pub mod points;
pub mod reveal;
pub mod settle;

pub use comp_defs::*;
pub use ledger::*;
pub use matches::*;
pub use place_bet::*;
pub use points::*;
pub use reveal::*;
pub use settle::*;
