use arcis::*;

#[encrypted]
mod circuits {
    use arcis::*;

    /// Encrypted running totals of a match's bet book, in stake units.
    pub struct BookTotals {
        home: u64,
        away: u64,
        draw: u64,
        total: u64,
    }

    /// An account's accumulated wager on one match.
    /// `direction` is 0 until the first wager is accepted.
    pub struct Position {
        direction: u8,
        units: u64,
    }

    /// A wager as encrypted by the bettor: 1 = home, 2 = away, 3 = draw.
    pub struct Wager {
        direction: u8,
        units: u64,
    }

    /// Encrypt the first deposit of a points account to its owner.
    #[instruction]
    pub fn open_balance(owner: Shared, points: u64) -> Enc<Shared, u64> {
        owner.from_arcis(points)
    }

    /// Credit a plaintext number of points to an encrypted balance.
    #[instruction]
    pub fn credit_points(balance_ctxt: Enc<Shared, u64>, points: u64) -> Enc<Shared, u64> {
        let balance = balance_ctxt.to_arcis();
        balance_ctxt.owner.from_arcis(balance + points)
    }

    /// Zeroed totals for a freshly created match.
    #[instruction]
    pub fn init_book(mxe: Mxe) -> Enc<Mxe, BookTotals> {
        let totals = BookTotals {
            home: 0,
            away: 0,
            draw: 0,
            total: 0,
        };
        mxe.from_arcis(totals)
    }

    /// Debit the bettor, accumulate into the book and into the bettor's position.
    ///
    /// A rejected wager runs the same arithmetic with zero units.
    /// A wager counts only if the direction is valid, the units are non-zero
    /// and affordable, and the direction matches the position already held.
    #[instruction]
    pub fn place_bet(
        wager_ctxt: Enc<Shared, Wager>,
        balance_ctxt: Enc<Shared, u64>,
        book_ctxt: Enc<Mxe, BookTotals>,
        position_ctxt: Enc<Mxe, Position>,
        first_wager: bool,
        stake_unit: u64,
    ) -> (Enc<Shared, u64>, Enc<Mxe, BookTotals>, Enc<Mxe, Position>) {
        let wager = wager_ctxt.to_arcis();
        let mut balance = balance_ctxt.to_arcis();
        let mut book = book_ctxt.to_arcis();
        let mut position = position_ctxt.to_arcis();

        // A brand new position account holds no ciphertext yet.
        if first_wager {
            position.direction = 0;
            position.units = 0;
        }

        let cost = (wager.units as u128) * (stake_unit as u128);
        let open_position = position.units == 0u64;
        let accepted = (wager.direction >= 1u8)
            & (wager.direction <= 3u8)
            & (wager.units > 0u64)
            & (cost <= balance as u128)
            & (open_position | (wager.direction == position.direction));

        let units = if accepted { wager.units } else { 0u64 };

        balance = balance - units * stake_unit;

        book.home = book.home + if wager.direction == 1u8 { units } else { 0u64 };
        book.away = book.away + if wager.direction == 2u8 { units } else { 0u64 };
        book.draw = book.draw + if wager.direction == 3u8 { units } else { 0u64 };
        book.total = book.total + units;

        position.direction = if accepted { wager.direction } else { position.direction };
        position.units = position.units + units;

        (
            balance_ctxt.owner.from_arcis(balance),
            book_ctxt.owner.from_arcis(book),
            position_ctxt.owner.from_arcis(position),
        )
    }

    /// Reveal a single book total. `slot`: 0 home, 1 away, 2 draw, 3 aggregate.
    #[instruction]
    pub fn reveal_total(book_ctxt: Enc<Mxe, BookTotals>, slot: u8) -> u64 {
        let book = book_ctxt.to_arcis();

        let value = if slot == 0 {
            book.home
        } else if slot == 1 {
            book.away
        } else if slot == 2 {
            book.draw
        } else {
            book.total
        };

        value.reveal()
    }

    /// Reveal the bettor's own position and credit its payout.
    ///
    /// `winning_total` and `pool_points` come from the already revealed book,
    /// so only the position itself is secret here.
    /// Returns (new balance, direction, units, payout).
    #[instruction]
    pub fn settle_wager(
        position_ctxt: Enc<Mxe, Position>,
        balance_ctxt: Enc<Shared, u64>,
        result: u8,
        winning_total: u64,
        pool_points: u64,
        stake_unit: u64,
        refund_without_winners: bool,
    ) -> (Enc<Shared, u64>, u8, u64, u64) {
        let position = position_ctxt.to_arcis();
        let balance = balance_ctxt.to_arcis();

        let payout = if winning_total == 0 {
            if refund_without_winners {
                position.units * stake_unit
            } else {
                0u64
            }
        } else {
            let share =
                (position.units as u128) * (pool_points as u128) / (winning_total as u128);
            if position.direction == result {
                share as u64
            } else {
                0u64
            }
        };

        (
            balance_ctxt.owner.from_arcis(balance + payout),
            position.direction.reveal(),
            position.units.reveal(),
            payout.reveal(),
        )
    }
}
