//! Plaintext wager acceptance.
//!
//! `place_bet` in the circuit crate applies this rule over ciphertexts. A
//! rejected wager is not an error there: it counts as zero units, so the
//! balance, book and position all move by nothing.

use crate::state::RevealedTotals;

pub const HOME: u8 = 1;
pub const AWAY: u8 = 2;
pub const DRAW: u8 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub direction: u8,
    pub units: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub home: u64,
    pub away: u64,
    pub draw: u64,
    pub total: u64,
}

impl Tally {
    pub fn as_totals(&self) -> RevealedTotals {
        RevealedTotals {
            home: self.home,
            away: self.away,
            draw: self.draw,
            aggregate: self.total,
        }
    }
}

pub fn is_direction(direction: u8) -> bool {
    (HOME..=DRAW).contains(&direction)
}

/// A revealed position is well formed when it is empty or points at an outcome.
pub fn is_settleable(direction: u8, units: u64) -> bool {
    units == 0 || is_direction(direction)
}

/// Units the wager actually stakes: all of them, or none.
pub fn accepted_units(
    direction: u8,
    units: u64,
    balance: u64,
    position: &Position,
    stake_unit: u64,
) -> u64 {
    let cost = (units as u128) * (stake_unit as u128);
    let accepted = is_direction(direction)
        && units > 0
        && cost <= balance as u128
        && (position.units == 0 || position.direction == direction);
    if accepted {
        units
    } else {
        0
    }
}

/// Applies one wager to a bettor's balance and position and to the match
/// tally. Returns the units accepted.
pub fn apply_wager(
    direction: u8,
    units: u64,
    balance: &mut u64,
    position: &mut Position,
    tally: &mut Tally,
    stake_unit: u64,
) -> u64 {
    let units = accepted_units(direction, units, *balance, position, stake_unit);
    if units == 0 {
        return 0;
    }

    // accepted_units bounds units * stake_unit by the balance
    *balance -= units * stake_unit;
    match direction {
        HOME => tally.home += units,
        AWAY => tally.away += units,
        _ => tally.draw += units,
    }
    tally.total += units;
    position.direction = direction;
    position.units += units;
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STAKE_UNIT;
    use crate::payout::settlement_payout;
    use crate::state::{MatchResult, NoWinnerPolicy};

    struct Bettor {
        balance: u64,
        position: Position,
    }

    fn bettor(balance: u64) -> Bettor {
        Bettor {
            balance,
            position: Position::default(),
        }
    }

    fn bet(b: &mut Bettor, tally: &mut Tally, direction: u8, units: u64) -> u64 {
        apply_wager(direction, units, &mut b.balance, &mut b.position, tally, STAKE_UNIT)
    }

    #[test]
    fn repeat_wager_on_same_outcome_adds_to_position() {
        let mut tally = Tally::default();
        let mut alice = bettor(1_000);

        assert_eq!(bet(&mut alice, &mut tally, HOME, 2), 2);
        assert_eq!(bet(&mut alice, &mut tally, HOME, 3), 3);
        assert_eq!(alice.balance, 500);
        assert_eq!(alice.position, Position { direction: HOME, units: 5 });
        assert_eq!(tally, Tally { home: 5, away: 0, draw: 0, total: 5 });
    }

    #[test]
    fn mixed_direction_wager_is_ignored_and_debits_nothing() {
        let mut tally = Tally::default();
        let mut alice = bettor(1_000);
        bet(&mut alice, &mut tally, HOME, 2);

        let before = (alice.balance, alice.position, tally);
        assert_eq!(bet(&mut alice, &mut tally, AWAY, 1), 0);
        assert_eq!(bet(&mut alice, &mut tally, DRAW, 4), 0);
        assert_eq!((alice.balance, alice.position, tally), before);
        assert_eq!(alice.balance, 800);
    }

    #[test]
    fn wager_beyond_balance_is_ignored() {
        let mut tally = Tally::default();
        let mut bob = bettor(250);

        assert_eq!(bet(&mut bob, &mut tally, AWAY, 3), 0);
        assert_eq!(bob.balance, 250);
        assert_eq!(bob.position, Position::default());
        assert_eq!(tally, Tally::default());

        // exactly the balance is fine
        let mut carol = bettor(300);
        assert_eq!(bet(&mut carol, &mut tally, AWAY, 3), 3);
        assert_eq!(carol.balance, 0);
    }

    #[test]
    fn out_of_range_direction_is_ignored() {
        let mut tally = Tally::default();
        let mut dave = bettor(1_000);

        for direction in [0, 4, u8::MAX] {
            assert!(!is_direction(direction));
            assert_eq!(bet(&mut dave, &mut tally, direction, 1), 0);
        }
        assert_eq!(dave.balance, 1_000);
        assert_eq!(dave.position, Position::default());
        assert_eq!(tally, Tally::default());

        // an ignored wager does not fix the direction
        assert_eq!(bet(&mut dave, &mut tally, DRAW, 1), 1);
        assert_eq!(dave.position.direction, DRAW);
    }

    #[test]
    fn zero_units_is_ignored() {
        let mut tally = Tally::default();
        let mut erin = bettor(1_000);
        assert_eq!(bet(&mut erin, &mut tally, HOME, 0), 0);
        assert_eq!(erin.position, Position::default());

        // a later wager may still pick any outcome
        assert_eq!(bet(&mut erin, &mut tally, AWAY, 1), 1);
    }

    #[test]
    fn huge_wager_cost_does_not_wrap() {
        let position = Position::default();
        assert_eq!(accepted_units(HOME, u64::MAX, u64::MAX, &position, STAKE_UNIT), 0);
    }

    #[test]
    fn totals_are_the_sum_of_every_position() {
        let mut tally = Tally::default();
        let mut bettors: Vec<Bettor> = (0..5).map(|_| bettor(2_000)).collect();
        let wagers = [
            (0, HOME, 3),
            (1, AWAY, 2),
            (2, DRAW, 1),
            (0, HOME, 1),
            (3, AWAY, 4),
            (1, HOME, 5), // mixed, ignored
            (4, DRAW, 30), // over balance, ignored
            (4, DRAW, 2),
            (2, 0, 1),    // bad direction, ignored
        ];
        for (i, direction, units) in wagers {
            bet(&mut bettors[i], &mut tally, direction, units);
        }

        let sum = |d: u8| {
            bettors
                .iter()
                .filter(|b| b.position.direction == d)
                .map(|b| b.position.units)
                .sum::<u64>()
        };
        assert_eq!(tally.home, sum(HOME));
        assert_eq!(tally.away, sum(AWAY));
        assert_eq!(tally.draw, sum(DRAW));
        assert_eq!(tally.home + tally.away + tally.draw, tally.total);
        assert_eq!(tally, Tally { home: 4, away: 6, draw: 3, total: 13 });

        let staked: u64 = bettors.iter().map(|b| 2_000 - b.balance).sum();
        assert_eq!(staked, tally.total * STAKE_UNIT);

        // every winner's payout fits inside the pool
        let totals = tally.as_totals();
        let paid: u64 = bettors
            .iter()
            .map(|b| {
                settlement_payout(
                    b.position.direction,
                    b.position.units,
                    MatchResult::AwayWin,
                    &totals,
                    STAKE_UNIT,
                    NoWinnerPolicy::Unclaimable,
                )
                .unwrap()
            })
            .sum();
        assert!(paid <= totals.pool_points(STAKE_UNIT).unwrap());
        assert_eq!(paid, 1_299);
    }

    #[test]
    fn settleable_positions() {
        assert!(is_settleable(0, 0));
        assert!(is_settleable(AWAY, 3));
        assert!(!is_settleable(0, 3));
        assert!(!is_settleable(7, 1));
    }
}
