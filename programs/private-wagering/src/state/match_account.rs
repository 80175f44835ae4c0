use anchor_lang::prelude::*;

use super::NoWinnerPolicy;
use crate::constants::{MAX_MATCH_NAME_LEN, MAX_TEAM_NAME_LEN};
use crate::error::ErrorCode;

/// Outcome of a match. Wire codes: 0 unset, 1 home, 2 away, 3 draw.
/// Wager directions use the same codes.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default, InitSpace)]
pub enum MatchResult {
    #[default]
    Unset,
    HomeWin,
    AwayWin,
    Draw,
}

impl MatchResult {
    pub fn code(self) -> u8 {
        match self {
            MatchResult::Unset => 0,
            MatchResult::HomeWin => 1,
            MatchResult::AwayWin => 2,
            MatchResult::Draw => 3,
        }
    }

    /// Decodes a final result. `Unset` is not a result an operator can declare.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(MatchResult::HomeWin),
            2 => Ok(MatchResult::AwayWin),
            3 => Ok(MatchResult::Draw),
            _ => err!(ErrorCode::InvalidResult),
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchStatus {
    Created,
    BettingOpen,
    BettingClosed,
    Finished,
}

#[account]
#[derive(InitSpace, Default)]
pub struct MatchAccount {
    pub bump: u8,
    pub id: u64,
    #[max_len(32)]
    pub home_team: String,
    #[max_len(32)]
    pub away_team: String,
    #[max_len(64)]
    pub match_name: String,
    pub betting_open: i64,
    pub betting_close: i64,
    pub event_time: i64,
    pub created_at: i64,
    pub is_finished: bool,
    pub result: MatchResult,
    pub result_set_by_operator: bool,
    /// Snapshot of the ledger policy taken when the match finished.
    pub no_winner_policy: NoWinnerPolicy,
    pub finished_at: i64,
}

impl MatchAccount {
    pub fn validate_schedule(now: i64, betting_open: i64, betting_close: i64) -> Result<()> {
        require!(betting_open > now, ErrorCode::InvalidSchedule);
        require!(betting_close > betting_open, ErrorCode::InvalidSchedule);
        Ok(())
    }

    pub fn validate_names(home_team: &str, away_team: &str, match_name: &str) -> Result<()> {
        for team in [home_team, away_team] {
            require!(
                !team.is_empty() && team.len() <= MAX_TEAM_NAME_LEN,
                ErrorCode::InvalidName
            );
        }
        require!(match_name.len() <= MAX_MATCH_NAME_LEN, ErrorCode::InvalidName);
        Ok(())
    }

    pub fn status(&self, now: i64) -> MatchStatus {
        if self.is_finished {
            MatchStatus::Finished
        } else if now < self.betting_open {
            MatchStatus::Created
        } else if now < self.betting_close {
            MatchStatus::BettingOpen
        } else {
            MatchStatus::BettingClosed
        }
    }

    pub fn ensure_betting_open(&self, now: i64) -> Result<()> {
        require!(
            self.status(now) == MatchStatus::BettingOpen,
            ErrorCode::BettingNotOpen
        );
        Ok(())
    }

    pub fn ensure_finished(&self) -> Result<()> {
        require!(self.is_finished, ErrorCode::NotFinished);
        Ok(())
    }

    pub fn finish(&mut self, result_code: u8, policy: NoWinnerPolicy, now: i64) -> Result<()> {
        require!(!self.is_finished, ErrorCode::AlreadyFinished);
        let result = MatchResult::from_code(result_code)?;

        self.is_finished = true;
        self.result = result;
        self.result_set_by_operator = true;
        self.no_winner_policy = policy;
        self.finished_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn scheduled() -> MatchAccount {
        MatchAccount {
            betting_open: NOW + 3_600,
            betting_close: NOW + 7_200,
            event_time: NOW + 9_000,
            ..Default::default()
        }
    }

    #[test]
    fn schedule_must_open_in_the_future() {
        assert!(MatchAccount::validate_schedule(NOW, NOW + 3_600, NOW + 7_200).is_ok());
        assert_eq!(
            MatchAccount::validate_schedule(NOW, NOW, NOW + 7_200).unwrap_err(),
            ErrorCode::InvalidSchedule.into()
        );
        assert_eq!(
            MatchAccount::validate_schedule(NOW, NOW - 1, NOW + 7_200).unwrap_err(),
            ErrorCode::InvalidSchedule.into()
        );
    }

    #[test]
    fn schedule_must_close_after_it_opens() {
        assert_eq!(
            MatchAccount::validate_schedule(NOW, NOW + 7_200, NOW + 7_200).unwrap_err(),
            ErrorCode::InvalidSchedule.into()
        );
        assert_eq!(
            MatchAccount::validate_schedule(NOW, NOW + 7_200, NOW + 3_600).unwrap_err(),
            ErrorCode::InvalidSchedule.into()
        );
    }

    #[test]
    fn names_are_bounded() {
        assert!(MatchAccount::validate_names("Arsenal", "Chelsea", "Derby").is_ok());
        assert!(MatchAccount::validate_names("Arsenal", "Chelsea", "").is_ok());
        assert_eq!(
            MatchAccount::validate_names("", "Chelsea", "Derby").unwrap_err(),
            ErrorCode::InvalidName.into()
        );
        let long = "x".repeat(MAX_TEAM_NAME_LEN + 1);
        assert_eq!(
            MatchAccount::validate_names("Arsenal", &long, "Derby").unwrap_err(),
            ErrorCode::InvalidName.into()
        );
    }

    #[test]
    fn status_follows_the_clock_then_the_operator() {
        let mut m = scheduled();
        assert_eq!(m.status(NOW), MatchStatus::Created);
        assert_eq!(m.status(NOW + 3_600), MatchStatus::BettingOpen);
        assert_eq!(m.status(NOW + 7_199), MatchStatus::BettingOpen);
        assert_eq!(m.status(NOW + 7_200), MatchStatus::BettingClosed);

        m.finish(1, NoWinnerPolicy::Unclaimable, NOW + 10_000).unwrap();
        assert_eq!(m.status(NOW + 3_600), MatchStatus::Finished);
    }

    #[test]
    fn betting_window_is_half_open() {
        let m = scheduled();
        for t in [NOW, NOW + 3_599, NOW + 7_200, NOW + 100_000] {
            assert_eq!(
                m.ensure_betting_open(t).unwrap_err(),
                ErrorCode::BettingNotOpen.into()
            );
        }
        assert!(m.ensure_betting_open(NOW + 3_600).is_ok());
        assert!(m.ensure_betting_open(NOW + 7_199).is_ok());
    }

    #[test]
    fn finished_match_refuses_bets_inside_the_window() {
        let mut m = scheduled();
        m.finish(3, NoWinnerPolicy::Unclaimable, NOW + 4_000).unwrap();
        assert_eq!(
            m.ensure_betting_open(NOW + 4_000).unwrap_err(),
            ErrorCode::BettingNotOpen.into()
        );
    }

    #[test]
    fn finish_records_result_and_policy() {
        let mut m = scheduled();
        assert_eq!(m.ensure_finished().unwrap_err(), ErrorCode::NotFinished.into());

        m.finish(2, NoWinnerPolicy::RefundStake, NOW + 9_999).unwrap();
        assert!(m.is_finished);
        assert!(m.result_set_by_operator);
        assert_eq!(m.result, MatchResult::AwayWin);
        assert_eq!(m.no_winner_policy, NoWinnerPolicy::RefundStake);
        assert_eq!(m.finished_at, NOW + 9_999);
        assert!(m.ensure_finished().is_ok());
    }

    #[test]
    fn finish_is_not_repeatable() {
        let mut m = scheduled();
        m.finish(1, NoWinnerPolicy::Unclaimable, NOW).unwrap();
        assert_eq!(
            m.finish(2, NoWinnerPolicy::Unclaimable, NOW).unwrap_err(),
            ErrorCode::AlreadyFinished.into()
        );
        assert_eq!(m.result, MatchResult::HomeWin);
    }

    #[test]
    fn invalid_result_leaves_match_open() {
        let mut m = scheduled();
        for code in [0u8, 4, 255] {
            assert_eq!(
                m.finish(code, NoWinnerPolicy::Unclaimable, NOW).unwrap_err(),
                ErrorCode::InvalidResult.into()
            );
        }
        assert!(!m.is_finished);
        assert_eq!(m.result, MatchResult::Unset);
    }

    #[test]
    fn result_codes_round_trip() {
        for result in [MatchResult::HomeWin, MatchResult::AwayWin, MatchResult::Draw] {
            assert_eq!(MatchResult::from_code(result.code()).unwrap(), result);
        }
        assert_eq!(MatchResult::Unset.code(), 0);
    }
}
