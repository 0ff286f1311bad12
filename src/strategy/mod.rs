//! Transfer strategies
//!
//! A strategy is an immutable sequence of per-period actions over the planning
//! horizon. Every strategy maps to a deterministic [`StrategyId`] which is used
//! both as the progress label and as the key of the persisted result.
//!
//! # Example
//!
//! ```
//! use stratsweep::strategy::{Action, Strategy};
//!
//! let strat = Strategy::new(5, vec![Action::Wildcard, Action::Single, Action::Hold], 0);
//! assert_eq!(strat.id().as_str(), "W-1-0");
//! assert_eq!(strat.period_of(1), 6);
//! ```

pub mod generator;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Separator between action tokens in a strategy id
pub const TOKEN_SEPARATOR: char = '-';

/// Errors raised while parsing strategy ids
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyParseError {
    #[error("strategy id is empty")]
    Empty,
    #[error("invalid action token '{0}'")]
    InvalidToken(String),
    #[error("multi-transfer count {0} is outside {min}..={max}", min = MultiTransfers::MIN, max = MultiTransfers::MAX)]
    TransferCountOutOfRange(u8),
}

/// Transfer count of a multi-transfer period, always a single digit from 3 to 9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MultiTransfers(u8);

impl MultiTransfers {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 9;

    pub fn new(count: u8) -> Result<Self, StrategyParseError> {
        if (Self::MIN..=Self::MAX).contains(&count) {
            Ok(Self(count))
        } else {
            Err(StrategyParseError::TransferCountOutOfRange(count))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MultiTransfers {
    type Error = StrategyParseError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<MultiTransfers> for u8 {
    fn from(count: MultiTransfers) -> u8 {
        count.0
    }
}

/// One period's action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// No transfers
    Hold,
    /// One transfer
    Single,
    /// Two transfers
    Double,
    /// Three to nine transfers
    Multi(MultiTransfers),
    /// Replace the whole squad
    Wildcard,
}

impl Action {
    /// Token used in strategy ids
    pub fn token(&self) -> char {
        match self {
            Action::Hold => '0',
            Action::Single => '1',
            Action::Double => '2',
            Action::Multi(n) => char::from(b'0' + n.get()),
            Action::Wildcard => 'W',
        }
    }

    /// Parse a single action token
    pub fn from_token(token: char) -> Option<Self> {
        match token {
            '0' => Some(Action::Hold),
            '1' => Some(Action::Single),
            '2' => Some(Action::Double),
            '3'..='9' => Self::multi(token as u8 - b'0').ok(),
            'W' => Some(Action::Wildcard),
            _ => None,
        }
    }

    /// Multi-transfer action; fails unless `count` is in 3..=9
    pub fn multi(count: u8) -> Result<Self, StrategyParseError> {
        MultiTransfers::new(count).map(Action::Multi)
    }

    /// Number of transfers the action makes
    ///
    /// A wildcard rebuilds the whole squad and reports `u8::MAX`.
    pub fn transfers(&self) -> u8 {
        match self {
            Action::Hold => 0,
            Action::Single => 1,
            Action::Double => 2,
            Action::Multi(n) => n.get(),
            Action::Wildcard => u8::MAX,
        }
    }
}

/// Deterministic identifier for a strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(String);

impl StrategyId {
    /// Parse and validate a strategy id such as `"0-1-W"`
    pub fn parse(s: &str) -> Result<Self, StrategyParseError> {
        if s.is_empty() {
            return Err(StrategyParseError::Empty);
        }
        for part in s.split(TOKEN_SEPARATOR) {
            let mut chars = part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if Action::from_token(c).is_some() => {}
                _ => return Err(StrategyParseError::InvalidToken(part.to_string())),
            }
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Action tokens in period order
    pub fn tokens(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().filter(|c| *c != TOKEN_SEPARATOR)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate sequence of per-period actions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Strategy {
    start_period: u32,
    actions: Vec<Action>,
    points_hit: u32,
}

impl Strategy {
    /// Create a strategy starting at `start_period`
    pub fn new(start_period: u32, actions: Vec<Action>, points_hit: u32) -> Self {
        Self {
            start_period,
            actions,
            points_hit,
        }
    }

    /// Build a strategy from an id string, e.g. `Strategy::parse(3, "1-0-2")`
    pub fn parse(start_period: u32, id: &str) -> Result<Self, StrategyParseError> {
        let id = StrategyId::parse(id)?;
        let actions = id.tokens().filter_map(Action::from_token).collect();
        Ok(Self::new(start_period, actions, 0))
    }

    pub fn id(&self) -> StrategyId {
        let tokens: Vec<String> = self.actions.iter().map(|a| a.token().to_string()).collect();
        StrategyId(tokens.join(&TOKEN_SEPARATOR.to_string()))
    }

    pub fn start_period(&self) -> u32 {
        self.start_period
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Points deducted for transfers beyond the free allowance
    pub fn points_hit(&self) -> u32 {
        self.points_hit
    }

    /// Number of periods covered
    pub fn horizon(&self) -> usize {
        self.actions.len()
    }

    /// Period number of the action at `offset`
    pub fn period_of(&self, offset: usize) -> u32 {
        self.start_period + offset as u32
    }

    /// Iterate `(period, action)` pairs
    pub fn periods(&self) -> impl Iterator<Item = (u32, Action)> + '_ {
        self.actions
            .iter()
            .enumerate()
            .map(move |(i, a)| (self.period_of(i), *a))
    }

    /// True if any single period makes `n` or more transfers
    pub fn involves_n_or_more_transfers(&self, n: u8) -> bool {
        self.actions.iter().any(|a| a.transfers() >= n)
    }
}
