//! Discrete edit actions.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Perturb one factor matrix.
    Mutate = 0,
    /// Exchange two triples.
    Swap = 1,
    /// Drop one triple.
    Prune = 2,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Mutate, Action::Swap, Action::Prune];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Mutate => "mutate",
            Action::Swap => "swap",
            Action::Prune => "prune",
        }
    }
}

impl TryFrom<i64> for Action {
    type Error = EnvError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Action::Mutate),
            1 => Ok(Action::Swap),
            2 => Ok(Action::Prune),
            other => Err(EnvError::InvalidAction(other)),
        }
    }
}

impl From<Action> for i64 {
    fn from(action: Action) -> Self {
        action as i64
    }
}
