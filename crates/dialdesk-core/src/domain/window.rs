use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Inclusive bounds on `calldate`, in unix seconds. An open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallWindow {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl CallWindow {
    pub fn new(from: Option<i64>, to: Option<i64>) -> Result<Self, CoreError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CoreError::InvalidWindow { from, to });
            }
        }
        Ok(Self { from, to })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts <= to)
    }
}
