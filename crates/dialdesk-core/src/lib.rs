pub mod domain;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod time;
pub mod validation;

pub use domain::*;
pub use error::CoreError;
pub use matcher::{match_callers, CallerMatch, MatchSet};
pub use normalize::{normalize_company_row, normalize_row, normalize_rows, RawRow};
