use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("company name is required")]
    EmptyCompanyName,
    #[error("identification code is required")]
    EmptyIdentificationCode,
    #[error("a company has at most {max} contact pairs, got {got}")]
    TooManyContacts { max: usize, got: usize },
    #[error("uniqueid is required")]
    EmptyUniqueId,
    #[error("invalid call duration: {0}")]
    InvalidDuration(i64),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid call window: from {from} is after to {to}")]
    InvalidWindow { from: i64, to: i64 },
}
