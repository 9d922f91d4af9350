pub mod asterisk;
pub mod error;
pub mod importer;
pub mod matching;
pub mod rows;
pub mod source;

pub use error::{Result, SyncError};
