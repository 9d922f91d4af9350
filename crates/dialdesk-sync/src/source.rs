use crate::Result;
use dialdesk_core::domain::{CallWindow, CdrRow};

/// Which source rows an import or lookup considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdrFilter {
    All,
    /// `calldate >= ts`
    Since(i64),
    /// `calldate > ts`
    After(i64),
    Window(CallWindow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdrQuery {
    pub filter: CdrFilter,
    pub limit: Option<usize>,
}

/// A read-only table of call detail records owned by the telephony switch.
pub trait CdrSource {
    fn source_name(&self) -> &str;

    /// Fails with [`crate::SyncError::Schema`] when the table or one of the
    /// required columns is missing.
    fn check_schema(&self) -> Result<()>;

    /// Rows matching `query`, newest `calldate` first.
    fn fetch(&self, query: &CdrQuery) -> Result<Vec<CdrRow>>;
}
