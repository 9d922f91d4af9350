pub mod admin;
pub mod call_record;
pub mod caller;
pub mod company;
pub mod ids;
pub mod phone;
pub mod window;

pub use admin::{normalize_email, AdminUser};
pub use call_record::{
    CallRecord, CdrRow, Disposition, DEFAULT_CDR_TABLE, DEFAULT_IMPORT_CHUNK_SIZE,
    DEFAULT_IMPORT_DAYS, DEFAULT_IMPORT_LIMIT,
};
pub use caller::ImportedCallerRecord;
pub use company::{Company, CompanyDraft, ContactPair, MAX_CONTACT_PAIRS};
pub use ids::{AdminUserId, CompanyId};
pub use phone::{normalize_phone_for_match, PhoneMatchRule};
pub use window::CallWindow;
