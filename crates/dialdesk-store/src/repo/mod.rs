pub mod admin_users;
pub mod call_records;
pub mod companies;

pub use admin_users::AdminUsersRepo;
pub use call_records::{CallRecordsRepo, ChunkOutcome};
pub use companies::{CompaniesRepo, CompanyUpdate, UpsertOutcome};
