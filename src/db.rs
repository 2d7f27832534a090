pub mod context;
pub mod interceptor;
pub mod memory;
pub mod query;
pub mod registry;
pub mod session;
pub mod store;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::OrganizationRepository;
pub mod member_repo;
pub use member_repo::MemberRepository;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
