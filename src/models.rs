pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod ledger;
pub mod member;
pub mod tenancy;
