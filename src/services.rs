pub mod auth;
pub mod church_service;
pub mod dashboard_service;
pub mod document_service;
pub mod ledger_service;
pub mod member_service;
pub mod seed;
