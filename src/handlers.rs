pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod ledger;
pub mod members;
pub mod settings;
pub mod users;
