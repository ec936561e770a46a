pub mod ledger_service;
pub mod schedule_service;

pub use ledger_service::*;
pub use schedule_service::*;
