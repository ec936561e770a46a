pub mod customer;
pub mod schedule;

pub use customer::customer_config;
pub use schedule::schedule_config;
