pub mod common;
pub mod customer;
pub mod reservation;
pub mod staff;

pub use common::*;
pub use customer::*;
pub use reservation::*;
pub use staff::*;
