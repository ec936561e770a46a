pub mod dates;
pub mod jwt;

pub use dates::*;
pub use jwt::*;
