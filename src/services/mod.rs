pub mod compare;
pub mod query;
pub mod session;
