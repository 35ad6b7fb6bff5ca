pub mod audit;
pub mod error;
pub mod exchange;
pub mod store;
