pub mod audit_builder;
pub mod capture;
pub mod client_ip;
pub mod documents;
pub mod field_path;
