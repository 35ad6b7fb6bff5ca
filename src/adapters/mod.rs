pub mod api_errors;
pub mod audit_layer;
pub mod records;
