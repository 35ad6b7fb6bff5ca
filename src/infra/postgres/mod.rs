pub mod audit_repo;
