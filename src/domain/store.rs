use {
    super::audit::AuditRecord,
    super::error::AuditError,
    std::{future::Future, pin::Pin},
};

/// Durable sink for audit records. A failed write is an `Err`, never a panic.
pub trait AuditStore: Send + Sync {
    fn create(
        &self,
        record: &AuditRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + '_>>;
}
