use {
    crate::domain::audit::AuditRecord,
    crate::domain::error::AuditError,
    crate::domain::store::AuditStore,
    std::{
        future::Future,
        pin::Pin,
        sync::{Arc, Mutex},
    },
};

/// Process-local audit store. Records live until the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditStore {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, in insertion order.
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for InMemoryAuditStore {
    fn create(
        &self,
        record: &AuditRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + '_>> {
        let record = record.clone();
        Box::pin(async move {
            self.records
                .lock()
                .map_err(|_| AuditError::Store("in-memory audit store poisoned".into()))?
                .push(record);
            Ok::<(), AuditError>(())
        })
    }
}
