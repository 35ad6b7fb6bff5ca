#![allow(dead_code)]

use audit_trail::config::AuditSettings;
use audit_trail::domain::audit::AuditRecord;
use audit_trail::domain::error::AuditError;
use audit_trail::domain::store::AuditStore;
use audit_trail::infra::memory::InMemoryAuditStore;
use audit_trail::services::capture::HookFactory;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + 'a>>;

/// Store that rejects every write.
pub struct FailingStore;

impl AuditStore for FailingStore {
    fn create(&self, _record: &AuditRecord) -> StoreFuture<'_> {
        Box::pin(async { Err::<(), _>(AuditError::Store("connection refused".into())) })
    }
}

/// Store that never answers in time.
pub struct StalledStore(pub Duration);

impl AuditStore for StalledStore {
    fn create(&self, _record: &AuditRecord) -> StoreFuture<'_> {
        let delay = self.0;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok::<(), AuditError>(())
        })
    }
}

/// Store that rejects the write only after `0` has passed.
pub struct LateRejectStore(pub Duration);

impl AuditStore for LateRejectStore {
    fn create(&self, _record: &AuditRecord) -> StoreFuture<'_> {
        let delay = self.0;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Err::<(), _>(AuditError::Store("late reject".into()))
        })
    }
}

/// Store whose write task panics.
pub struct PanickingStore;

fn explode() -> Result<(), AuditError> {
    panic!("driver bug")
}

impl AuditStore for PanickingStore {
    fn create(&self, _record: &AuditRecord) -> StoreFuture<'_> {
        Box::pin(async { explode() })
    }
}

pub fn settings() -> AuditSettings {
    AuditSettings {
        write_timeout: Duration::from_millis(50),
        ..AuditSettings::default()
    }
}

pub fn memory_hooks() -> (InMemoryAuditStore, HookFactory) {
    let store = InMemoryAuditStore::new();
    let hooks = HookFactory::new(Arc::new(store.clone()), settings());
    (store, hooks)
}

pub fn hooks_with(store: impl AuditStore + 'static) -> HookFactory {
    HookFactory::new(Arc::new(store), settings())
}

// ── Log capture ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains("ERROR"))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's tracing events into a buffer until the guard drops.
/// Pair with a current-thread runtime so spawned tasks log here too.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
