use {
    super::audit_builder::build_record,
    super::documents,
    crate::config::AuditSettings,
    crate::domain::audit::{AssociationType, AuditAction, AuditPolicy, AuditRecord, CollectionMeta},
    crate::domain::error::AuditError,
    crate::domain::exchange::{CapturedRequest, CapturedResponse},
    crate::domain::store::AuditStore,
    std::{
        future::Future,
        pin::Pin,
        sync::Arc,
        task::{Context, Poll, ready},
    },
    tokio::task::JoinHandle,
    uuid::Uuid,
};

/// What happened to the audit record. Either way the response continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The store acknowledged the record.
    Recorded(Uuid),
    /// The record was lost; the failure has been logged.
    Dropped,
}

/// Pre-response interceptor bound to one audited operation.
pub struct CaptureHook {
    policy: AuditPolicy,
    store: Arc<dyn AuditStore>,
    settings: Arc<AuditSettings>,
}

impl CaptureHook {
    pub fn new(
        policy: AuditPolicy,
        store: Arc<dyn AuditStore>,
        settings: Arc<AuditSettings>,
    ) -> Self {
        Self {
            policy,
            store,
            settings,
        }
    }

    pub fn policy(&self) -> &AuditPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Derive the record without persisting it.
    pub fn record_for(&self, request: &CapturedRequest, response: &CapturedResponse) -> AuditRecord {
        let documents = documents::extract(self.policy.action(), request, response);
        build_record(
            &self.policy,
            &self.settings.user_id_key,
            documents,
            request,
            response,
        )
    }

    /// Build and persist one record. Never fails: every error is logged here
    /// and turned into [`CaptureOutcome::Dropped`].
    pub async fn capture(
        &self,
        request: &CapturedRequest,
        response: &CapturedResponse,
    ) -> CaptureOutcome {
        match self.try_capture(request, response).await {
            Ok(id) => {
                tracing::debug!(
                    audit_id = %id,
                    action = %self.policy.action(),
                    collection = %self.policy.owner(),
                    "audit record stored"
                );
                CaptureOutcome::Recorded(id)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %self.policy.action(),
                    collection = %self.policy.owner(),
                    endpoint = %request.path,
                    "audit write failed, record dropped"
                );
                CaptureOutcome::Dropped
            }
        }
    }

    async fn try_capture(
        &self,
        request: &CapturedRequest,
        response: &CapturedResponse,
    ) -> Result<Uuid, AuditError> {
        let record = self.record_for(request, response);
        let id = record.id();

        let store = Arc::clone(&self.store);
        let mut write = PendingWrite {
            id,
            handle: Some(tokio::spawn(async move { store.create(&record).await })),
        };

        match tokio::time::timeout(self.settings.write_timeout, &mut write).await {
            Ok(result) => result.map(|()| id),
            Err(_) => {
                write.detach(Late::AfterTimeout);
                Err(AuditError::Timeout(self.settings.write_timeout))
            }
        }
    }
}

/// Why a write is finishing without the hook waiting on it.
#[derive(Debug, Clone, Copy)]
enum Late {
    /// The hook already reported a timeout for this record.
    AfterTimeout,
    /// The request future was dropped mid-write; nothing was reported yet.
    RequestDropped,
}

/// A spawned store write. Once detached, or if dropped before completing,
/// the write's outcome is still routed to `tracing` by a watcher task.
struct PendingWrite {
    id: Uuid,
    handle: Option<JoinHandle<Result<(), AuditError>>>,
}

impl PendingWrite {
    fn detach(&mut self, late: Late) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let id = self.id;
        // Dropped outside a runtime there is nothing left to watch the task.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(report_late(id, handle, late));
        }
    }
}

impl Future for PendingWrite {
    type Output = Result<(), AuditError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(handle) = self.handle.as_mut() else {
            return Poll::Ready(Err(AuditError::Aborted("write already detached".into())));
        };
        let joined = ready!(Pin::new(handle).poll(cx));
        self.handle = None;
        Poll::Ready(joined.unwrap_or_else(|join| Err(AuditError::Aborted(join.to_string()))))
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.detach(Late::RequestDropped);
    }
}

async fn report_late(id: Uuid, handle: JoinHandle<Result<(), AuditError>>, late: Late) {
    let outcome = handle
        .await
        .unwrap_or_else(|join| Err(AuditError::Aborted(join.to_string())));

    match (outcome, late) {
        (Ok(()), _) => tracing::debug!(audit_id = %id, "detached audit write stored"),
        (Err(e), Late::AfterTimeout) => {
            tracing::warn!(audit_id = %id, error = %e, "detached audit write failed after timeout")
        }
        (Err(e), Late::RequestDropped) => {
            tracing::error!(
                audit_id = %id,
                error = %e,
                "audit write failed after its request was dropped, record dropped"
            )
        }
    }
}

/// Builds capture hooks that share one store and one settings block.
#[derive(Clone)]
pub struct HookFactory {
    store: Arc<dyn AuditStore>,
    settings: Arc<AuditSettings>,
}

impl HookFactory {
    pub fn new(store: Arc<dyn AuditStore>, settings: AuditSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn make_hook(
        &self,
        action: AuditAction,
        owner: &CollectionMeta,
        child: Option<&CollectionMeta>,
        association_type: Option<AssociationType>,
    ) -> Arc<CaptureHook> {
        let policy = AuditPolicy::new(action, owner.clone(), child.cloned(), association_type);
        Arc::new(CaptureHook::new(
            policy,
            Arc::clone(&self.store),
            Arc::clone(&self.settings),
        ))
    }

    pub fn log_create(&self, owner: &CollectionMeta) -> Arc<CaptureHook> {
        self.make_hook(AuditAction::Create, owner, None, None)
    }

    pub fn log_update(&self, owner: &CollectionMeta) -> Arc<CaptureHook> {
        self.make_hook(AuditAction::Update, owner, None, None)
    }

    pub fn log_delete(&self, owner: &CollectionMeta) -> Arc<CaptureHook> {
        self.make_hook(AuditAction::Delete, owner, None, None)
    }

    pub fn log_add(
        &self,
        owner: &CollectionMeta,
        child: &CollectionMeta,
        association_type: AssociationType,
    ) -> Arc<CaptureHook> {
        self.make_hook(AuditAction::Add, owner, Some(child), Some(association_type))
    }

    pub fn log_remove(
        &self,
        owner: &CollectionMeta,
        child: &CollectionMeta,
        association_type: AssociationType,
    ) -> Arc<CaptureHook> {
        self.make_hook(AuditAction::Remove, owner, Some(child), Some(association_type))
    }
}
