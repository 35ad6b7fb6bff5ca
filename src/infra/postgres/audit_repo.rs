use {
    crate::domain::audit::AuditRecord,
    crate::domain::error::AuditError,
    crate::domain::store::AuditStore,
    sqlx::{PgPool, types::Json},
    std::{future::Future, pin::Pin},
};

pub async fn insert_audit_record(pool: &PgPool, record: &AuditRecord) -> Result<(), AuditError> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (
            id, method, action, endpoint, user_id, collection_name,
            child_collection_name, association_type, documents, payload, params,
            result, is_error, status_code, response_message, ip_address, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(record.id())
    .bind(record.method().as_str())
    .bind(record.action().as_str())
    .bind(record.endpoint())
    .bind(record.user())
    .bind(record.collection_name())
    .bind(record.child_collection_name())
    .bind(record.association_type().map(|a| a.as_str()))
    .bind(record.documents().map(Json))
    .bind(record.payload().map(Json))
    .bind(record.params().map(Json))
    .bind(record.result().map(Json))
    .bind(record.is_error())
    .bind(i32::from(record.status_code()))
    .bind(record.response_message())
    .bind(record.ip_address())
    .bind(record.created_at())
    .execute(pool)
    .await?;

    Ok(())
}

/// Postgres-backed [`AuditStore`] writing to `audit_log`.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditStore for PgAuditStore {
    fn create(
        &self,
        record: &AuditRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), AuditError>> + Send + '_>> {
        let record = record.clone();
        Box::pin(async move { insert_audit_record(&self.pool, &record).await })
    }
}
