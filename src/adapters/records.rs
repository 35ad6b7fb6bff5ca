//! In-memory collection service used by the binary and the HTTP tests. Every
//! mutating route carries the capture hook for its operation.

use {
    super::{api_errors::ApiError, audit_layer::audit_layer},
    crate::domain::audit::{AssociationType, CollectionMeta},
    crate::domain::error::RecordError,
    crate::services::capture::HookFactory,
    axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        middleware,
        routing::{delete, post, put},
    },
    serde_json::{Map, Value},
    std::{collections::HashMap, sync::Arc},
    tokio::sync::RwLock,
    uuid::Uuid,
};

fn record_id(doc: &Value) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

/// Pull ids out of a body that is a list of bare ids or of `{ field: id }` objects.
fn ids_from_payload(payload: &Value, field: &str) -> Result<Vec<String>, RecordError> {
    let Value::Array(items) = payload else {
        return Err(RecordError::Validation("expected an array".into()));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .or_else(|| item.get(field).and_then(Value::as_str))
                .map(str::to_string)
                .ok_or_else(|| RecordError::Validation(format!("no id in element: {item}")))
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RecordService {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl RecordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.collections.read().await;
        collections
            .get(collection)?
            .iter()
            .find(|doc| record_id(doc) == Some(id))
            .cloned()
    }

    pub async fn insert(&self, collection: &str, docs: Vec<Map<String, Value>>) -> Vec<Value> {
        let created: Vec<Value> = docs
            .into_iter()
            .map(|mut doc| {
                doc.insert("_id".into(), Value::String(Uuid::now_v7().to_string()));
                Value::Object(doc)
            })
            .collect();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(created.iter().cloned());
        created
    }

    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Value, RecordError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| record_id(doc) == Some(id)))
            .ok_or_else(|| RecordError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        if let Value::Object(fields) = doc {
            for (key, value) in patch.into_iter().filter(|(k, _)| k != "_id") {
                fields.insert(key, value);
            }
        }
        Ok(doc.clone())
    }

    /// Remove the given ids; returns how many existed.
    pub async fn remove(&self, collection: &str, ids: &[String]) -> usize {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return 0;
        };
        let before = docs.len();
        docs.retain(|doc| !record_id(doc).is_some_and(|id| ids.iter().any(|i| i == id)));
        before - docs.len()
    }

    /// Add or drop child ids in the owner's `field` array.
    pub async fn relate(
        &self,
        owner: &str,
        owner_id: &str,
        child: &str,
        child_ids: &[String],
        attach: bool,
    ) -> Result<(), RecordError> {
        let mut collections = self.collections.write().await;

        if attach {
            let known = collections.get(child);
            for id in child_ids {
                let exists = known
                    .is_some_and(|docs| docs.iter().any(|doc| record_id(doc) == Some(id.as_str())));
                if !exists {
                    return Err(RecordError::NotFound {
                        collection: child.to_string(),
                        id: id.clone(),
                    });
                }
            }
        }

        let doc = collections
            .get_mut(owner)
            .and_then(|docs| docs.iter_mut().find(|doc| record_id(doc) == Some(owner_id)))
            .ok_or_else(|| RecordError::NotFound {
                collection: owner.to_string(),
                id: owner_id.to_string(),
            })?;
        let Value::Object(fields) = doc else {
            return Ok(());
        };
        let links = fields
            .entry(child.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !links.is_array() {
            *links = Value::Array(Vec::new());
        }
        if let Value::Array(links) = links {
            for id in child_ids {
                let present = links.iter().any(|l| l.as_str() == Some(id.as_str()));
                if attach && !present {
                    links.push(Value::String(id.clone()));
                }
            }
            if !attach {
                links.retain(|l| !l.as_str().is_some_and(|l| child_ids.iter().any(|id| id == l)));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
struct CollectionState {
    records: RecordService,
    name: Arc<str>,
}

#[derive(Clone)]
struct AssociationState {
    records: RecordService,
    owner: Arc<str>,
    child: Arc<str>,
}

async fn create_records(
    State(state): State<CollectionState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (docs, many) = match payload {
        Value::Object(doc) => (vec![doc], false),
        Value::Array(items) => {
            let docs = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(doc) => Ok(doc),
                    other => Err(RecordError::Validation(format!("not a record: {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            (docs, true)
        }
        other => {
            return Err(RecordError::Validation(format!("not a record: {other}")).into());
        }
    };

    let mut created = state.records.insert(&state.name, docs).await;
    tracing::info!(collection = %state.name, count = created.len(), "records created");
    let body = match (many, created.pop()) {
        (false, Some(doc)) => doc,
        (_, last) => {
            created.extend(last);
            Value::Array(created)
        }
    };
    Ok((StatusCode::CREATED, Json(body)))
}

async fn update_record(
    State(state): State<CollectionState>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.records.update(&state.name, &id, patch).await?;
    Ok(Json(doc))
}

async fn delete_record(
    State(state): State<CollectionState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.records.remove(&state.name, std::slice::from_ref(&id)).await;
    match removed {
        0 => Err(RecordError::NotFound {
            collection: state.name.to_string(),
            id,
        }
        .into()),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

async fn delete_records(
    State(state): State<CollectionState>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ids = ids_from_payload(&payload, "_id")?;
    let removed = state.records.remove(&state.name, &ids).await;
    tracing::info!(collection = %state.name, removed, "records deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_one(
    State(state): State<AssociationState>,
    Path((owner_id, child_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .records
        .relate(&state.owner, &owner_id, &state.child, &[child_id], true)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_many(
    State(state): State<AssociationState>,
    Path(owner_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ids = ids_from_payload(&payload, "childId")?;
    state
        .records
        .relate(&state.owner, &owner_id, &state.child, &ids, true)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_one(
    State(state): State<AssociationState>,
    Path((owner_id, child_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .records
        .relate(&state.owner, &owner_id, &state.child, &[child_id], false)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_many(
    State(state): State<AssociationState>,
    Path(owner_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ids = ids_from_payload(&payload, "childId")?;
    state
        .records
        .relate(&state.owner, &owner_id, &state.child, &ids, false)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /{name}`, `DELETE /{name}`, `PUT|DELETE /{name}/{_id}`.
pub fn collection_routes(records: RecordService, hooks: &HookFactory, meta: &CollectionMeta) -> Router {
    let state = CollectionState {
        records,
        name: Arc::from(meta.name()),
    };
    let base = format!("/{}", meta.name());
    let item = format!("/{}/{{_id}}", meta.name());

    Router::new()
        .route(
            &base,
            post(create_records)
                .layer(middleware::from_fn_with_state(hooks.log_create(meta), audit_layer)),
        )
        .route(
            &base,
            delete(delete_records)
                .layer(middleware::from_fn_with_state(hooks.log_delete(meta), audit_layer)),
        )
        .route(
            &item,
            put(update_record)
                .layer(middleware::from_fn_with_state(hooks.log_update(meta), audit_layer)),
        )
        .route(
            &item,
            delete(delete_record)
                .layer(middleware::from_fn_with_state(hooks.log_delete(meta), audit_layer)),
        )
        .with_state(state)
}

/// `POST|DELETE /{owner}/{ownerId}/{child}` and
/// `PUT|DELETE /{owner}/{ownerId}/{child}/{childId}`.
pub fn association_routes(
    records: RecordService,
    hooks: &HookFactory,
    owner: &CollectionMeta,
    child: &CollectionMeta,
    association_type: AssociationType,
) -> Router {
    let state = AssociationState {
        records,
        owner: Arc::from(owner.name()),
        child: Arc::from(child.name()),
    };
    let many = format!("/{}/{{ownerId}}/{}", owner.name(), child.name());
    let one = format!("/{}/{{ownerId}}/{}/{{childId}}", owner.name(), child.name());
    let add = hooks.log_add(owner, child, association_type);
    let remove = hooks.log_remove(owner, child, association_type);

    Router::new()
        .route(
            &many,
            post(add_many).layer(middleware::from_fn_with_state(add.clone(), audit_layer)),
        )
        .route(
            &many,
            delete(remove_many).layer(middleware::from_fn_with_state(remove.clone(), audit_layer)),
        )
        .route(
            &one,
            put(add_one).layer(middleware::from_fn_with_state(add, audit_layer)),
        )
        .route(
            &one,
            delete(remove_one).layer(middleware::from_fn_with_state(remove, audit_layer)),
        )
        .with_state(state)
}
