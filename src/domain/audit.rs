use {
    chrono::{DateTime, Utc},
    derive_more::Display,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// Verb semantics of an audited operation. Not always the transport verb:
/// relationship adds are recorded as PUT or POST depending on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Add,
    Remove,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Add => "Add",
            Self::Remove => "Remove",
        }
    }

    /// Relationship actions need a child collection and association type.
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Add | Self::Remove)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationType {
    #[serde(rename = "ONE_ONE")]
    OneOne,
    #[serde(rename = "ONE_MANY")]
    OneMany,
    #[serde(rename = "MANY_ONE")]
    ManyOne,
    #[serde(rename = "MANY_MANY")]
    ManyMany,
    /// One-sided many link with no mirror field on the child.
    #[serde(rename = "_MANY")]
    Many,
}

impl AssociationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneOne => "ONE_ONE",
            Self::OneMany => "ONE_MANY",
            Self::ManyOne => "MANY_ONE",
            Self::ManyMany => "MANY_MANY",
            Self::Many => "_MANY",
        }
    }
}

impl fmt::Display for AssociationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static metadata of an audited collection.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name}")]
pub struct CollectionMeta {
    name: String,
}

impl CollectionMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Per-operation constants a capture hook is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPolicy {
    action: AuditAction,
    owner: CollectionMeta,
    child: Option<CollectionMeta>,
    association_type: Option<AssociationType>,
}

impl AuditPolicy {
    pub fn new(
        action: AuditAction,
        owner: CollectionMeta,
        child: Option<CollectionMeta>,
        association_type: Option<AssociationType>,
    ) -> Self {
        Self {
            action,
            owner,
            child,
            association_type,
        }
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn owner(&self) -> &CollectionMeta {
        &self.owner
    }

    pub fn child(&self) -> Option<&CollectionMeta> {
        self.child.as_ref()
    }

    pub fn association_type(&self) -> Option<AssociationType> {
        self.association_type
    }
}

/// Inputs for [`AuditRecord::new`]. `id` and `created_at` are assigned there.
#[derive(Debug, Clone)]
pub struct NewAuditRecordParams {
    pub method: HttpMethod,
    pub action: AuditAction,
    pub endpoint: String,
    pub user: Option<String>,
    pub collection_name: String,
    pub child_collection_name: Option<String>,
    pub association_type: Option<AssociationType>,
    pub documents: Option<Vec<serde_json::Value>>,
    pub payload: Option<serde_json::Value>,
    pub params: Option<serde_json::Value>,
    pub result: Option<serde_json::Value>,
    pub is_error: bool,
    pub status_code: u16,
    pub response_message: Option<String>,
    pub ip_address: Option<String>,
}

/// One audited operation. Write-once: there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    id: Uuid,
    method: HttpMethod,
    action: AuditAction,
    endpoint: String,
    user: Option<String>,
    collection_name: String,
    child_collection_name: Option<String>,
    association_type: Option<AssociationType>,
    documents: Option<Vec<serde_json::Value>>,
    payload: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    result: Option<serde_json::Value>,
    is_error: bool,
    status_code: u16,
    response_message: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(p: NewAuditRecordParams) -> Self {
        Self {
            id: Uuid::now_v7(),
            method: p.method,
            action: p.action,
            endpoint: p.endpoint,
            user: p.user,
            collection_name: p.collection_name,
            child_collection_name: p.child_collection_name,
            association_type: p.association_type,
            documents: p.documents,
            payload: p.payload,
            params: p.params,
            result: p.result,
            is_error: p.is_error,
            status_code: p.status_code,
            response_message: p.response_message,
            ip_address: p.ip_address,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn child_collection_name(&self) -> Option<&str> {
        self.child_collection_name.as_deref()
    }

    pub fn association_type(&self) -> Option<AssociationType> {
        self.association_type
    }

    pub fn documents(&self) -> Option<&[serde_json::Value]> {
        self.documents.as_deref()
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    pub fn params(&self) -> Option<&serde_json::Value> {
        self.params.as_ref()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn response_message(&self) -> Option<&str> {
        self.response_message.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
