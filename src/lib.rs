pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    adapters::records::{RecordService, association_routes, collection_routes},
    axum::Router,
    domain::audit::{AssociationType, CollectionMeta},
    services::capture::HookFactory,
};

/// The demo service: a `user` collection, a `group` collection and the
/// many-to-many link between them under `/links`, all audited.
pub fn app(records: RecordService, hooks: &HookFactory) -> Router {
    let user = CollectionMeta::new("user");
    let group = CollectionMeta::new("group");

    Router::new()
        .merge(collection_routes(records.clone(), hooks, &user))
        .merge(collection_routes(records.clone(), hooks, &group))
        .nest(
            "/links",
            association_routes(records, hooks, &user, &group, AssociationType::ManyMany),
        )
}
