//! Herald - GraphQL-style subscriptions over an in-process topic broker.
//!
//! This crate bundles the query language, the execution engine and the
//! subscription runtime behind one dependency, and adds a process-wide
//! default [`SubscriptionManager`] for applications that only need one.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use herald::{FieldDef, ObjectType, ScalarType, Schema, SubscriptionParams, TypeRef};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), herald::Error> {
//! let schema = Schema::builder(
//!     ObjectType::new("Query").with_field(FieldDef::new("ping", TypeRef::scalar(ScalarType::Boolean))),
//! )
//! .subscription(
//!     ObjectType::new("Subscription").with_field(FieldDef::new("tick", TypeRef::scalar(ScalarType::Int))),
//! )
//! .finish()
//! .expect("valid schema");
//!
//! let token = herald::subscribe(
//!     SubscriptionParams::new(Arc::new(schema), "subscription { tick }"),
//!     |result| println!("{}", result.to_json()),
//! )
//! .await?;
//!
//! herald::publish("tick", json!({ "tick": 1 })).await;
//! token.unsubscribe().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use herald_core::{
    execute, validate, ArgumentDef, ContextValue, ExecutionError, ExecutionResult, FieldDef,
    FieldError, ObjectType, ResolverContext, ResponseError, ScalarType, Schema, SchemaError,
    TypeRef, ValidationError,
};
pub use herald_lang::{parse, Document, ParseError};
pub use herald_pubsub::{
    resolve_topic, Broker, DeliveryMode, Error, Listener, SubscriptionConfig,
    SubscriptionDefinition, SubscriptionManager, SubscriptionParams, SubscriptionToken,
};

/// Re-export the member crates.
pub use herald_core as engine;
pub use herald_lang as lang;
pub use herald_pubsub as pubsub;

static GLOBAL_MANAGER: OnceLock<SubscriptionManager> = OnceLock::new();

/// The process-wide default manager, created on first use with its own broker.
pub fn global() -> &'static SubscriptionManager {
    GLOBAL_MANAGER.get_or_init(|| SubscriptionManager::new(Arc::new(Broker::new())))
}

/// Install `manager` as the process-wide default.
///
/// Fails, handing the manager back, if a default is already in place.
pub fn set_global(manager: SubscriptionManager) -> Result<(), SubscriptionManager> {
    match GLOBAL_MANAGER.set(manager) {
        Ok(()) => {
            tracing::debug!("default subscription manager installed");
            Ok(())
        }
        Err(manager) => {
            tracing::warn!("default subscription manager already in place");
            Err(manager)
        }
    }
}

/// Subscribe through the default manager.
pub async fn subscribe<F>(
    params: SubscriptionParams,
    on_result: F,
) -> Result<SubscriptionToken, Error>
where
    F: Fn(ExecutionResult) + Send + Sync + 'static,
{
    global().subscribe(params, on_result).await
}

/// Publish through the default manager.
pub async fn publish(topic: &str, payload: Value) {
    global().publish(topic, payload).await
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Returns `false` if a global subscriber already exists.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> Arc<Schema> {
        let query = ObjectType::new("Query")
            .with_field(FieldDef::new("ping", TypeRef::scalar(ScalarType::Boolean)));
        let subscription = ObjectType::new("Subscription")
            .with_field(FieldDef::new("facadeTick", TypeRef::scalar(ScalarType::Int)));
        Arc::new(
            Schema::builder(query)
                .subscription(subscription)
                .finish()
                .unwrap(),
        )
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(global(), global()));
        assert!(Arc::ptr_eq(global().broker(), global().broker()));
    }

    #[test]
    fn test_set_global_after_first_use_hands_manager_back() {
        let first = global();
        let rejected = set_global(SubscriptionManager::default()).unwrap_err();

        assert!(!Arc::ptr_eq(rejected.broker(), first.broker()));
        assert!(std::ptr::eq(global(), first));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing("herald=debug");
        assert!(!init_tracing("herald=debug"));
    }

    #[tokio::test]
    async fn test_global_subscribe_and_publish() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let token = subscribe(
            SubscriptionParams::new(schema(), "subscription { facadeTick }"),
            move |result| {
                assert_eq!(result.data, Some(json!({ "facadeTick": 4 })));
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        publish("facadeTick", json!({ "facadeTick": 4 })).await;
        token.unsubscribe().await;
        publish("facadeTick", json!({ "facadeTick": 5 })).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
