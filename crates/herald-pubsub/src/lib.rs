//! Herald PubSub - topic broker and subscription lifecycle.
//!
//! A subscription operation selects exactly one root field of the schema's
//! subscription type; that field's name is the topic. Publishing a payload to
//! a topic re-executes every subscribed operation with the payload as root
//! value and hands each result to its subscriber.
//!
//! ```rust,ignore
//! let manager = SubscriptionManager::new(Arc::new(Broker::new()));
//! let token = manager
//!     .subscribe(
//!         SubscriptionParams::new(schema, "subscription { disturbance { magnitude } }"),
//!         |result| println!("{}", result.to_json()),
//!     )
//!     .await?;
//! manager.publish("disturbance", json!({ "magnitude": 5 })).await;
//! token.unsubscribe().await;
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod manager;
pub mod resolve;

pub use broker::{Broker, Listener};
pub use config::{DeliveryMode, SubscriptionConfig, DEFAULT_SOURCE_NAME};
pub use error::{Error, ValidationErrors};
pub use manager::{SubscriptionManager, SubscriptionParams, SubscriptionToken};
pub use resolve::{resolve_topic, SubscriptionDefinition};

/// Shared manager handle.
pub type SharedSubscriptionManager = std::sync::Arc<SubscriptionManager>;
