//! Subscription manager: subscribe, unsubscribe and publish.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use herald_core::{execute, ContextValue, ExecutionResult, Schema};
use serde_json::{Map, Value};

use crate::broker::{Broker, Listener};
use crate::config::{DeliveryMode, SubscriptionConfig};
use crate::error::Error;
use crate::resolve::{parse_subscription, resolve_document, SubscriptionDefinition};

/// Everything needed to run a subscription on each delivery.
#[derive(Clone)]
pub struct SubscriptionParams {
    pub schema: Arc<Schema>,
    pub query: String,
    pub context_value: Option<ContextValue>,
    pub variable_values: Map<String, Value>,
    pub operation_name: Option<String>,
}

impl SubscriptionParams {
    pub fn new(schema: Arc<Schema>, query: impl Into<String>) -> Self {
        Self {
            schema,
            query: query.into(),
            context_value: None,
            variable_values: Map::new(),
            operation_name: None,
        }
    }

    /// Set the context value handed to every resolver.
    pub fn with_context(mut self, context: ContextValue) -> Self {
        self.context_value = Some(context);
        self
    }

    /// Replace the variables.
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variable_values = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variable_values.insert(name.into(), value);
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

impl fmt::Debug for SubscriptionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionParams")
            .field("query", &self.query)
            .field("has_context", &self.context_value.is_some())
            .field("variable_values", &self.variable_values)
            .field("operation_name", &self.operation_name)
            .finish()
    }
}

/// Handle for one active subscription.
///
/// Dropping the token does not cancel the subscription; call
/// [`SubscriptionToken::unsubscribe`].
#[derive(Debug)]
pub struct SubscriptionToken {
    id: u64,
    topic: String,
    listener: Listener,
    broker: Arc<Broker>,
    active: AtomicBool,
}

impl SubscriptionToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop deliveries to this subscription. Calling it again does nothing.
    pub async fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        self.broker.deregister(&self.topic, &self.listener);
        tracing::debug!(
            subscription_id = self.id,
            topic = %self.topic,
            "subscription removed"
        );
    }
}

/// Manager for subscriptions over a shared broker.
pub struct SubscriptionManager {
    broker: Arc<Broker>,
    config: SubscriptionConfig,
    next_subscription_id: AtomicU64,
}

impl SubscriptionManager {
    /// Create a manager over `broker` with the default configuration.
    pub fn new(broker: Arc<Broker>) -> Self {
        Self::with_config(broker, SubscriptionConfig::default())
    }

    pub fn with_config(broker: Arc<Broker>, config: SubscriptionConfig) -> Self {
        Self {
            broker,
            config,
            next_subscription_id: AtomicU64::new(1),
        }
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Resolve the topic `query` would subscribe to.
    pub fn resolve_topic(
        &self,
        schema: &Schema,
        query: &str,
    ) -> Result<SubscriptionDefinition, Error> {
        let document = parse_subscription(query, &self.config.source_name)?;
        resolve_document(schema, &document)
    }

    /// Register a subscription.
    ///
    /// On success `on_result` receives one [`ExecutionResult`] per payload
    /// published to the subscription's topic, until the returned token is
    /// unsubscribed. It is never called before this returns.
    pub async fn subscribe<F>(
        &self,
        params: SubscriptionParams,
        on_result: F,
    ) -> Result<SubscriptionToken, Error>
    where
        F: Fn(ExecutionResult) + Send + Sync + 'static,
    {
        let document = Arc::new(parse_subscription(&params.query, &self.config.source_name)?);
        let definition = resolve_document(&params.schema, &document)?;
        let topic = definition.topic().to_string();

        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        let params = Arc::new(params);
        let on_result = Arc::new(on_result);

        let listener = Listener::new(move |payload: Value| {
            let document = document.clone();
            let params = params.clone();
            let on_result = on_result.clone();
            async move {
                let executed = execute(
                    &params.schema,
                    &document,
                    payload,
                    params.context_value.clone(),
                    &params.variable_values,
                    params.operation_name.as_deref(),
                )
                .await;
                let result = match executed {
                    Ok(result) => result,
                    Err(error) => {
                        tracing::warn!(subscription_id = id, %error, "delivery could not execute");
                        ExecutionResult::from_error(error.to_string())
                    }
                };
                tracing::trace!(subscription_id = id, errors = result.errors.len(), "result delivered");
                on_result(result);
            }
        });

        self.broker.register(&topic, listener.clone());

        tracing::debug!(
            subscription_id = id,
            topic = %topic,
            parent_type = %definition.parent_type,
            "subscription created"
        );

        Ok(SubscriptionToken {
            id,
            topic,
            listener,
            broker: self.broker.clone(),
            active: AtomicBool::new(true),
        })
    }

    /// Publish `payload` to every subscription on `topic`.
    ///
    /// Listener failures never surface here; they are reported in each
    /// subscription's results. Detached delivery needs a tokio runtime;
    /// without one the payload is delivered as in settled mode.
    pub async fn publish(&self, topic: &str, payload: Value) {
        let runtime = match self.config.delivery {
            DeliveryMode::Settled => None,
            DeliveryMode::Detached => match tokio::runtime::Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(_) => {
                    tracing::debug!(topic, "no tokio runtime, delivering settled");
                    None
                }
            },
        };

        match runtime {
            Some(handle) => {
                for invocation in self.broker.dispatch(topic, &payload) {
                    handle.spawn(invocation);
                }
            }
            None => {
                self.broker.deliver(topic, &payload).await;
            }
        }
    }

    /// Publish to the topic of a resolved subscription field.
    pub async fn publish_to(&self, definition: &SubscriptionDefinition, payload: Value) {
        self.publish(definition.topic(), payload).await
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new(Arc::new(Broker::new()))
    }
}

impl fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("broker", &self.broker)
            .field("config", &self.config)
            .finish()
    }
}
