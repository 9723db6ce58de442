//! Subscription manager configuration.

/// Label used for the query text in syntax diagnostics.
pub const DEFAULT_SOURCE_NAME: &str = "GraphQL request";

/// How `publish` waits on listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Resolve once every invoked listener has settled.
    #[default]
    Settled,
    /// Spawn each listener on the current tokio runtime and resolve after
    /// dispatch. Outside a tokio runtime this behaves like `Settled`.
    Detached,
}

/// Subscription manager configuration.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub delivery: DeliveryMode,

    /// Label for the query text when rendering syntax errors.
    pub source_name: String,
}

impl SubscriptionConfig {
    pub fn new() -> Self {
        Self {
            delivery: DeliveryMode::default(),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }

    /// Set the delivery mode.
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Set the source label used in syntax diagnostics.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SubscriptionConfig::default();
        assert_eq!(config.delivery, DeliveryMode::Settled);
        assert_eq!(config.source_name, DEFAULT_SOURCE_NAME);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SubscriptionConfig::new()
            .with_delivery(DeliveryMode::Detached)
            .with_source_name("disturbances.graphql");

        assert_eq!(config.delivery, DeliveryMode::Detached);
        assert_eq!(config.source_name, "disturbances.graphql");
    }
}
