//! Service Bus: topics and topic subscriptions.

pub mod commands;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;

use crate::areas::Area;
use crate::command::{AreaManifest, RegistryBuilder, ServiceError, WiringError};
use commands::{
    NamespaceOptions, SubscriptionListCommand, TopicDetailsCommand, TopicListCommand, TopicOptions,
};
use models::{
    SubscriptionDetails, SubscriptionListCommandResult, TopicDetails, TopicDetailsCommandResult,
    TopicListCommandResult,
};

pub const DECLARED: &[&str] = &[
    "servicebus topic list",
    "servicebus topic details",
    "servicebus subscription list",
];

#[async_trait]
pub trait ServiceBusService: Send + Sync {
    async fn list_topics(&self, options: &NamespaceOptions) -> Result<Vec<String>, ServiceError>;

    async fn topic_details(&self, options: &TopicOptions) -> Result<TopicDetails, ServiceError>;

    async fn list_subscriptions(
        &self,
        options: &TopicOptions,
    ) -> Result<Vec<SubscriptionDetails>, ServiceError>;
}

pub fn manifest() -> AreaManifest {
    AreaManifest::new(Area::ServiceBus.as_str())
        .register::<TopicListCommandResult>()
        .register::<TopicDetailsCommandResult>()
        .register::<SubscriptionListCommandResult>()
}

pub fn register(builder: &mut RegistryBuilder) -> Result<(), WiringError> {
    let service: Arc<dyn ServiceBusService> =
        builder.locator().service::<dyn ServiceBusService>()?;
    builder
        .area(Area::ServiceBus, manifest(), DECLARED)
        .command(TopicListCommand::new(service.clone()))
        .command(TopicDetailsCommand::new(service.clone()))
        .command(SubscriptionListCommand::new(service));
    Ok(())
}
