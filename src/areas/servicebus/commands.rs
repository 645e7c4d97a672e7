/*!
Service Bus commands.

  servicebus topic list          - topic names in a namespace
  servicebus topic details       - runtime details of one topic
  servicebus subscription list   - subscriptions of one topic with message counts

Options compose by value:
TopicOptions { namespace: NamespaceOptions { base: SubscriptionOptions } }.
*/

use std::sync::Arc;

use async_trait::async_trait;

use super::ServiceBusService;
use super::models::{
    SubscriptionListCommandResult, TopicDetailsCommandResult, TopicListCommandResult,
};
use crate::areas::Area;
use crate::areas::options::{SubscriptionOptions, with_subscription};
use crate::command::{
    Command, CommandContext, CommandError, CommandOptions, OptionDef, OptionKind, ParsedArgs,
    ValidationError,
};

const NAMESPACE: &str = "namespace";
const TOPIC_NAME: &str = "topic-name";

fn namespace_def() -> OptionDef {
    OptionDef::required(
        NAMESPACE,
        OptionKind::String,
        "Service Bus namespace name (e.g. contoso-bus)",
    )
}

#[derive(Debug, Clone)]
pub struct NamespaceOptions {
    pub base: SubscriptionOptions,
    pub namespace: String,
}

impl CommandOptions for NamespaceOptions {
    fn definitions() -> Vec<OptionDef> {
        with_subscription([namespace_def()])
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        Ok(Self {
            base: SubscriptionOptions::from_args(args)?,
            namespace: args.require_string(NAMESPACE)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TopicOptions {
    pub namespace: NamespaceOptions,
    pub topic_name: String,
}

impl CommandOptions for TopicOptions {
    fn definitions() -> Vec<OptionDef> {
        with_subscription([
            namespace_def(),
            OptionDef::required(TOPIC_NAME, OptionKind::String, "Topic name"),
        ])
    }

    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        Ok(Self {
            namespace: NamespaceOptions::from_args(args)?,
            topic_name: args.require_string(TOPIC_NAME)?,
        })
    }
}

/* ---- topic list ---- */

pub struct TopicListCommand {
    service: Arc<dyn ServiceBusService>,
}

impl TopicListCommand {
    pub fn new(service: Arc<dyn ServiceBusService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for TopicListCommand {
    type Options = NamespaceOptions;
    type Output = TopicListCommandResult;

    const NAME: &'static str = "servicebus topic list";
    const DESCRIPTION: &'static str = "List topic names in a Service Bus namespace.";
    const AREA: Area = Area::ServiceBus;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: NamespaceOptions,
    ) -> Result<TopicListCommandResult, CommandError> {
        let mut topics = self.service.list_topics(&options).await?;
        topics.sort();
        Ok(TopicListCommandResult { topics })
    }
}

/* ---- topic details ---- */

pub struct TopicDetailsCommand {
    service: Arc<dyn ServiceBusService>,
}

impl TopicDetailsCommand {
    pub fn new(service: Arc<dyn ServiceBusService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for TopicDetailsCommand {
    type Options = TopicOptions;
    type Output = TopicDetailsCommandResult;

    const NAME: &'static str = "servicebus topic details";
    const DESCRIPTION: &'static str = "Get runtime details of a Service Bus topic: status, size \
         and subscription count.";
    const AREA: Area = Area::ServiceBus;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: TopicOptions,
    ) -> Result<TopicDetailsCommandResult, CommandError> {
        let topic = self.service.topic_details(&options).await?;
        Ok(TopicDetailsCommandResult { topic })
    }
}

/* ---- subscription list ---- */

pub struct SubscriptionListCommand {
    service: Arc<dyn ServiceBusService>,
}

impl SubscriptionListCommand {
    pub fn new(service: Arc<dyn ServiceBusService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for SubscriptionListCommand {
    type Options = TopicOptions;
    type Output = SubscriptionListCommandResult;

    const NAME: &'static str = "servicebus subscription list";
    const DESCRIPTION: &'static str = "List subscriptions of a Service Bus topic with active \
         and dead-letter message counts.";
    const AREA: Area = Area::ServiceBus;

    async fn execute(
        &self,
        _ctx: &CommandContext,
        options: TopicOptions,
    ) -> Result<SubscriptionListCommandResult, CommandError> {
        let subscriptions = self.service.list_subscriptions(&options).await?;
        Ok(SubscriptionListCommandResult { subscriptions })
    }
}
