use serde::{Deserialize, Serialize};

use crate::command::ResultType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetails {
    pub name: String,
    pub status: String,
    pub size_in_bytes: i64,
    pub subscription_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_in_megabytes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub subscription_name: String,
    pub topic_name: String,
    pub status: String,
    pub active_message_count: i64,
    pub dead_letter_message_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicListCommandResult {
    pub topics: Vec<String>,
}

impl ResultType for TopicListCommandResult {
    const TYPE_NAME: &'static str = "TopicListCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetailsCommandResult {
    pub topic: TopicDetails,
}

impl ResultType for TopicDetailsCommandResult {
    const TYPE_NAME: &'static str = "TopicDetailsCommandResult";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListCommandResult {
    pub subscriptions: Vec<SubscriptionDetails>,
}

impl ResultType for SubscriptionListCommandResult {
    const TYPE_NAME: &'static str = "SubscriptionListCommandResult";
}
