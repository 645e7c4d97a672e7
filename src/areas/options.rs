//! Options shared by most commands, embedded by value in each command's
//! options type.

use crate::command::{OptionDef, OptionKind, ParsedArgs, ValidationError};

pub const SUBSCRIPTION: &str = "subscription";
pub const TENANT: &str = "tenant";
pub const RESOURCE_GROUP: &str = "resource-group";
pub const START_TIME: &str = "start-time";
pub const END_TIME: &str = "end-time";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Subscription id or display name.
    pub subscription: String,
    pub tenant: Option<String>,
}

impl SubscriptionOptions {
    pub fn definitions() -> Vec<OptionDef> {
        vec![
            OptionDef::required(
                SUBSCRIPTION,
                OptionKind::String,
                "Azure subscription id or name",
            ),
            OptionDef::optional(TENANT, OptionKind::String, "Microsoft Entra tenant id or name"),
        ]
    }

    pub fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError> {
        Ok(Self {
            subscription: args.require_string(SUBSCRIPTION)?,
            tenant: args.string(TENANT),
        })
    }
}

/// Base definitions followed by a command's own.
pub fn with_subscription(own: impl IntoIterator<Item = OptionDef>) -> Vec<OptionDef> {
    let mut defs = SubscriptionOptions::definitions();
    defs.extend(own);
    defs
}

const START_HELP: &str = "Start of the time range (RFC 3339)";
const END_HELP: &str = "End of the time range (RFC 3339)";

pub fn time_range_definitions(required: bool) -> [OptionDef; 2] {
    if required {
        [
            OptionDef::required(START_TIME, OptionKind::DateTime, START_HELP),
            OptionDef::required(END_TIME, OptionKind::DateTime, END_HELP),
        ]
    } else {
        [
            OptionDef::optional(START_TIME, OptionKind::DateTime, START_HELP),
            OptionDef::optional(END_TIME, OptionKind::DateTime, END_HELP),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::options::validate;
    use serde_json::json;

    #[test]
    fn subscription_is_declared_first() {
        let defs = with_subscription([OptionDef::required(
            "namespace",
            OptionKind::String,
            "ns",
        )]);
        let names: Vec<_> = defs.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["subscription", "tenant", "namespace"]);

        let err = validate(&defs, &json!({}).as_object().cloned().unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing Required options: --subscription --namespace"
        );
    }

    #[test]
    fn builds_from_args() {
        let defs = SubscriptionOptions::definitions();
        let args = validate(
            &defs,
            &json!({"subscription": "sub-1", "tenant": "contoso"})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();
        let opts = SubscriptionOptions::from_args(&args).unwrap();
        assert_eq!(opts.subscription, "sub-1");
        assert_eq!(opts.tenant.as_deref(), Some("contoso"));
    }
}
