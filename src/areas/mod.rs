/*!
Feature areas.

Each area owns:
  - its service trait (the Azure-facing capability commands depend on)
  - its options, result models, and result manifest
  - its command catalogue + `register` wiring function

Areas:
  appinsights - Application Insights diagnostics / correlation / traces
  monitor     - Log Analytics workspaces, metrics and log queries
  servicebus  - Service Bus topics and subscriptions
*/

pub mod appinsights;
pub mod monitor;
pub mod options;
pub mod servicebus;

use std::fmt;

use crate::command::{RegistryBuilder, WiringError};

/// Grouping of related commands sharing one result manifest.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Area {
    /// Application Insights
    #[value(name = "appinsights")]
    AppInsights,
    /// Azure Monitor / Log Analytics
    Monitor,
    /// Service Bus
    #[value(name = "servicebus")]
    ServiceBus,
}

impl Area {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Area::AppInsights => "appinsights",
            Area::Monitor => "monitor",
            Area::ServiceBus => "servicebus",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register every area's manifest, catalogue, and commands.
pub fn register_all(builder: &mut RegistryBuilder) -> Result<(), WiringError> {
    appinsights::register(builder)?;
    monitor::register(builder)?;
    servicebus::register(builder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Area;

    #[test]
    fn value_names_match_display() {
        use clap::ValueEnum;
        for area in Area::value_variants() {
            let pv = area.to_possible_value().unwrap();
            assert_eq!(pv.get_name(), area.as_str());
        }
    }

    #[test]
    fn display_output() {
        assert_eq!(Area::AppInsights.to_string(), "appinsights");
        assert_eq!(Area::ServiceBus.to_string(), "servicebus");
    }
}
