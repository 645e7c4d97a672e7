//! Service backends and their wiring into the locator.

pub mod fixture;
pub mod unconfigured;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::areas::appinsights::AppInsightsService;
use crate::areas::monitor::MonitorService;
use crate::areas::servicebus::ServiceBusService;
use crate::command::ServiceLocator;
pub use fixture::{FixtureBackend, FixtureDocument};
pub use unconfigured::UnconfiguredBackend;

/// Register one backend under every area's service trait.
pub fn provide_all<B>(locator: &mut ServiceLocator, backend: Arc<B>)
where
    B: AppInsightsService + MonitorService + ServiceBusService + 'static,
{
    locator
        .provide::<dyn AppInsightsService>(backend.clone())
        .provide::<dyn MonitorService>(backend.clone())
        .provide::<dyn ServiceBusService>(backend);
}

pub fn build_locator(fixtures: Option<&Path>) -> Result<ServiceLocator> {
    let mut locator = ServiceLocator::new();
    match fixtures {
        Some(path) => {
            let backend = FixtureBackend::load(path)?;
            info!(path = %path.display(), "using fixture backend");
            provide_all(&mut locator, Arc::new(backend));
        }
        None => {
            warn!("no fixture document configured; every service call will report unavailable");
            provide_all(&mut locator, Arc::new(UnconfiguredBackend));
        }
    }
    Ok(locator)
}
