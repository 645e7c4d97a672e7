//! Per-invocation carrier: locator handle, tracing activity, host handle,
//! cancellation, and the single response envelope.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::error::WiringError;
use crate::command::locator::ServiceLocator;
use crate::command::response::CommandResponse;

/// Who is hosting this invocation (MCP server, CLI exec, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub transport: &'static str,
    pub client: Option<String>,
}

impl HostInfo {
    pub fn cli() -> Self {
        Self {
            transport: "cli",
            client: None,
        }
    }
}

#[derive(Debug)]
pub struct CommandContext {
    services: Arc<ServiceLocator>,
    activity: Option<tracing::Span>,
    host: Option<HostInfo>,
    cancellation: CancellationToken,
    deadline: Option<Duration>,
    pub response: CommandResponse,
}

impl CommandContext {
    pub fn new(services: Arc<ServiceLocator>) -> Self {
        Self {
            services,
            activity: None,
            host: None,
            cancellation: CancellationToken::new(),
            deadline: None,
            response: CommandResponse::default(),
        }
    }

    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Resolve a capability from the shared locator. Wiring code only.
    pub fn service<S>(&self) -> Result<Arc<S>, WiringError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.services.service::<S>()
    }

    pub fn activity(&self) -> Option<&tracing::Span> {
        self.activity.as_ref()
    }

    pub(crate) fn set_activity(&mut self, span: tracing::Span) {
        self.activity = Some(span);
    }

    pub fn host(&self) -> Option<&HostInfo> {
        self.host.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn into_response(self) -> CommandResponse {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Clock: std::fmt::Debug + Send + Sync {
        fn now(&self) -> u64;
    }

    #[derive(Debug)]
    struct Fixed;

    impl Clock for Fixed {
        fn now(&self) -> u64 {
            42
        }
    }

    #[test]
    fn fresh_context_is_successful_and_uncancelled() {
        let ctx = CommandContext::new(Arc::new(ServiceLocator::new()));
        assert_eq!(ctx.response, CommandResponse::default());
        assert!(!ctx.cancellation().is_cancelled());
        assert!(ctx.activity().is_none());
        assert!(ctx.host().is_none());
        assert_eq!(ctx.deadline(), None);
    }

    #[test]
    fn resolves_services_from_the_locator() {
        let mut locator = ServiceLocator::new();
        locator.provide::<dyn Clock>(Arc::new(Fixed));
        let ctx = CommandContext::new(Arc::new(locator));
        assert_eq!(ctx.service::<dyn Clock>().unwrap().now(), 42);
    }

    #[test]
    fn missing_service_is_a_wiring_error() {
        let ctx = CommandContext::new(Arc::new(ServiceLocator::new()));
        let err = ctx.service::<dyn Clock>().unwrap_err();
        assert!(err.to_string().starts_with("no service registered for capability"));
    }

    #[test]
    fn builders_attach_host_token_and_deadline() {
        let token = CancellationToken::new();
        let ctx = CommandContext::new(Arc::new(ServiceLocator::new()))
            .with_host(HostInfo::cli())
            .with_cancellation(token.clone())
            .with_deadline(Duration::from_secs(3));
        token.cancel();
        assert!(ctx.cancellation().is_cancelled());
        assert_eq!(ctx.host().map(|h| h.transport), Some("cli"));
        assert_eq!(ctx.deadline(), Some(Duration::from_secs(3)));
    }
}
