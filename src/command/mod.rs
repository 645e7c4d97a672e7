/*!
Command dispatch convention.

Every command:
  1. declares its options (`CommandOptions::definitions`)
  2. validates a raw argument map into its typed options
  3. executes against the services it was constructed with
  4. leaves the context's `CommandResponse` populated

Typed commands implement [`Command`]; the registry stores them as
[`DynCommand`] trait objects. The blanket `DynCommand::run` is the single
translation point from internal failures to the `{status, message, result}`
envelope.

Modules:
  context  - per-invocation CommandContext
  error    - ValidationError / ServiceError / CommandError / WiringError
  locator  - capability-keyed ServiceLocator (wiring only)
  manifest - per-area result manifests
  options  - option schema + raw argument validation
  registry - name lookup, dispatch, startup self-check
  response - CommandResponse envelope
*/

pub mod context;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod options;
pub mod registry;
pub mod response;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::areas::Area;
pub use context::{CommandContext, HostInfo};
pub use error::{CommandError, ServiceError, ValidationError, WiringError};
pub use locator::ServiceLocator;
pub use manifest::{AreaManifest, ManifestError, ResultType};
pub use options::{CommandOptions, OptionDef, OptionKind, ParsedArgs, RawArgs};
pub use registry::{CommandRegistry, RegistryBuilder, SelfCheckReport};
pub use response::{CommandResponse, SUCCESS_MESSAGE};

/// A typed command.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    type Options: CommandOptions;
    type Output: ResultType;

    /// Space separated command name, e.g. `monitor metrics query`.
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const AREA: Area;
    const READ_ONLY: bool = true;

    fn success_message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        options: Self::Options,
    ) -> Result<Self::Output, CommandError>;
}

/// Object-safe view of a [`Command`], used by the registry.
#[async_trait]
pub trait DynCommand: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn area(&self) -> Area;
    fn read_only(&self) -> bool;
    fn options(&self) -> Vec<OptionDef>;
    fn result_type(&self) -> &'static str;

    /// Validate, execute, and populate `ctx.response`. Never fails: every
    /// error ends up as a status + message pair.
    async fn run(&self, ctx: &mut CommandContext, raw: &RawArgs, manifest: &AreaManifest);
}

#[async_trait]
impl<C: Command> DynCommand for C {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn description(&self) -> &'static str {
        C::DESCRIPTION
    }

    fn area(&self) -> Area {
        C::AREA
    }

    fn read_only(&self) -> bool {
        C::READ_ONLY
    }

    fn options(&self) -> Vec<OptionDef> {
        C::Options::definitions()
    }

    fn result_type(&self) -> &'static str {
        <C::Output as ResultType>::TYPE_NAME
    }

    async fn run(&self, ctx: &mut CommandContext, raw: &RawArgs, manifest: &AreaManifest) {
        match execute_typed(self, ctx, raw, manifest).await {
            Ok(value) => {
                ctx.response.result = Some(value);
                ctx.response.message = self.success_message().to_string();
            }
            Err(err) => {
                log_failure(C::NAME, &err);
                ctx.response.set_error(&err);
            }
        }
    }
}

async fn execute_typed<C: Command>(
    cmd: &C,
    ctx: &CommandContext,
    raw: &RawArgs,
    manifest: &AreaManifest,
) -> Result<serde_json::Value, CommandError> {
    let options = C::Options::parse(raw)?;

    let token = ctx.cancellation().clone();
    let output = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(CommandError::Cancelled),
        out = with_deadline(ctx.deadline(), cmd.execute(ctx, options)) => out?,
    };

    Ok(manifest.to_value(&output)?)
}

async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T, CommandError>
where
    F: Future<Output = Result<T, CommandError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| CommandError::Service(ServiceError::Timeout))?,
        None => fut.await,
    }
}

fn log_failure(name: &str, err: &CommandError) {
    match err {
        CommandError::Validation(e) => tracing::debug!(command = name, "validation failed: {e}"),
        CommandError::Cancelled => tracing::info!(command = name, "cancelled"),
        CommandError::Service(ServiceError::Internal(e)) => {
            tracing::error!(command = name, "service failure: {e:#}")
        }
        CommandError::Service(ServiceError::Unavailable(detail)) => {
            tracing::error!(command = name, "service unavailable: {detail}")
        }
        other => tracing::warn!(command = name, "command failed: {other}"),
    }
}
