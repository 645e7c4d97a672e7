//! `azmcp serve`: run the MCP server on stdio.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::ensure_clean;
use crate::command::CommandRegistry;
use crate::mcp;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {}

pub async fn execute_serve(
    registry: Arc<CommandRegistry>,
    _args: ServeArgs,
    timeout: Option<Duration>,
) -> Result<()> {
    ensure_clean(&registry)?;
    mcp::serve(registry, timeout).await
}
