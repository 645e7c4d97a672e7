/*!
`exec.rs`

Implements `azmcp exec`: run one command in-process and print its envelope.

  azmcp exec monitor metrics query --param subscription=sub-1 \
      --param workspace=ops-logs --param metric-names=cpu-percent \
      --param start-time=2026-03-01T00:00:00Z --param end-time=2026-03-02T00:00:00Z

The command may be given as separate words or as its tool name
(`monitor-metrics-query`). Parameters come from:
  --param KEY=VALUE              (repeatable)
  --param-file params.(json|yaml) (merged; CLI --param overrides file entries)

Ctrl-C cancels the in-flight command (envelope status 499). The process
exits non-zero whenever the envelope status is 400 or above.

JSON output is the envelope itself:
{ "status": 200, "message": "Success", "result": { ... } }
*/

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, status_role};
use crate::cmd::shared::collect_params;
use crate::command::{CommandRegistry, CommandResponse, HostInfo};

/* -------------------------------------------------------------------------- */
/* Argument Struct                                                            */
/* -------------------------------------------------------------------------- */

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Command to run, e.g. `monitor log query` or `monitor-log-query`
    #[arg(value_name = "COMMAND", required = true, num_args = 1..)]
    pub command: Vec<String>,

    /// Provide parameter (KEY=VALUE), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from file (JSON or YAML). CLI --param overrides file entries
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/* -------------------------------------------------------------------------- */
/* Public Entry Point                                                         */
/* -------------------------------------------------------------------------- */

pub async fn execute_exec(
    registry: &CommandRegistry,
    args: ExecArgs,
    timeout: Option<Duration>,
) -> Result<()> {
    let name = args.command.join(" ");
    let raw = match collect_params(&args.params, args.param_file.as_deref()) {
        Ok(raw) => raw,
        Err(e) => return output_error(args.json, &format!("{e:#}")),
    };
    debug!(command = %name, params = raw.len(), "exec");

    let cancellation = CancellationToken::new();
    let ctrl_c = {
        let token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let mut ctx = registry
        .new_context()
        .with_host(HostInfo::cli())
        .with_cancellation(cancellation);
    if let Some(t) = timeout {
        ctx = ctx.with_deadline(t);
    }

    let started = Instant::now();
    let response = registry.dispatch(&name, &raw, ctx).await;
    let elapsed_ms = started.elapsed().as_millis();
    ctrl_c.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_human(&name, &response, elapsed_ms);
    }

    if response.status >= 400 {
        bail!("{name}: {} {}", response.status, response.message);
    }
    Ok(())
}

/* -------------------------------------------------------------------------- */
/* Output Helpers                                                              */
/* -------------------------------------------------------------------------- */

fn print_human(name: &str, response: &CommandResponse, elapsed_ms: u128) {
    let style = StyleOptions::detect();
    let tag = if response.is_success() { "success" } else { "error" };
    let header = box_header(
        format!("{} {name}", emoji(tag, &style)),
        Some(color(
            status_role(response.status),
            format!("{} {} • {elapsed_ms} ms", response.status, response.message),
            &style,
        )),
        &style,
    );
    println!("{header}");

    match &response.result {
        Some(result) => {
            println!("{}", color(Role::Accent, "Result:", &style));
            println!(
                "{}",
                serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
            );
        }
        None if !response.is_success() => {
            println!(
                "{} {}",
                emoji("info", &style),
                color(
                    Role::Dim,
                    "Run `azmcp list` to see commands and their required options.",
                    &style
                )
            );
        }
        None => {}
    }
}

fn output_error(json: bool, msg: &str) -> Result<()> {
    if json {
        let err = serde_json::json!({"status": 400, "message": msg});
        println!(
            "{}",
            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        let title = format!("{} Exec Error", emoji("error", &style));
        let boxed = box_header(title, Some(color(Role::Error, msg, &style)), &style);
        println!("{boxed}");
    }
    bail!(msg.to_string())
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::shared::{RuntimeConfig, build_registry};
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Exec(ExecArgs),
    }

    fn parse(argv: &[&str]) -> ExecArgs {
        let TestSub::Exec(a) = TestCli::try_parse_from(argv).unwrap().cmd;
        a
    }

    #[test]
    fn clap_collects_command_words() {
        let a = parse(&[
            "t",
            "exec",
            "monitor",
            "log",
            "query",
            "--param",
            "workspace=ops",
            "--json",
        ]);
        assert_eq!(a.command.join(" "), "monitor log query");
        assert_eq!(a.params, vec!["workspace=ops"]);
        assert!(a.json);
    }

    #[test]
    fn clap_requires_a_command() {
        assert!(TestCli::try_parse_from(["t", "exec"]).is_err());
    }

    #[tokio::test]
    async fn missing_options_exit_non_zero() {
        let registry = build_registry(&RuntimeConfig::resolve(None, Some(5)).unwrap()).unwrap();
        let args = parse(&["t", "exec", "appinsights-app-correlate", "--json"]);
        let err = execute_exec(&registry, args, Some(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "appinsights-app-correlate: 400 Missing Required options: --data-sets"
        );
    }

    #[tokio::test]
    async fn malformed_param_is_reported() {
        let registry = build_registry(&RuntimeConfig::resolve(None, Some(5)).unwrap()).unwrap();
        let args = parse(&[
            "t", "exec", "monitor", "workspace", "list", "--param", "oops", "--json",
        ]);
        let err = execute_exec(&registry, args, None).await.unwrap_err();
        assert!(err.to_string().contains("expected KEY=VALUE"));
    }
}
