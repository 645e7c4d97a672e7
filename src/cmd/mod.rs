/*!
CLI subcommands.

  serve.rs   (ServeArgs + execute_serve)  MCP server on stdio
  list.rs    (ListArgs  + execute_list)   registered commands and options
  exec.rs    (ExecArgs  + execute_exec)   run one command, print its envelope
  check.rs   (CheckArgs + execute_check)  registry self-check report
  shared.rs  runtime config, registry wiring, parameter collection
  format.rs  box / table / color helpers for human output

Conventions:
  - Each subcommand module exposes exactly one public `execute_*` function
    that returns `anyhow::Result<()>`.
  - Argument structs derive `clap::Args` and are kept minimal.
*/

pub mod check;
pub mod exec;
pub mod format;
pub mod list;
pub mod serve;
pub mod shared;

pub use check::{CheckArgs, execute_check};
pub use exec::{ExecArgs, execute_exec};
pub use list::{ListArgs, execute_list};
pub use serve::{ServeArgs, execute_serve};
