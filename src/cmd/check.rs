/*!
`check.rs`

Implements `azmcp check`: print the registry self-check report.

The report lists declared commands without an implementation, commands whose
result type is missing from their area manifest, duplicate command names and
options declared twice. Exit status is non-zero unless the report is clean.
*/

use anyhow::{Result, bail};
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::command::{CommandRegistry, SelfCheckReport};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_check(registry: &CommandRegistry, args: CheckArgs) -> Result<()> {
    let report = registry.self_check();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }

    if !report.is_clean() {
        bail!("self-check found {} issue(s)", issue_rows(&report).len());
    }
    Ok(())
}

fn print_human(report: &SelfCheckReport) {
    let style = StyleOptions::detect();
    let (tag, role) = if report.is_clean() {
        ("success", Role::Success)
    } else {
        ("error", Role::Error)
    };
    println!(
        "{}",
        box_header(
            format!("{} Self-check", emoji("check", &style)),
            Some(color(role, format!("{} {report}", emoji(tag, &style)), &style)),
            &style,
        )
    );

    let rows = issue_rows(report);
    if !rows.is_empty() {
        println!(
            "{}",
            table(&["ISSUE", "COMMAND", "DETAIL"], &rows, TableOpts::default(), &style)
        );
    }
}

fn issue_rows(report: &SelfCheckReport) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for u in &report.unimplemented {
        rows.push(vec![
            "unimplemented".into(),
            u.command.clone(),
            format!("declared in area {}", u.area),
        ]);
    }
    for u in &report.unregistered_results {
        rows.push(vec![
            "unregistered result".into(),
            u.command.clone(),
            format!("{} missing from {} manifest", u.result_type, u.area),
        ]);
    }
    for d in &report.duplicate_commands {
        rows.push(vec!["duplicate command".into(), d.clone(), String::new()]);
    }
    for d in &report.duplicate_options {
        rows.push(vec!["duplicate option".into(), d.clone(), String::new()]);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::registry::{UnimplementedCommand, UnregisteredResult};

    #[test]
    fn rows_cover_every_issue_kind() {
        let report = SelfCheckReport {
            commands: 2,
            unimplemented: vec![UnimplementedCommand {
                command: "monitor log query".into(),
                area: "monitor",
            }],
            unregistered_results: vec![UnregisteredResult {
                command: "monitor metrics query".into(),
                area: "monitor",
                result_type: "MetricsQueryCommandResult",
            }],
            duplicate_commands: vec!["monitor workspace list".into()],
            duplicate_options: vec!["monitor workspace list: --tenant".into()],
        };
        let rows = issue_rows(&report);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], "unimplemented");
        assert_eq!(
            rows[1][2],
            "MetricsQueryCommandResult missing from monitor manifest"
        );
    }

    #[test]
    fn clean_report_has_no_rows() {
        assert!(issue_rows(&SelfCheckReport::default()).is_empty());
    }
}
