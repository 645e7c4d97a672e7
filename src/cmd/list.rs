/*!
`list.rs`

Implements `azmcp list`: every registered command with its tool name and
options, optionally narrowed to one area.

JSON Output Shape:
{
  "status": "ok",
  "area": "monitor" | null,
  "count": 3,
  "commands": [
    {
      "name": "monitor log query",
      "tool": "monitor-log-query",
      "area": "monitor",
      "readOnly": true,
      "description": "...",
      "resultType": "LogQueryCommandResult",
      "options": [ { "name": "subscription", "required": true, "type": "string" } ]
    }
  ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::areas::Area;
use crate::cmd::format::{
    Role, StyleOptions, TableOpts, box_header, color, emoji, table, truncate_ellipsis,
};
use crate::command::registry::tool_name;
use crate::command::{CommandRegistry, DynCommand, OptionDef};

/// CLI arguments for `azmcp list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list commands of this area
    #[arg(long, value_enum, ignore_case = true)]
    pub area: Option<Area>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(registry: &CommandRegistry, args: ListArgs) -> Result<()> {
    let selected: Vec<_> = registry
        .commands()
        .filter(|c| args.area.is_none_or(|a| c.area() == a))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&list_json(args.area, &selected))?);
        return Ok(());
    }

    let style = StyleOptions::detect();
    let subtitle = match args.area {
        Some(a) => format!("area={a}"),
        None => "all areas".to_string(),
    };
    println!(
        "{}",
        box_header(
            format!("{} Commands ({})", emoji("list", &style), selected.len()),
            Some(subtitle),
            &style,
        )
    );

    if selected.is_empty() {
        println!(
            "{}",
            color(Role::Dim, format!("{} (none)", emoji("info", &style)), &style)
        );
        return Ok(());
    }

    let rows: Vec<Vec<String>> = selected
        .iter()
        .map(|c| {
            vec![
                c.name().to_string(),
                option_summary(&c.options()),
                truncate_ellipsis(c.description(), 90),
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &["COMMAND", "OPTIONS", "DESCRIPTION"],
            &rows,
            TableOpts::default(),
            &style
        )
    );
    println!(
        "\n{} {}",
        emoji("info", &style),
        color(
            Role::Dim,
            "Required options are marked with *. Run `azmcp exec <command> --param KEY=VALUE`.",
            &style
        )
    );
    Ok(())
}

fn list_json(area: Option<Area>, commands: &[&std::sync::Arc<dyn DynCommand>]) -> Value {
    let items: Vec<Value> = commands
        .iter()
        .map(|c| {
            let options: Vec<Value> = c
                .options()
                .iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "required": d.required,
                        "type": d.kind.expected(),
                        "description": d.description,
                    })
                })
                .collect();
            json!({
                "name": c.name(),
                "tool": tool_name(c.name()),
                "area": c.area().as_str(),
                "readOnly": c.read_only(),
                "description": c.description(),
                "resultType": c.result_type(),
                "options": options,
            })
        })
        .collect();
    json!({
        "status": "ok",
        "area": area.map(|a| a.as_str()),
        "count": items.len(),
        "commands": items,
    })
}

/// `subscription*, tenant, workspace*` style summary.
fn option_summary(defs: &[OptionDef]) -> String {
    if defs.is_empty() {
        return "-".to_string();
    }
    defs.iter()
        .map(|d| {
            if d.required {
                format!("{}*", d.name)
            } else {
                d.name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

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
        List(ListArgs),
    }

    #[test]
    fn clap_parses_area_filter() {
        let cli = TestCli::try_parse_from(["t", "list", "--area", "ServiceBus", "--json"]).unwrap();
        let TestSub::List(a) = cli.cmd;
        assert_eq!(a.area, Some(Area::ServiceBus));
        assert!(a.json);
        assert!(TestCli::try_parse_from(["t", "list", "--area", "storage"]).is_err());
    }

    #[test]
    fn json_listing_for_one_area() {
        let registry = build_registry(&RuntimeConfig::resolve(None, Some(1)).unwrap()).unwrap();
        let selected: Vec<_> = registry
            .commands()
            .filter(|c| c.area() == Area::Monitor)
            .collect();
        let v = list_json(Some(Area::Monitor), &selected);
        assert_eq!(v["count"], json!(3));
        let names: Vec<_> = v["commands"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["tool"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["monitor-log-query", "monitor-metrics-query", "monitor-workspace-list"]
        );
    }

    #[test]
    fn required_options_are_starred() {
        let defs = [
            OptionDef::required("subscription", crate::command::OptionKind::String, "s"),
            OptionDef::optional("tenant", crate::command::OptionKind::String, "t"),
        ];
        assert_eq!(option_summary(&defs), "subscription*, tenant");
        assert_eq!(option_summary(&[]), "-");
    }
}
