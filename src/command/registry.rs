/*!
Command registry: name lookup, dispatch, and the startup self-check.

Built once from a `ServiceLocator`; read-only afterwards and shared behind an
`Arc` by every concurrent invocation.

Self-check findings:
  - declared commands with no implementation
  - result types missing from their area manifest
  - command names registered twice
  - options declared twice within one command
*/

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use crate::areas::Area;
use crate::command::context::CommandContext;
use crate::command::error::CommandError;
use crate::command::locator::ServiceLocator;
use crate::command::manifest::{AreaManifest, ManifestError};
use crate::command::options::{OptionDef, RawArgs};
use crate::command::response::CommandResponse;
use crate::command::{Command, DynCommand};

/// MCP-facing name of a command: words joined by `-`.
pub fn tool_name(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join("-")
}

/* ---- Builder ---- */

pub struct RegistryBuilder {
    locator: Arc<ServiceLocator>,
    commands: BTreeMap<&'static str, Arc<dyn DynCommand>>,
    manifests: BTreeMap<Area, AreaManifest>,
    declared: BTreeMap<&'static str, Area>,
    duplicates: Vec<String>,
}

impl RegistryBuilder {
    pub fn locator(&self) -> &ServiceLocator {
        &self.locator
    }

    /// Register an area's manifest and its full command catalogue.
    pub fn area(
        &mut self,
        area: Area,
        manifest: AreaManifest,
        declared: &[&'static str],
    ) -> &mut Self {
        self.manifests.insert(area, manifest);
        for name in declared {
            self.declared.insert(*name, area);
        }
        self
    }

    pub fn command<C: Command>(&mut self, command: C) -> &mut Self {
        if self.commands.contains_key(C::NAME) {
            self.duplicates.push(C::NAME.to_string());
        } else {
            self.commands.insert(C::NAME, Arc::new(command));
        }
        self
    }

    pub fn build(self) -> CommandRegistry {
        let tool_index = self
            .commands
            .keys()
            .map(|name| (tool_name(name), *name))
            .collect();
        CommandRegistry {
            locator: self.locator,
            commands: self.commands,
            tool_index,
            manifests: self.manifests,
            declared: self.declared,
            duplicates: self.duplicates,
        }
    }
}

/* ---- Registry ---- */

pub struct CommandRegistry {
    locator: Arc<ServiceLocator>,
    commands: BTreeMap<&'static str, Arc<dyn DynCommand>>,
    tool_index: BTreeMap<String, &'static str>,
    manifests: BTreeMap<Area, AreaManifest>,
    declared: BTreeMap<&'static str, Area>,
    duplicates: Vec<String>,
}

impl CommandRegistry {
    pub fn builder(locator: Arc<ServiceLocator>) -> RegistryBuilder {
        RegistryBuilder {
            locator,
            commands: BTreeMap::new(),
            manifests: BTreeMap::new(),
            declared: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Fresh context for one invocation.
    pub fn new_context(&self) -> CommandContext {
        CommandContext::new(self.locator.clone())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn DynCommand>> {
        self.commands.values()
    }

    /// Look up by command name (`monitor log query`) or tool name (`monitor-log-query`).
    pub fn find(&self, name: &str) -> Option<&Arc<dyn DynCommand>> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.commands.get(normalized.as_str()).or_else(|| {
            self.tool_index
                .get(name.trim())
                .and_then(|n| self.commands.get(n))
        })
    }

    fn is_declared(&self, name: &str) -> bool {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.declared.contains_key(normalized.as_str())
            || self
                .declared
                .keys()
                .any(|d| tool_name(d) == name.trim())
    }

    /// Run one command and return its envelope.
    pub async fn dispatch(
        &self,
        name: &str,
        raw: &RawArgs,
        mut ctx: CommandContext,
    ) -> CommandResponse {
        let Some(command) = self.find(name) else {
            let err = if self.is_declared(name) {
                CommandError::Unimplemented(name.trim().to_string())
            } else {
                CommandError::UnknownCommand(name.trim().to_string())
            };
            tracing::warn!(command = name, "dispatch rejected: {err}");
            ctx.response.set_error(&err);
            return ctx.into_response();
        };

        let Some(manifest) = self.manifests.get(&command.area()) else {
            let err = CommandError::Manifest(ManifestError::Unregistered {
                area: command.area().as_str(),
                type_name: command.result_type(),
            });
            tracing::error!(command = command.name(), "{err}");
            ctx.response.set_error(&err);
            return ctx.into_response();
        };

        let client = ctx
            .host()
            .and_then(|h| h.client.clone())
            .unwrap_or_default();
        let span = tracing::info_span!(
            "command",
            name = command.name(),
            area = %command.area(),
            client = %client,
            status = tracing::field::Empty,
        );
        ctx.set_activity(span.clone());

        let started = Instant::now();
        command
            .run(&mut ctx, raw, manifest)
            .instrument(span)
            .await;
        if let Some(activity) = ctx.activity() {
            activity.record("status", ctx.response.status);
            activity.in_scope(|| {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "command finished"
                )
            });
        }

        ctx.into_response()
    }

    pub fn self_check(&self) -> SelfCheckReport {
        let mut report = SelfCheckReport {
            commands: self.commands.len(),
            duplicate_commands: self.duplicates.clone(),
            ..Default::default()
        };

        for (name, area) in &self.declared {
            if !self.commands.contains_key(name) {
                report.unimplemented.push(UnimplementedCommand {
                    command: name.to_string(),
                    area: area.as_str(),
                });
            }
        }

        for command in self.commands.values() {
            let registered = self
                .manifests
                .get(&command.area())
                .is_some_and(|m| m.contains(command.result_type()));
            if !registered {
                report.unregistered_results.push(UnregisteredResult {
                    command: command.name().to_string(),
                    area: command.area().as_str(),
                    result_type: command.result_type(),
                });
            }

            let mut seen = BTreeSet::new();
            for def in command.options() {
                if !seen.insert(def.name) {
                    report
                        .duplicate_options
                        .push(format!("{}: --{}", command.name(), def.name));
                }
            }
        }

        report
    }

    /// MCP tool descriptors for every registered command.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.commands
            .values()
            .map(|c| ToolDefinition {
                name: tool_name(c.name()),
                command: c.name(),
                description: c.description(),
                read_only: c.read_only(),
                input_schema: input_schema(&c.options()),
            })
            .collect()
    }
}

/// JSON schema object describing a command's options.
pub fn input_schema(defs: &[OptionDef]) -> serde_json::Map<String, serde_json::Value> {
    let mut properties = serde_json::Map::new();
    for def in defs {
        let mut prop = def.kind.json_schema();
        if let Some(obj) = prop.as_object_mut() {
            obj.insert("description".into(), def.description.into());
        }
        properties.insert(def.name.to_string(), prop);
    }
    let required: Vec<&str> = defs.iter().filter(|d| d.required).map(|d| d.name).collect();

    let mut schema = serde_json::Map::new();
    schema.insert("type".into(), "object".into());
    schema.insert("properties".into(), properties.into());
    schema.insert("required".into(), serde_json::json!(required));
    schema
}

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub command: &'static str,
    pub description: &'static str,
    pub read_only: bool,
    pub input_schema: serde_json::Map<String, serde_json::Value>,
}

/* ---- Self-check report ---- */

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfCheckReport {
    pub commands: usize,
    pub unimplemented: Vec<UnimplementedCommand>,
    pub unregistered_results: Vec<UnregisteredResult>,
    pub duplicate_commands: Vec<String>,
    pub duplicate_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnimplementedCommand {
    pub command: String,
    pub area: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisteredResult {
    pub command: String,
    pub area: &'static str,
    pub result_type: &'static str,
}

impl SelfCheckReport {
    pub fn is_clean(&self) -> bool {
        self.unimplemented.is_empty()
            && self.unregistered_results.is_empty()
            && self.duplicate_commands.is_empty()
            && self.duplicate_options.is_empty()
    }
}

impl fmt::Display for SelfCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "{} commands registered, no issues", self.commands);
        }
        for u in &self.unimplemented {
            writeln!(f, "unimplemented: {} (area {})", u.command, u.area)?;
        }
        for u in &self.unregistered_results {
            writeln!(
                f,
                "unregistered result: {} returns {} (missing from {} manifest)",
                u.command, u.result_type, u.area
            )?;
        }
        for d in &self.duplicate_commands {
            writeln!(f, "duplicate command: {d}")?;
        }
        for d in &self.duplicate_options {
            writeln!(f, "duplicate option: {d}")?;
        }
        Ok(())
    }
}
