/*!
shared.rs - helpers used by more than one subcommand.

Focus:
  - RuntimeConfig: global flags merged with env fallbacks
  - build_registry / ensure_clean: wiring + startup self-check
  - collect_params: --param KEY=VALUE and --param-file into one raw argument map
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, error};

use crate::areas::register_all;
use crate::command::{CommandRegistry, RawArgs};
use crate::services::build_locator;
use crate::utils::env_nonempty;

pub const FIXTURES_ENV: &str = "AZMCP_FIXTURES";
pub const TIMEOUT_ENV: &str = "AZMCP_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/* ---- Runtime configuration ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub fixtures: Option<PathBuf>,
    /// `None` disables the per-invocation deadline.
    pub timeout: Option<Duration>,
}

impl RuntimeConfig {
    /// CLI flags first, then `AZMCP_FIXTURES` / `AZMCP_TIMEOUT_SECS`, then defaults.
    pub fn resolve(fixtures: Option<PathBuf>, timeout_secs: Option<u64>) -> Result<Self> {
        let fixtures = fixtures.or_else(|| env_nonempty(FIXTURES_ENV).map(PathBuf::from));
        let secs = match timeout_secs {
            Some(s) => s,
            None => match env_nonempty(TIMEOUT_ENV) {
                Some(raw) => raw.parse::<u64>().with_context(|| {
                    format!("{TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'")
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        Ok(Self {
            fixtures,
            timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        })
    }
}

/* ---- Registry wiring ---- */

pub fn build_registry(config: &RuntimeConfig) -> Result<Arc<CommandRegistry>> {
    let locator = build_locator(config.fixtures.as_deref())?;
    let mut builder = CommandRegistry::builder(Arc::new(locator));
    register_all(&mut builder).context("failed to wire command areas")?;
    let registry = builder.build();
    debug!(commands = registry.len(), "command registry built");
    Ok(Arc::new(registry))
}

/// Refuse to run when the catalogue is incomplete or a result type is unregistered.
pub fn ensure_clean(registry: &CommandRegistry) -> Result<()> {
    let report = registry.self_check();
    if !report.is_clean() {
        error!("startup self-check failed:\n{report}");
        bail!("startup self-check failed; run `azmcp check` for details");
    }
    Ok(())
}

/* ---- Parameters ---- */

/// Merge `--param` pairs and an optional param file. CLI pairs override file entries.
pub fn collect_params(params: &[String], param_file: Option<&Path>) -> Result<RawArgs> {
    let mut provided = RawArgs::new();
    for kv in params {
        let (k, v) = kv
            .split_once('=')
            .with_context(|| format!("invalid --param (expected KEY=VALUE): {kv}"))?;
        let key = k.trim().trim_start_matches("--");
        if key.is_empty() {
            bail!("invalid --param (empty key): {kv}");
        }
        provided.insert(key.to_string(), Value::String(v.trim().to_string()));
    }
    if let Some(path) = param_file {
        load_param_file_into_map(path, &mut provided)?;
    }
    Ok(provided)
}

/// Values keep their JSON shape (arrays stay arrays); option validation coerces them.
pub fn load_param_file_into_map(path: &Path, provided: &mut RawArgs) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {}", path.display()))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();

    let value: Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML param file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON param file")?
    };

    let obj = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("param file root must be an object"))?;

    for (k, v) in obj {
        let key = k.trim_start_matches("--");
        if provided.contains_key(key) {
            continue; // CLI overrides file
        }
        provided.insert(key.to_string(), v.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_timeout_zero_disables_deadline() {
        let cfg = RuntimeConfig::resolve(None, Some(0)).unwrap();
        assert_eq!(cfg.timeout, None);
        let cfg = RuntimeConfig::resolve(Some("f.yaml".into()), Some(30)).unwrap();
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.fixtures, Some(PathBuf::from("f.yaml")));
    }

    #[test]
    fn params_strip_dashes_and_keep_strings() {
        let args = collect_params(
            &["--data-sets=requests,exceptions".into(), "app-id = abc".into()],
            None,
        )
        .unwrap();
        assert_eq!(args["data-sets"], json!("requests,exceptions"));
        assert_eq!(args["app-id"], json!("abc"));
    }

    #[test]
    fn malformed_param_is_rejected() {
        let err = collect_params(&["novalue".into()], None).unwrap_err();
        assert!(err.to_string().contains("expected KEY=VALUE"));
        let err = collect_params(&["=x".into()], None).unwrap_err();
        assert!(err.to_string().contains("empty key"));
    }

    #[test]
    fn param_file_json_merge() {
        let path = std::env::temp_dir().join("azmcp_param_test.json");
        std::fs::write(&path, r#"{ "metric-names": ["cpu", "mem"], "workspace": "file" }"#)
            .unwrap();
        let args = collect_params(&["workspace=cli".into()], Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(args["workspace"], json!("cli"));
        assert_eq!(args["metric-names"], json!(["cpu", "mem"]));
    }

    #[test]
    fn param_file_yaml() {
        let path = std::env::temp_dir().join("azmcp_param_test.yaml");
        std::fs::write(&path, "subscription: sub-1\nhours: 6\n").unwrap();
        let mut args = RawArgs::new();
        load_param_file_into_map(&path, &mut args).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(args["hours"], json!(6));
    }

    #[test]
    fn registry_without_fixtures_is_clean() {
        let cfg = RuntimeConfig::resolve(None, Some(5)).unwrap();
        let registry = build_registry(&cfg).unwrap();
        assert_eq!(registry.len(), 9);
        ensure_clean(&registry).unwrap();
    }
}
