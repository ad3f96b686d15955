//! ---
//! dt_section: "01-core-functionality"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Shared configuration and bootstrap utilities."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Role tokens from least to most senior.
const ROLE_SENIORITY: [&str; 3] = ["developer", "tester", "manager"];

fn default_role_levels() -> IndexMap<String, u32> {
    IndexMap::from([
        ("developer".to_owned(), 10),
        ("tester".to_owned(), 20),
        ("manager".to_owned(), 30),
    ])
}

fn developer() -> String {
    "developer".to_owned()
}

fn tester() -> String {
    "tester".to_owned()
}

fn manager() -> String {
    "manager".to_owned()
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("target/audit/defects.log")
}

/// Primary configuration object for the defect tracker tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "DT_CONFIG";

    /// Load configuration from disk, respecting the `DT_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let loaded = Self::load_or_default(candidates)?;
        if loaded.source.is_none() {
            return Err(anyhow!(
                "no configuration files found. inspected: {}",
                candidates
                    .iter()
                    .map(|p| p.as_ref().display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        Ok(loaded.config)
    }

    /// Load the first configuration file that exists, falling back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_file(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_file(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(LoadedAppConfig {
            config: Self::default(),
            source: None,
        })
    }

    /// Load and validate one specific file, ignoring `DT_CONFIG`.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.access.validate()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Role privilege levels and per-operation role requirements.
///
/// Role tokens are kept as strings here; `dt-security` turns them into typed
/// roles and rejects anything that does not form a strict hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "default_role_levels")]
    pub levels: IndexMap<String, u32>,
    #[serde(default)]
    pub requirements: RequirementConfig,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            levels: default_role_levels(),
            requirements: RequirementConfig::default(),
        }
    }
}

impl AccessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(anyhow!("access.levels must declare at least one role"));
        }
        let mut seen = HashSet::new();
        for (role, level) in &self.levels {
            if !seen.insert(*level) {
                return Err(anyhow!(
                    "access.levels: role '{}' shares privilege level {} with another role",
                    role,
                    level
                ));
            }
        }
        for role in self.levels.keys() {
            if !ROLE_SENIORITY.contains(&role.as_str()) {
                return Err(anyhow!(
                    "access.levels: unknown role '{}' (expected one of: {})",
                    role,
                    ROLE_SENIORITY.join(", ")
                ));
            }
        }
        let mut junior: Option<(&str, u32)> = None;
        for role in ROLE_SENIORITY {
            let level = *self
                .levels
                .get(role)
                .ok_or_else(|| anyhow!("access.levels: no privilege level for role '{}'", role))?;
            if let Some((junior_role, junior_level)) = junior {
                if level <= junior_level {
                    return Err(anyhow!(
                        "access.levels: role '{}' must have a higher level than '{}'",
                        role,
                        junior_role
                    ));
                }
            }
            junior = Some((role, level));
        }
        for (operation, role) in self.requirements.entries() {
            if !self.levels.contains_key(role) {
                return Err(anyhow!(
                    "access.requirements.{} references undeclared role '{}'",
                    operation,
                    role
                ));
            }
        }
        Ok(())
    }
}

/// Minimum role token required for each tracker operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementConfig {
    #[serde(default = "developer")]
    pub view_defects: String,
    #[serde(default = "developer")]
    pub comment_on_defect: String,
    #[serde(default = "developer")]
    pub update_defect: String,
    #[serde(default = "tester")]
    pub create_defect: String,
    #[serde(default = "manager")]
    pub delete_defect: String,
    #[serde(default = "manager")]
    pub manage_actors: String,
}

impl Default for RequirementConfig {
    fn default() -> Self {
        Self {
            view_defects: developer(),
            comment_on_defect: developer(),
            update_defect: developer(),
            create_defect: tester(),
            delete_defect: manager(),
            manage_actors: manager(),
        }
    }
}

impl RequirementConfig {
    /// Operation key and role token pairs, in declaration order.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("view_defects", self.view_defects.as_str()),
            ("comment_on_defect", self.comment_on_defect.as_str()),
            ("update_defect", self.update_defect.as_str()),
            ("create_defect", self.create_defect.as_str()),
            ("delete_defect", self.delete_defect.as_str()),
            ("manage_actors", self.manage_actors.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_audit_path(),
        }
    }
}
