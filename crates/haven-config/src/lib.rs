//! Settings loading for the Haven Availability reconciler.
//!
//! TOML file + `HAVEN_`-prefixed environment variables, merged with
//! figment. The embedding process (the configuration-language runtime)
//! supplies per-resource desired state; what lives here is only the
//! connection-level configuration: which appliance to talk to, the
//! local credentials, and how to reach the virtualization inventory
//! that holds the pinned service certificates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration: one appliance connection per named profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// One appliance connection plus its inventory endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Management appliance address (IP or hostname).
    pub appliance: String,

    /// Local appliance user.
    #[serde(default = "default_local_user")]
    pub local_user: String,

    /// Local appliance password (plaintext -- prefer the env var).
    pub local_password: Option<String>,

    /// Virtualization inventory (vSphere) endpoint settings.
    #[serde(default)]
    pub inventory: Inventory,

    /// Poll ceiling for task and configuration waits, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_local_user() -> String {
    "admin".into()
}
fn default_timeout() -> u64 {
    300
}

/// Inventory endpoint used to read appliance extra-config metadata.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Inventory {
    pub server: Option<String>,
    pub username: Option<String>,
    /// Plaintext password (prefer `HAVEN_INVENTORY_PASSWORD`).
    pub password: Option<String>,
    /// Skip TLS verification toward the inventory endpoint.
    #[serde(default)]
    pub allow_unverified_ssl: bool,
    /// Managed object id of the datacenter holding the appliance VMs.
    pub datacenter_id: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "haven", "haven").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("haven");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full `Config` from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path (tests, alternate deployments).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HAVEN_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Look up a profile by name, falling back to the default profile.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");

        self.profiles
            .get(name)
            .map(|p| (name, p))
            .ok_or_else(|| ConfigError::Validation {
                field: "profile".into(),
                reason: format!("profile '{name}' is not defined"),
            })
    }
}

impl Profile {
    /// Validate the connection-level invariants.
    ///
    /// The local password must be non-empty -- the session protocol has
    /// no anonymous mode, and an empty password would only surface as a
    /// confusing authentication failure much later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.appliance.is_empty() {
            return Err(ConfigError::Validation {
                field: "appliance".into(),
                reason: "appliance address cannot be empty".into(),
            });
        }
        self.resolve_local_password().map(|_| ())
    }

    /// Resolve the local password: environment first, then the profile.
    pub fn resolve_local_password(&self) -> Result<SecretString, ConfigError> {
        if let Ok(password) = std::env::var("HAVEN_LOCAL_PASSWORD") {
            if !password.is_empty() {
                return Ok(SecretString::from(password));
            }
        }

        match self.local_password.as_deref() {
            Some(password) if !password.is_empty() => {
                Ok(SecretString::from(password.to_owned()))
            }
            _ => Err(ConfigError::Validation {
                field: "local_password".into(),
                reason: "local password cannot be empty".into(),
            }),
        }
    }
}

// ── Client construction ─────────────────────────────────────────────

/// Build an [`haven_api::ApplianceClient`] from a validated profile.
pub fn profile_to_client(profile: &Profile) -> Result<haven_api::ApplianceClient, ConfigError> {
    profile.validate()?;
    let password = profile.resolve_local_password()?;
    Ok(haven_api::ApplianceClient::new(
        profile.appliance.clone(),
        profile.local_user.clone(),
        password,
    ))
}

/// Build a [`haven_api::TaskPoller`] honoring the profile's ceiling.
pub fn profile_to_poller(profile: &Profile) -> haven_api::TaskPoller {
    haven_api::TaskPoller::with_timeout(std::time::Duration::from_secs(profile.timeout))
}
