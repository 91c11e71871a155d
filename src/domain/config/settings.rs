// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::deploy::{DeployContext, WaitOptions};
use crate::infrastructure::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_NAMESPACE, DEFAULT_WAIT_TIMEOUT_SECS,
};
use crate::shared::error::{Result, TmError};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::time::Duration;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "TM_CONFIG";

/// Per-invocation deploy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeployConfig {
    pub namespace: String,
    pub registry: String,
    pub registry_secret: Option<String>,
    pub concurrency: usize,
    pub dry_run: bool,
    pub wait: bool,
    /// Seconds, or a number suffixed with `s`, `m` or `h`.
    pub wait_timeout: String,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            registry: String::new(),
            registry_secret: None,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            wait: false,
            wait_timeout: format!("{}s", DEFAULT_WAIT_TIMEOUT_SECS),
            kubeconfig: None,
            context: None,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub namespace: Option<String>,
    pub registry: Option<String>,
    pub registry_secret: Option<String>,
    pub concurrency: Option<usize>,
    pub dry_run: bool,
    pub wait: bool,
    pub wait_timeout: Option<String>,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
}

impl DeployConfig {
    /// Load configuration from a TOML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            TmError::config_error(format!(
                "Failed to read config file {}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let conf: Self = toml::from_str(&content)?;
        Ok(conf)
    }

    /// `explicit` file > `TM_CONFIG` file > defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from(path);
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from(path),
            _ => Ok(Self::default()),
        }
    }

    /// Command line values win over whatever the file said.
    pub fn merge(mut self, cli: &ConfigOverrides) -> Self {
        if let Some(ns) = cli.namespace.as_ref().filter(|s| !s.is_empty()) {
            self.namespace = ns.clone();
        }
        if let Some(registry) = &cli.registry {
            self.registry = registry.clone();
        }
        if let Some(secret) = &cli.registry_secret {
            self.registry_secret = Some(secret.clone());
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        self.dry_run |= cli.dry_run;
        self.wait |= cli.wait;
        if let Some(timeout) = &cli.wait_timeout {
            self.wait_timeout = timeout.clone();
        }
        if cli.kubeconfig.is_some() {
            self.kubeconfig = cli.kubeconfig.clone();
        }
        if cli.context.is_some() {
            self.context = cli.context.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(TmError::config_error("namespace cannot be empty"));
        }
        if self.concurrency == 0 {
            return Err(TmError::config_error("concurrency must be at least 1"));
        }
        parse_duration(&self.wait_timeout)?;
        Ok(())
    }

    pub fn wait_timeout(&self) -> Result<Duration> {
        parse_duration(&self.wait_timeout)
    }

    pub fn registry_secret(&self) -> Option<String> {
        self.registry_secret.clone().filter(|s| !s.is_empty())
    }

    pub fn deploy_context(&self) -> Result<DeployContext> {
        let wait = if self.wait {
            Some(WaitOptions::with_timeout(self.wait_timeout()?))
        } else {
            None
        };
        Ok(DeployContext {
            dry_run: self.dry_run,
            wait,
        })
    }
}

/// Parses `90`, `90s`, `10m` or `1h`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => s.split_at(i),
        None => (s, "s"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| TmError::config_error(format!("Invalid duration: {:?}", s)))?;
    let secs = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        _ => {
            return Err(TmError::config_error(format!(
                "Invalid duration unit in {:?}, expected s, m or h",
                s
            )))
        }
    };
    Ok(Duration::from_secs(secs))
}
