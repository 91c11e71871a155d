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

use crate::domain::config::settings::{parse_duration, DeployConfig};
use crate::shared::error::{Result, TmError};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Splits `KEY=VALUE` on the first `=`. Values may contain further `=`.
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    let (key, value) = input.split_once('=').ok_or_else(|| {
        TmError::ValidationError(format!(
            "Invalid format: '{}'. Expected 'key=value'",
            input
        ))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(TmError::ValidationError(format!(
            "Empty key in: '{}'",
            input
        )));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Parses repeated `-D key=value` properties. Later keys win.
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>> {
    configs.iter().map(|c| parse_key_value(c)).collect()
}

/// `key1=val1,key2=val2`, silently skipping malformed pairs.
pub fn parse_key_value_pairs(input: &str) -> BTreeMap<String, String> {
    input
        .split(',')
        .filter_map(|pair| parse_key_value(pair).ok())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .map_err(|_| TmError::config_error(format!("{} expects true or false, got {:?}", key, value)))
}

/// Applies `-D` properties on top of an already resolved config.
pub fn apply_to_deploy_config(
    configs: &HashMap<String, String>,
    conf: &mut DeployConfig,
) -> Result<()> {
    for (key, value) in configs {
        match key.as_str() {
            "namespace" => conf.namespace = value.clone(),
            "registry" => conf.registry = value.clone(),
            "registry-secret" => conf.registry_secret = Some(value.clone()),
            "concurrency" => {
                conf.concurrency = value.parse().map_err(|_| {
                    TmError::config_error(format!("concurrency expects a number, got {:?}", value))
                })?
            }
            "dry-run" => conf.dry_run = parse_bool(key, value)?,
            "wait" => conf.wait = parse_bool(key, value)?,
            "wait-timeout" => {
                parse_duration(value)?;
                conf.wait_timeout = value.clone();
            }
            "kubeconfig" => conf.kubeconfig = Some(value.clone()),
            "context" => conf.context = Some(value.clone()),
            other => warn!("ignoring unknown property {:?}", other),
        }
    }
    Ok(())
}
