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

//! Function definition files (`serverless.yaml`) and batch unit discovery.

use crate::domain::config::settings::DeployConfig;
use crate::domain::deploy::batch::DeployUnit;
use crate::domain::resources::ServiceDescriptor;
use crate::infrastructure::kubernetes::objects::Manifest;
use crate::shared::error::{Result, TmError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Definition {
    pub service: String,
    pub description: Option<String>,
    pub provider: Provider,
    pub functions: BTreeMap<String, Function>,
}

/// Defaults shared by every function of a definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Provider {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub registry: Option<String>,
    pub registry_secret: Option<String>,
    pub runtime: Option<String>,
    #[serde(alias = "buildtimeout")]
    pub build_timeout: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub env_secrets: Vec<String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Function {
    pub source: String,
    pub revision: Option<String>,
    pub runtime: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "buildargs")]
    pub build_args: Vec<String>,
    pub labels: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub env_secrets: Vec<String>,
    pub annotations: BTreeMap<String, String>,
    pub concurrency: Option<i64>,
}

fn pick(own: &Option<String>, inherited: &Option<String>, fallback: &str) -> String {
    own.as_ref()
        .or(inherited.as_ref())
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

impl Definition {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let def: Self = serde_yaml::from_str(content)
            .map_err(|e| TmError::parse_error("function definition", e))?;
        if def.functions.is_empty() {
            return Err(TmError::ValidationError(
                "function definition declares no functions".to_string(),
            ));
        }
        Ok(def)
    }

    fn service_name(&self, function: &str) -> String {
        if self.service.is_empty() {
            function.to_string()
        } else {
            format!("{}-{}", self.service, function)
        }
    }

    /// One Service per function. Function values win over the provider,
    /// the provider wins over `conf`.
    pub fn services(&self, conf: &DeployConfig) -> Vec<ServiceDescriptor> {
        let p = &self.provider;
        self.functions
            .iter()
            .map(|(name, f)| {
                let mut environment = p.environment.clone();
                environment.extend(f.environment.clone());
                let mut annotations = p.annotations.clone();
                annotations.extend(f.annotations.clone());

                ServiceDescriptor {
                    name: self.service_name(name),
                    namespace: pick(&p.namespace, &None, &conf.namespace),
                    source: f.source.clone(),
                    revision: f.revision.clone().unwrap_or_default(),
                    runtime: pick(&f.runtime, &p.runtime, ""),
                    registry: pick(&p.registry, &None, &conf.registry),
                    registry_secret: p
                        .registry_secret
                        .clone()
                        .or_else(|| conf.registry_secret()),
                    build_timeout: p.build_timeout.clone(),
                    concurrency: f.concurrency,
                    build_args: f.build_args.clone(),
                    env: environment
                        .into_iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect(),
                    env_secrets: p
                        .env_secrets
                        .iter()
                        .chain(f.env_secrets.iter())
                        .cloned()
                        .collect(),
                    labels: f.labels.clone(),
                    annotations,
                    image_tag: None,
                }
            })
            .collect()
    }
}

/// A definition is recognised by its `functions` map; anything else must be
/// a stream of resource manifests.
pub fn parse_units(content: &str, conf: &DeployConfig) -> Result<Vec<DeployUnit>> {
    let header: serde_yaml::Value = serde_yaml::Deserializer::from_str(content)
        .next()
        .map(serde_yaml::Value::deserialize)
        .transpose()
        .map_err(|e| TmError::parse_error("deploy file", e))?
        .unwrap_or(serde_yaml::Value::Null);

    if header.get("functions").is_some() && header.get("apiVersion").is_none() {
        let def = Definition::from_yaml(content)?;
        return Ok(def
            .services(conf)
            .into_iter()
            .map(DeployUnit::Service)
            .collect());
    }

    Ok(Manifest::decode_all(content)?
        .into_iter()
        .map(DeployUnit::Manifest)
        .collect())
}
