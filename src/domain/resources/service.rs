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

//! Knative Service deployment, optionally built from sources first.

use crate::domain::config::dynamic::parse_key_value;
use crate::domain::deploy::mutator::{display_name, Mutator, Naming};
use crate::domain::deploy::wait::wait_for_condition;
use crate::domain::deploy::{owner, require_namespace, submit, DeployContext, Upsert};
use crate::domain::resources::build::BuildDescriptor;
use crate::domain::resources::buildtemplate::BuildTemplateDescriptor;
use crate::infrastructure::constants::{
    CONDITION_READY, CONDITION_SUCCEEDED, DEFAULT_IMAGE_TAG, IMAGE_ARGUMENT, LABEL_MANAGED_BY,
    LABEL_MANAGED_BY_VALUE,
};
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::serving::{
    RevisionSpec, RevisionTemplateSpec, ServiceSpec,
};
use crate::infrastructure::kubernetes::objects::{Build, BuildTemplate, RemoteObject, Service};
use crate::infrastructure::source::{self, SourceLocation};
use crate::shared::error::{Result, TmError};
use k8s_openapi::api::core::v1::{Container, EnvFromSource, EnvVar, SecretEnvSource};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ServiceDescriptor {
    pub name: String,
    pub namespace: String,
    /// Local directory, git repository or container image.
    pub source: String,
    pub revision: String,
    /// Existing BuildTemplate name, or local path / URL of its manifest.
    pub runtime: String,
    pub registry: String,
    pub registry_secret: Option<String>,
    pub build_timeout: Option<String>,
    /// Concurrent requests per container, `0` for unlimited.
    pub concurrency: Option<i64>,
    pub build_args: Vec<String>,
    /// `KEY=VALUE` container environment.
    pub env: Vec<String>,
    /// Secrets whose keys populate the container environment.
    pub env_secrets: Vec<String>,
    /// `KEY=VALUE` service labels.
    pub labels: Vec<String>,
    /// Revision template annotations.
    pub annotations: BTreeMap<String, String>,
    pub image_tag: Option<String>,
}

/// Everything a service deployment submitted or rendered.
#[derive(Debug, Clone)]
pub struct ServiceDeployment {
    pub template: Option<Upsert<BuildTemplate>>,
    pub build: Option<Upsert<Build>>,
    pub service: Upsert<Service>,
}

impl ServiceDeployment {
    pub fn url(&self) -> Option<&str> {
        self.service.object().url()
    }
}

impl ServiceDescriptor {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TmError::ValidationError("Service name is required".to_string()));
        }
        require_namespace(&self.namespace)?;
        if self.source.is_empty() {
            return Err(TmError::ValidationError(format!(
                "Service {} has no source to deploy",
                self.name
            )));
        }
        Ok(())
    }

    fn runtime_is_manifest(&self) -> bool {
        source::is_local(&self.runtime)
            || self.runtime.starts_with("http://")
            || self.runtime.starts_with("https://")
    }

    /// Image the build pushes and the service runs.
    pub fn result_image(&self) -> Result<String> {
        if self.registry.is_empty() {
            return Err(TmError::config_error(format!(
                "Service {} is built from sources and needs a registry",
                self.name
            )));
        }
        let tag = self
            .image_tag
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_IMAGE_TAG);
        Ok(format!(
            "{}/{}/{}:{}",
            self.registry.trim_end_matches('/'),
            self.namespace,
            self.name,
            tag
        ))
    }

    pub fn build_descriptor(&self, template: &str) -> Result<BuildDescriptor> {
        let mut args = self.build_args.clone();
        args.push(format!("{}={}", IMAGE_ARGUMENT, self.result_image()?));
        Ok(BuildDescriptor {
            generate_name: Some(format!("{}-", self.name)),
            namespace: self.namespace.clone(),
            source: self.source.clone(),
            revision: self.revision.clone(),
            template: template.to_string(),
            args,
            timeout: self.build_timeout.clone(),
            registry_secret: self.registry_secret.clone(),
            ..Default::default()
        })
    }

    /// The Service object running `image`.
    pub fn service_object(&self, image: &str) -> Result<Service> {
        let env = self
            .env
            .iter()
            .map(|e| {
                parse_key_value(e).map(|(name, value)| EnvVar {
                    name,
                    value: Some(value),
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let env_from = self
            .env_secrets
            .iter()
            .map(|s| EnvFromSource {
                secret_ref: Some(SecretEnvSource {
                    name: s.clone(),
                    optional: None,
                }),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        let mut labels = self
            .labels
            .iter()
            .map(|l| parse_key_value(l))
            .collect::<Result<BTreeMap<_, _>>>()?;
        labels.insert(
            LABEL_MANAGED_BY.to_string(),
            LABEL_MANAGED_BY_VALUE.to_string(),
        );

        let container = Container {
            image: Some(image.to_string()),
            env: (!env.is_empty()).then_some(env),
            env_from: (!env_from.is_empty()).then_some(env_from),
            ..Default::default()
        };

        let mut service = Service {
            metadata: ObjectMeta {
                labels: Some(labels),
                ..Default::default()
            },
            spec: ServiceSpec {
                template: Some(RevisionTemplateSpec {
                    metadata: ObjectMeta {
                        annotations: (!self.annotations.is_empty())
                            .then(|| self.annotations.clone()),
                        ..Default::default()
                    },
                    spec: RevisionSpec {
                        container_concurrency: self.concurrency,
                        containers: vec![container],
                        timeout_seconds: None,
                    },
                }),
            },
            ..Default::default()
        };
        service.stamp_types();
        Mutator::new(&self.namespace)
            .with_naming(Naming::Exact(self.name.clone()))
            .apply_identity(&mut service);
        Ok(service)
    }

    /// Template name for the build, deploying the runtime manifest first
    /// when the runtime is not the name of an installed template.
    async fn resolve_template<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<(String, Option<Upsert<BuildTemplate>>)> {
        if !self.runtime_is_manifest() {
            return Ok((self.runtime.clone(), None));
        }

        debug!("installing runtime {:?} for service {}", self.runtime, self.name);
        let template = BuildTemplateDescriptor {
            file: self.runtime.clone(),
            name: None,
            namespace: self.namespace.clone(),
            registry_secret: self.registry_secret.clone(),
        }
        .deploy(client, ctx)
        .await?;
        let name = display_name(template.object());
        Ok((name, Some(template)))
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<ServiceDeployment> {
        self.validate()?;
        let namespace = self.namespace.as_str();
        let location = SourceLocation::classify(&self.source);

        let (image, template, build) = if self.runtime.is_empty() {
            match location {
                SourceLocation::Image(image) => (image, None, None),
                _ => {
                    return Err(TmError::ValidationError(format!(
                        "Service {} is deployed from sources and needs a runtime",
                        self.name
                    )));
                }
            }
        } else {
            let (template_name, template) = self.resolve_template(client, ctx).await?;
            let build = self
                .build_descriptor(&template_name)?
                .deploy(client, ctx)
                .await?;

            if let Some(opts) = ctx.wait_options() {
                let api = client.api::<Build>(namespace);
                wait_for_condition(
                    api.as_ref(),
                    &display_name(build.object()),
                    CONDITION_SUCCEEDED,
                    opts,
                )
                .await?;
            }
            (self.result_image()?, template, Some(build))
        };

        let service = submit(client, namespace, self.service_object(&image)?, ctx).await?;

        if let Some(build) = build.as_ref().filter(|b| !b.is_dry_run()) {
            let owner_ref = owner::owner_reference(service.object())?;
            let api = client.api::<Build>(namespace);
            owner::set_owner(api.as_ref(), &display_name(build.object()), owner_ref).await?;
        }

        let service = match ctx.wait_options() {
            Some(opts) => {
                let api = client.api::<Service>(namespace);
                let ready =
                    wait_for_condition(api.as_ref(), &self.name, CONDITION_READY, opts).await?;
                if let Some(url) = ready.url() {
                    info!("service {} is ready at {}", self.name, url);
                }
                service.map(|_| ready)
            }
            None => service,
        };

        Ok(ServiceDeployment {
            template,
            build,
            service,
        })
    }
}
