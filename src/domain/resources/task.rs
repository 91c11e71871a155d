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

use crate::domain::deploy::mutator::{default_param_types, Mutator, Naming};
use crate::domain::deploy::{loader, owner, require_namespace, submit, DeployContext, Upsert};
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::{RemoteObject, Task};
use crate::shared::error::{Result, TmError};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use tracing::debug;

/// Tekton Task deployed from a manifest, or cloned from a template.
#[derive(Debug, Clone, Default)]
pub struct TaskDescriptor {
    /// Local path or URL of the Task manifest.
    pub file: String,
    /// Overrides the manifest name when set.
    pub name: String,
    pub namespace: String,
    pub generate_name: Option<String>,
    pub registry_secret: Option<String>,
    pub from_local_source: bool,
}

impl TaskDescriptor {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    fn naming(&self) -> Naming {
        match &self.generate_name {
            Some(prefix) if !prefix.is_empty() => Naming::Generate(prefix.clone()),
            _ if !self.name.is_empty() => Naming::Exact(self.name.clone()),
            _ => Naming::Keep,
        }
    }

    fn mutator(&self, naming: Naming) -> Mutator {
        Mutator::new(&self.namespace)
            .with_naming(naming)
            .with_registry_secret(self.registry_secret.clone())
            .with_local_source(self.from_local_source)
    }

    /// Applies the full mutation sequence to an already loaded Task.
    pub fn prepare(&self, mut task: Task) -> Task {
        default_param_types(&mut task);
        self.mutator(self.naming()).apply(&mut task);
        task
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<Task>> {
        let namespace = require_namespace(&self.namespace)?;
        let task: Task = loader::load(&self.file).await?;
        let task = self.prepare(task);
        submit(client, namespace, task, ctx).await
    }

    /// Submits a disposable copy of `template` named `<template>-<suffix>`.
    /// The template itself is never modified on the cluster.
    pub async fn clone_from<C: ClusterClient>(
        &self,
        client: &C,
        mut template: Task,
        ctx: &DeployContext,
    ) -> Result<Upsert<Task>> {
        let namespace = require_namespace(&self.namespace)?;
        let base = template.meta().name.clone().ok_or_else(|| {
            TmError::ValidationError("template Task has no name to clone from".to_string())
        })?;

        template.stamp_types();
        template.meta_mut().owner_references = None;
        default_param_types(&mut template);
        self.mutator(Naming::Generate(format!("{}-", base)))
            .apply(&mut template);
        debug!("cloning task \"{}/{}\"", namespace, base);

        submit(client, namespace, template, ctx).await
    }

    pub async fn set_owner<C: ClusterClient>(
        &self,
        client: &C,
        name: &str,
        owner_ref: OwnerReference,
    ) -> Result<Task> {
        let namespace = require_namespace(&self.namespace)?;
        let api = client.api::<Task>(namespace);
        owner::set_owner(api.as_ref(), name, owner_ref).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Container;

    fn template() -> Task {
        let mut task = Task::default();
        task.metadata.name = Some("builder".to_string());
        task.metadata.resource_version = Some("7".to_string());
        task.spec.steps.push(Container {
            name: "build".to_string(),
            image: Some("gcr.io/kaniko-project/executor".to_string()),
            ..Default::default()
        });
        task
    }

    #[test]
    fn test_prepare_prefers_generated_name() {
        let desc = TaskDescriptor {
            name: "foo".to_string(),
            namespace: "ci".to_string(),
            generate_name: Some("foo-".to_string()),
            ..Default::default()
        };
        let task = desc.prepare(template());
        assert_eq!(task.metadata.name, None);
        assert_eq!(task.metadata.generate_name.as_deref(), Some("foo-"));
        assert_eq!(task.metadata.namespace.as_deref(), Some("ci"));
    }

    #[test]
    fn test_prepare_keeps_manifest_name() {
        let desc = TaskDescriptor::new("ci");
        let task = desc.prepare(template());
        assert_eq!(task.metadata.name.as_deref(), Some("builder"));
    }

    #[tokio::test]
    async fn test_clone_dry_run_stamps_types_and_prefix() {
        struct NoCluster;
        impl ClusterClient for NoCluster {
            fn api<K: RemoteObject>(
                &self,
                _namespace: &str,
            ) -> Box<dyn crate::infrastructure::kubernetes::client::ObjectApi<K>> {
                unreachable!("dry run never reaches the cluster")
            }
        }

        let desc = TaskDescriptor {
            namespace: "ci".to_string(),
            registry_secret: Some("creds".to_string()),
            ..Default::default()
        };
        let out = desc
            .clone_from(&NoCluster, template(), &DeployContext::dry_run())
            .await
            .unwrap();

        assert!(out.is_dry_run());
        let clone = out.object();
        assert!(clone.check_types().is_ok());
        assert_eq!(clone.metadata.generate_name.as_deref(), Some("builder-"));
        assert_eq!(clone.metadata.resource_version, None);
        assert_eq!(clone.spec.volumes.len(), 1);
    }
}
