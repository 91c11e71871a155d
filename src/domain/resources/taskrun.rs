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

use crate::domain::config::dynamic::parse_key_value;
use crate::domain::deploy::mutator::{Mutator, Naming};
use crate::domain::deploy::{require_namespace, submit, DeployContext, Upsert};
use crate::infrastructure::constants::SOURCES_INPUT;
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::tekton::{
    Param, PipelineResourceRef, TaskRef, TaskResourceBinding, TaskRunInputs, TaskRunSpec,
};
use crate::infrastructure::kubernetes::objects::{RemoteObject, TaskRun};
use crate::shared::error::{Result, TmError};

#[derive(Debug, Clone, Default)]
pub struct TaskRunDescriptor {
    /// Empty means a generated name, see `generate_name`.
    pub name: String,
    /// Prefix for a generated name. Defaults to `<task>-`.
    pub generate_name: Option<String>,
    pub namespace: String,
    pub task: String,
    /// Bound as the `sources` input when set.
    pub pipeline_resource: Option<String>,
    /// `KEY=VALUE` task parameters.
    pub params: Vec<String>,
    pub service_account: Option<String>,
    pub timeout: Option<String>,
}

impl TaskRunDescriptor {
    pub fn build(&self) -> Result<TaskRun> {
        if self.task.is_empty() {
            return Err(TmError::ValidationError(
                "TaskRun needs the name of the task to run".to_string(),
            ));
        }

        let params = self
            .params
            .iter()
            .map(|p| parse_key_value(p).map(|(name, value)| Param { name, value }))
            .collect::<Result<Vec<_>>>()?;

        let resources = self
            .pipeline_resource
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| TaskResourceBinding {
                name: SOURCES_INPUT.to_string(),
                resource_ref: PipelineResourceRef { name: r.clone() },
            })
            .collect::<Vec<_>>();

        let inputs = if params.is_empty() && resources.is_empty() {
            None
        } else {
            Some(TaskRunInputs { resources, params })
        };

        let mut run = TaskRun {
            spec: TaskRunSpec {
                task_ref: Some(TaskRef {
                    name: self.task.clone(),
                    kind: None,
                }),
                inputs,
                service_account: self.service_account.clone(),
                timeout: self.timeout.clone(),
                ..Default::default()
            },
            ..Default::default()
        };
        run.stamp_types();

        let naming = if !self.name.is_empty() {
            Naming::Exact(self.name.clone())
        } else {
            match &self.generate_name {
                Some(prefix) if !prefix.is_empty() => Naming::Generate(prefix.clone()),
                _ => Naming::Generate(format!("{}-", self.task)),
            }
        };
        Mutator::new(&self.namespace)
            .with_naming(naming)
            .apply_identity(&mut run);
        Ok(run)
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<TaskRun>> {
        let namespace = require_namespace(&self.namespace)?;
        let run = self.build()?;
        submit(client, namespace, run, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_binds_sources_and_params() {
        let desc = TaskRunDescriptor {
            namespace: "ci".to_string(),
            task: "kaniko-abcde".to_string(),
            pipeline_resource: Some("repo".to_string()),
            params: vec!["IMAGE=registry/ci/app:latest".to_string()],
            ..Default::default()
        };
        let run = desc.build().unwrap();

        assert_eq!(run.metadata.generate_name.as_deref(), Some("kaniko-abcde-"));
        assert_eq!(run.spec.task_ref.as_ref().unwrap().name, "kaniko-abcde");
        let inputs = run.spec.inputs.as_ref().unwrap();
        assert_eq!(inputs.resources[0].name, "sources");
        assert_eq!(inputs.resources[0].resource_ref.name, "repo");
        assert_eq!(inputs.params[0].name, "IMAGE");
        assert_eq!(inputs.params[0].value, "registry/ci/app:latest");
        assert!(run.check_types().is_ok());
    }

    #[test]
    fn test_build_without_inputs() {
        let desc = TaskRunDescriptor {
            name: "nightly".to_string(),
            namespace: "ci".to_string(),
            task: "lint".to_string(),
            ..Default::default()
        };
        let run = desc.build().unwrap();
        assert_eq!(run.metadata.name.as_deref(), Some("nightly"));
        assert!(run.spec.inputs.is_none());
    }

    #[test]
    fn test_explicit_generate_prefix() {
        let desc = TaskRunDescriptor {
            namespace: "ci".to_string(),
            task: "builder-".to_string(),
            generate_name: Some("builder-".to_string()),
            ..Default::default()
        };
        let run = desc.build().unwrap();
        assert_eq!(run.metadata.generate_name.as_deref(), Some("builder-"));
        assert!(run.metadata.name.is_none());
    }

    #[test]
    fn test_build_rejects_bad_param() {
        let desc = TaskRunDescriptor {
            namespace: "ci".to_string(),
            task: "lint".to_string(),
            params: vec!["NOVALUE".to_string()],
            ..Default::default()
        };
        assert!(desc.build().is_err());

        let desc = TaskRunDescriptor::default();
        assert!(matches!(desc.build(), Err(TmError::ValidationError(_))));
    }
}
