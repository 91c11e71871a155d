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

//! Runs a template Task through a disposable clone.
//!
//! The clone ends up owned by its TaskRun so the cluster collects both
//! together once the run is deleted.

use crate::domain::deploy::mutator::display_name;
use crate::domain::deploy::wait::wait_for_condition;
use crate::domain::deploy::{owner, require_namespace, DeployContext, Upsert};
use crate::domain::resources::task::TaskDescriptor;
use crate::domain::resources::taskrun::TaskRunDescriptor;
use crate::infrastructure::constants::CONDITION_SUCCEEDED;
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::{Task, TaskRun};
use crate::shared::error::Result;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TaskPipeline {
    /// Name of the installed template Task.
    pub task: String,
    pub namespace: String,
    pub pipeline_resource: Option<String>,
    pub params: Vec<String>,
    pub registry_secret: Option<String>,
    pub from_local_source: bool,
    pub service_account: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub task: Upsert<Task>,
    pub task_run: Upsert<TaskRun>,
}

impl TaskPipeline {
    pub async fn run<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<PipelineRun> {
        let namespace = require_namespace(&self.namespace)?;

        let template = client.api::<Task>(namespace).get(&self.task).await?;
        let template_name = display_name(&template);
        let cloner = TaskDescriptor {
            namespace: namespace.to_string(),
            registry_secret: self.registry_secret.clone(),
            from_local_source: self.from_local_source,
            ..Default::default()
        };
        let task = cloner.clone_from(client, template, ctx).await?;
        let clone_name = display_name(task.object());
        debug!("running task clone \"{}/{}\"", namespace, clone_name);

        // An unsubmitted clone only has its prefix, so the run is named after the template.
        let run_prefix = if task.is_dry_run() {
            format!("{}-", template_name)
        } else {
            format!("{}-", clone_name)
        };

        let task_run = TaskRunDescriptor {
            name: String::new(),
            generate_name: Some(run_prefix),
            namespace: namespace.to_string(),
            task: clone_name.clone(),
            pipeline_resource: self.pipeline_resource.clone(),
            params: self.params.clone(),
            service_account: self.service_account.clone(),
            timeout: self.timeout.clone(),
        }
        .deploy(client, ctx)
        .await?;

        if !task_run.is_dry_run() {
            let owner_ref = owner::owner_reference(task_run.object())?;
            cloner.set_owner(client, &clone_name, owner_ref).await?;
        }

        let task_run = match ctx.wait_options() {
            Some(opts) => {
                let api = client.api::<TaskRun>(namespace);
                let done = wait_for_condition(
                    api.as_ref(),
                    &display_name(task_run.object()),
                    CONDITION_SUCCEEDED,
                    opts,
                )
                .await?;
                task_run.map(|_| done)
            }
            None => task_run,
        };

        Ok(PipelineRun { task, task_run })
    }
}
