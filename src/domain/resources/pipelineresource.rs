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

use crate::domain::deploy::mutator::{Mutator, Naming};
use crate::domain::deploy::{require_namespace, submit, DeployContext, Upsert};
use crate::infrastructure::constants::{DEFAULT_REVISION, PIPELINE_RESOURCE_GIT};
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::tekton::{Param, PipelineResourceSpec};
use crate::infrastructure::kubernetes::objects::{PipelineResource, RemoteObject};
use crate::shared::error::{Result, TmError};

/// Git repository exposed to Tekton tasks as a pipeline resource.
#[derive(Debug, Clone, Default)]
pub struct PipelineResourceDescriptor {
    pub name: String,
    pub namespace: String,
    pub url: String,
    pub revision: String,
}

impl PipelineResourceDescriptor {
    pub fn build(&self) -> Result<PipelineResource> {
        if self.url.is_empty() {
            return Err(TmError::ValidationError(format!(
                "PipelineResource {} needs a git url",
                self.name
            )));
        }

        let revision = if self.revision.is_empty() {
            DEFAULT_REVISION
        } else {
            self.revision.as_str()
        };

        let mut resource = PipelineResource {
            spec: PipelineResourceSpec {
                type_: PIPELINE_RESOURCE_GIT.to_string(),
                params: vec![
                    Param {
                        name: "url".to_string(),
                        value: self.url.clone(),
                    },
                    Param {
                        name: "revision".to_string(),
                        value: revision.to_string(),
                    },
                ],
            },
            ..Default::default()
        };
        resource.stamp_types();
        Mutator::new(&self.namespace)
            .with_naming(Naming::Exact(self.name.clone()))
            .apply_identity(&mut resource);
        Ok(resource)
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<PipelineResource>> {
        let namespace = require_namespace(&self.namespace)?;
        submit(client, namespace, self.build()?, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults_revision() {
        let desc = PipelineResourceDescriptor {
            name: "repo".to_string(),
            namespace: "ci".to_string(),
            url: "https://github.com/triggermesh/tm".to_string(),
            revision: String::new(),
        };
        let res = desc.build().unwrap();
        assert_eq!(res.spec.type_, "git");
        assert_eq!(res.spec.params[1].name, "revision");
        assert_eq!(res.spec.params[1].value, "master");
        assert_eq!(res.metadata.name.as_deref(), Some("repo"));
    }

    #[test]
    fn test_build_requires_url() {
        let desc = PipelineResourceDescriptor {
            name: "repo".to_string(),
            namespace: "ci".to_string(),
            ..Default::default()
        };
        assert!(desc.build().is_err());
    }
}
