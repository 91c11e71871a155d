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
use crate::infrastructure::constants::{DEFAULT_BUILD_TIMEOUT, DEFAULT_REVISION};
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::build::{
    ArgumentSpec, BuildSpec, GitSourceSpec, SourceSpec, TemplateInstantiationSpec,
};
use crate::infrastructure::kubernetes::objects::{Build, RemoteObject, ResourceKind};
use crate::infrastructure::source::SourceLocation;
use crate::shared::error::{Result, TmError};

/// Knative Build instantiating a BuildTemplate over git or local sources.
#[derive(Debug, Clone, Default)]
pub struct BuildDescriptor {
    pub name: String,
    pub generate_name: Option<String>,
    pub namespace: String,
    /// Git URL or local directory.
    pub source: String,
    pub revision: String,
    /// BuildTemplate name.
    pub template: String,
    /// `KEY=VALUE` template arguments.
    pub args: Vec<String>,
    pub timeout: Option<String>,
    pub registry_secret: Option<String>,
}

impl BuildDescriptor {
    fn naming(&self) -> Result<Naming> {
        match &self.generate_name {
            Some(prefix) if !prefix.is_empty() => Ok(Naming::Generate(prefix.clone())),
            _ if !self.name.is_empty() => Ok(Naming::Exact(self.name.clone())),
            _ => Err(TmError::ValidationError("Build name is required".to_string())),
        }
    }

    pub fn build(&self) -> Result<Build> {
        if self.template.is_empty() {
            return Err(TmError::ValidationError(
                "Build needs a buildtemplate to instantiate".to_string(),
            ));
        }

        let arguments = self
            .args
            .iter()
            .map(|a| parse_key_value(a).map(|(name, value)| ArgumentSpec { name, value }))
            .collect::<Result<Vec<_>>>()?;

        let location = SourceLocation::classify(&self.source);
        let source = match &location {
            SourceLocation::Git(url) => Some(SourceSpec {
                git: Some(GitSourceSpec {
                    url: url.clone(),
                    revision: if self.revision.is_empty() {
                        DEFAULT_REVISION.to_string()
                    } else {
                        self.revision.clone()
                    },
                }),
            }),
            SourceLocation::Local(_) => None,
            SourceLocation::Image(other) => {
                return Err(TmError::ValidationError(format!(
                    "Build source {:?} is neither a git repository nor a local directory",
                    other
                )));
            }
        };

        let mut build = Build {
            spec: BuildSpec {
                source,
                template: Some(TemplateInstantiationSpec {
                    name: self.template.clone(),
                    kind: Some(ResourceKind::BuildTemplate.kind().to_string()),
                    arguments,
                    env: Vec::new(),
                }),
                timeout: Some(
                    self.timeout
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| DEFAULT_BUILD_TIMEOUT.to_string()),
                ),
                ..Default::default()
            },
            ..Default::default()
        };
        build.stamp_types();

        Mutator::new(&self.namespace)
            .with_naming(self.naming()?)
            .with_registry_secret(self.registry_secret.clone())
            .with_local_source(location.is_local())
            .apply(&mut build);
        Ok(build)
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<Build>> {
        let namespace = require_namespace(&self.namespace)?;
        submit(client, namespace, self.build()?, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(source: &str) -> BuildDescriptor {
        BuildDescriptor {
            generate_name: Some("hello-".to_string()),
            namespace: "default".to_string(),
            source: source.to_string(),
            template: "kaniko".to_string(),
            args: vec!["IMAGE=registry.local/default/hello:latest".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_git_source() {
        let build = descriptor("https://github.com/triggermesh/hello.git")
            .build()
            .unwrap();
        let git = build.spec.source.as_ref().unwrap().git.as_ref().unwrap();
        assert_eq!(git.revision, "master");
        assert!(build.spec.steps.is_empty());
        assert_eq!(build.spec.timeout.as_deref(), Some("10m"));

        let template = build.spec.template.as_ref().unwrap();
        assert_eq!(template.kind.as_deref(), Some("BuildTemplate"));
        assert_eq!(template.arguments[0].name, "IMAGE");
    }

    #[test]
    fn test_local_source_gets_upload_step() {
        let dir = tempfile::tempdir().unwrap();
        let build = descriptor(dir.path().to_str().unwrap()).build().unwrap();
        assert!(build.spec.source.is_none());
        assert_eq!(build.spec.steps.len(), 1);
        assert_eq!(build.spec.steps[0].name, "sources-receiver");
    }

    #[test]
    fn test_image_source_rejected() {
        let err = descriptor("gcr.io/google-samples/hello-app:1.0")
            .build()
            .unwrap_err();
        assert!(matches!(err, TmError::ValidationError(_)));
    }

    #[test]
    fn test_name_required() {
        let mut desc = descriptor("https://github.com/triggermesh/hello.git");
        desc.generate_name = None;
        assert!(desc.build().is_err());
        desc.name = "hello-build".to_string();
        assert_eq!(
            desc.build().unwrap().metadata.name.as_deref(),
            Some("hello-build")
        );
    }
}
