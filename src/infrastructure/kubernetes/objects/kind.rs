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

use super::{mismatch, Build, BuildTemplate, Channel, PipelineResource, Service, Task, TaskRun};
use crate::infrastructure::constants::{
    API_VERSION_V1ALPHA1, BUILD_GROUP, MESSAGING_GROUP, SERVING_GROUP, TEKTON_GROUP,
};
use crate::shared::error::{Result, TmError};
use kube::core::TypeMeta;
use serde::Deserialize;
use std::fmt;

/// The closed set of resource kinds the deploy command understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Build,
    BuildTemplate,
    Task,
    TaskRun,
    Channel,
    PipelineResource,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Service,
        ResourceKind::Build,
        ResourceKind::BuildTemplate,
        ResourceKind::Task,
        ResourceKind::TaskRun,
        ResourceKind::Channel,
        ResourceKind::PipelineResource,
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceKind::Service => "Service",
            ResourceKind::Build => "Build",
            ResourceKind::BuildTemplate => "BuildTemplate",
            ResourceKind::Task => "Task",
            ResourceKind::TaskRun => "TaskRun",
            // Only in-memory channels are provisioned.
            ResourceKind::Channel => "InMemoryChannel",
            ResourceKind::PipelineResource => "PipelineResource",
        }
    }

    pub fn group(&self) -> &'static str {
        match self {
            ResourceKind::Service => SERVING_GROUP,
            ResourceKind::Build | ResourceKind::BuildTemplate => BUILD_GROUP,
            ResourceKind::Task | ResourceKind::TaskRun | ResourceKind::PipelineResource => {
                TEKTON_GROUP
            }
            ResourceKind::Channel => MESSAGING_GROUP,
        }
    }

    pub fn version(&self) -> &'static str {
        API_VERSION_V1ALPHA1
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::Service => "serving.knative.dev/v1alpha1",
            ResourceKind::Build | ResourceKind::BuildTemplate => "build.knative.dev/v1alpha1",
            ResourceKind::Task | ResourceKind::TaskRun | ResourceKind::PipelineResource => {
                "tekton.dev/v1alpha1"
            }
            ResourceKind::Channel => "messaging.knative.dev/v1alpha1",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Build => "builds",
            ResourceKind::BuildTemplate => "buildtemplates",
            ResourceKind::Task => "tasks",
            ResourceKind::TaskRun => "taskruns",
            ResourceKind::Channel => "inmemorychannels",
            ResourceKind::PipelineResource => "pipelineresources",
        }
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta {
            api_version: self.api_version().to_string(),
            kind: self.kind().to_string(),
        }
    }

    /// Looks up the kind declared by a manifest header.
    pub fn from_header(api_version: &str, kind: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.kind() == kind && k.api_version() == api_version)
    }

    /// Kind is compared before apiVersion, so a manifest of the wrong kind
    /// reports the kind even when both differ.
    pub fn check(&self, api_version: &str, kind: &str) -> Result<()> {
        if kind != self.kind() {
            return Err(mismatch("Kind", self.kind(), kind));
        }
        if api_version != self.api_version() {
            return Err(mismatch("API", self.api_version(), api_version));
        }
        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Header {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

impl Header {
    pub(crate) fn of(value: &serde_yaml::Value) -> Self {
        serde_yaml::from_value(value.clone()).unwrap_or_default()
    }
}

/// One decoded manifest document, tagged by its declared kind.
#[derive(Debug, Clone)]
pub enum Manifest {
    Service(Service),
    Build(Build),
    BuildTemplate(BuildTemplate),
    Task(Task),
    TaskRun(TaskRun),
    Channel(Channel),
    PipelineResource(PipelineResource),
}

impl Manifest {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Manifest::Service(_) => ResourceKind::Service,
            Manifest::Build(_) => ResourceKind::Build,
            Manifest::BuildTemplate(_) => ResourceKind::BuildTemplate,
            Manifest::Task(_) => ResourceKind::Task,
            Manifest::TaskRun(_) => ResourceKind::TaskRun,
            Manifest::Channel(_) => ResourceKind::Channel,
            Manifest::PipelineResource(_) => ResourceKind::PipelineResource,
        }
    }

    pub fn name(&self) -> Option<&str> {
        use kube::Resource;
        let meta = match self {
            Manifest::Service(o) => o.meta(),
            Manifest::Build(o) => o.meta(),
            Manifest::BuildTemplate(o) => o.meta(),
            Manifest::Task(o) => o.meta(),
            Manifest::TaskRun(o) => o.meta(),
            Manifest::Channel(o) => o.meta(),
            Manifest::PipelineResource(o) => o.meta(),
        };
        meta.name.as_deref().or(meta.generate_name.as_deref())
    }

    /// Decodes a single YAML document. The header selects the variant, so an
    /// unknown `kind`/`apiVersion` pair never reaches the typed decoder.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self> {
        let header = Header::of(&value);
        let kind = ResourceKind::from_header(&header.api_version, &header.kind).ok_or_else(|| {
            TmError::SchemaMismatch {
                field: "Kind",
                expected: ResourceKind::ALL
                    .iter()
                    .map(|k| format!("{}/{}", k.api_version(), k.kind()))
                    .collect::<Vec<_>>()
                    .join(", "),
                actual: format!("{}/{}", header.api_version, header.kind),
            }
        })?;

        fn typed<K: serde::de::DeserializeOwned>(
            kind: ResourceKind,
            value: serde_yaml::Value,
        ) -> Result<K> {
            serde_yaml::from_value(value).map_err(|e| TmError::parse_error(kind.kind(), e))
        }

        Ok(match kind {
            ResourceKind::Service => Manifest::Service(typed(kind, value)?),
            ResourceKind::Build => Manifest::Build(typed(kind, value)?),
            ResourceKind::BuildTemplate => Manifest::BuildTemplate(typed(kind, value)?),
            ResourceKind::Task => Manifest::Task(typed(kind, value)?),
            ResourceKind::TaskRun => Manifest::TaskRun(typed(kind, value)?),
            ResourceKind::Channel => Manifest::Channel(typed(kind, value)?),
            ResourceKind::PipelineResource => Manifest::PipelineResource(typed(kind, value)?),
        })
    }

    /// Decodes every non-empty document of a multi-document YAML stream.
    pub fn decode_all(content: &str) -> Result<Vec<Self>> {
        let mut manifests = Vec::new();
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| TmError::parse_error("manifest", e))?;
            if value.is_null() {
                continue;
            }
            manifests.push(Self::from_value(value)?);
        }
        Ok(manifests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_matches_kind_and_api() {
        assert_eq!(
            ResourceKind::from_header("tekton.dev/v1alpha1", "Task"),
            Some(ResourceKind::Task)
        );
        assert_eq!(
            ResourceKind::from_header("messaging.knative.dev/v1alpha1", "InMemoryChannel"),
            Some(ResourceKind::Channel)
        );
        assert_eq!(ResourceKind::from_header("tekton.dev/v1beta1", "Task"), None);
    }

    #[test]
    fn test_check_reports_expected_and_actual() {
        let err = ResourceKind::Task
            .check("tekton.dev/v1alpha1", "Pipeline")
            .unwrap_err();
        match err {
            TmError::SchemaMismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "Kind");
                assert_eq!(expected, "Task");
                assert_eq!(actual, "Pipeline");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = ResourceKind::Task.check("tekton.dev/v1", "Task").unwrap_err();
        assert!(matches!(err, TmError::SchemaMismatch { field: "API", .. }));
    }

    #[test]
    fn test_decode_all_multi_document() {
        let content = r#"
apiVersion: tekton.dev/v1alpha1
kind: Task
metadata:
  name: build
spec:
  steps:
    - name: compile
      image: golang
---
apiVersion: messaging.knative.dev/v1alpha1
kind: InMemoryChannel
metadata:
  name: events
---
"#;
        let manifests = Manifest::decode_all(content).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].kind(), ResourceKind::Task);
        assert_eq!(manifests[0].name(), Some("build"));
        assert_eq!(manifests[1].kind(), ResourceKind::Channel);
    }

    #[test]
    fn test_decode_unknown_kind_is_rejected() {
        let content = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n";
        let err = Manifest::decode_all(content).unwrap_err();
        assert!(matches!(err, TmError::SchemaMismatch { .. }));
    }
}
