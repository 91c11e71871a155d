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

//! Typed remote objects for the Knative and Tekton custom resources.
//!
//! None of these kinds ship with `k8s-openapi`, so each struct implements
//! `kube::Resource` through [`remote_object!`] and can be used with
//! `kube::Api<K>` like any built-in type.

pub mod build;
pub mod kind;
pub mod messaging;
pub mod serving;
pub mod tekton;

pub use self::build::{Build, BuildTemplate};
pub use self::kind::{Manifest, ResourceKind};
pub use self::messaging::Channel;
pub use self::serving::Service;
pub use self::tekton::{PipelineResource, Task, TaskRun};

use crate::shared::error::{Result, TmError};
use kube::core::TypeMeta;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A namespaced custom resource this tool knows how to deploy.
pub trait RemoteObject:
    Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: ResourceKind;

    fn types(&self) -> Option<&TypeMeta>;

    fn types_mut(&mut self) -> &mut Option<TypeMeta>;

    /// Overwrites `kind`/`apiVersion` with the constants of this resource type.
    fn stamp_types(&mut self) {
        *self.types_mut() = Some(Self::KIND.type_meta());
    }

    /// Fails with `SchemaMismatch` when `kind` or `apiVersion` differ from the
    /// constants of this resource type. A missing header counts as empty.
    fn check_types(&self) -> Result<()> {
        let (api_version, kind) = self
            .types()
            .map(|t| (t.api_version.as_str(), t.kind.as_str()))
            .unwrap_or(("", ""));
        Self::KIND.check(api_version, kind)
    }
}

/// Implements `kube::Resource` and [`RemoteObject`] for a struct with
/// `types` and `metadata` fields.
macro_rules! remote_object {
    ($ty:ident, $kind:expr) => {
        impl kube::Resource for $ty {
            type DynamicType = ();
            type Scope = k8s_openapi::NamespaceResourceScope;

            fn kind(_: &()) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed($kind.kind())
            }

            fn group(_: &()) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed($kind.group())
            }

            fn version(_: &()) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed($kind.version())
            }

            fn api_version(_: &()) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed($kind.api_version())
            }

            fn plural(_: &()) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed($kind.plural())
            }

            fn meta(&self) -> &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(
                &mut self,
            ) -> &mut k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                &mut self.metadata
            }
        }

        impl $crate::infrastructure::kubernetes::objects::RemoteObject for $ty {
            const KIND: $crate::infrastructure::kubernetes::objects::ResourceKind = $kind;

            fn types(&self) -> Option<&kube::core::TypeMeta> {
                self.types.as_ref()
            }

            fn types_mut(&mut self) -> &mut Option<kube::core::TypeMeta> {
                &mut self.types
            }
        }
    };
}
pub(crate) use remote_object;

/// Status condition shared by every Knative and Tekton kind.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_ready_revision_name: Option<String>,
}

/// Objects whose progress is reported through status conditions.
pub trait HasConditions {
    fn status(&self) -> Option<&ResourceStatus>;

    fn condition(&self, type_: &str) -> Option<&Condition> {
        self.status()
            .and_then(|s| s.conditions.iter().find(|c| c.type_ == type_))
    }
}

pub(crate) fn mismatch(field: &'static str, expected: &str, actual: &str) -> TmError {
    TmError::SchemaMismatch {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
