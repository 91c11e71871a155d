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

//! Deploy-time transformations applied to an object before submission.
//!
//! Nothing here talks to the cluster; every function mutates the object it
//! is given in place.

use crate::infrastructure::constants::{
    DOCKER_CONFIG_ENV, PARAM_TYPE_STRING, UPLOAD_DONE_TRIGGER, UPLOAD_STAGING_GLOB,
    UPLOAD_STEP_IMAGE, UPLOAD_STEP_NAME, WORKSPACE_DIR,
};
use crate::infrastructure::kubernetes::objects::{Build, BuildTemplate, Task};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, SecretVolumeSource, Volume, VolumeMount,
};
use kube::Resource;
use tracing::debug;

/// How the submitted object is named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Naming {
    /// Leave whatever the manifest declares.
    #[default]
    Keep,
    Exact(String),
    /// Let the API server append a random suffix to this prefix.
    Generate(String),
}

/// Objects carrying a list of execution steps.
pub trait StepTemplate {
    fn steps_mut(&mut self) -> &mut Vec<Container>;

    fn volumes_mut(&mut self) -> &mut Vec<Volume>;

    /// Drops input bindings that the uploaded sources replace.
    fn clear_input_resources(&mut self);
}

impl StepTemplate for Task {
    fn steps_mut(&mut self) -> &mut Vec<Container> {
        &mut self.spec.steps
    }

    fn volumes_mut(&mut self) -> &mut Vec<Volume> {
        &mut self.spec.volumes
    }

    fn clear_input_resources(&mut self) {
        if let Some(inputs) = self.spec.inputs.as_mut() {
            inputs.resources.clear();
        }
    }
}

impl StepTemplate for BuildTemplate {
    fn steps_mut(&mut self) -> &mut Vec<Container> {
        &mut self.spec.steps
    }

    fn volumes_mut(&mut self) -> &mut Vec<Volume> {
        &mut self.spec.volumes
    }

    fn clear_input_resources(&mut self) {}
}

impl StepTemplate for Build {
    fn steps_mut(&mut self) -> &mut Vec<Container> {
        &mut self.spec.steps
    }

    fn volumes_mut(&mut self) -> &mut Vec<Volume> {
        &mut self.spec.volumes
    }

    fn clear_input_resources(&mut self) {
        self.spec.source = None;
    }
}

/// Unset parameter types are read as arrays by some controllers, so they
/// are pinned to `string`.
pub fn default_param_types(task: &mut Task) {
    if let Some(inputs) = task.spec.inputs.as_mut() {
        for param in inputs.params.iter_mut() {
            if param.type_.as_deref().map_or(true, str::is_empty) {
                param.type_ = Some(PARAM_TYPE_STRING.to_string());
            }
        }
    }
}

pub fn set_identity<K: Resource>(obj: &mut K, namespace: &str, naming: &Naming) {
    let meta = obj.meta_mut();
    if !namespace.is_empty() {
        meta.namespace = Some(namespace.to_string());
    }
    match naming {
        Naming::Keep => {}
        Naming::Exact(name) => {
            meta.name = Some(name.clone());
            meta.generate_name = None;
        }
        Naming::Generate(prefix) => {
            meta.name = None;
            meta.generate_name = Some(prefix.clone());
            // A generated sibling starts without the server state of its source.
            meta.resource_version = None;
            meta.uid = None;
            meta.creation_timestamp = None;
            meta.generation = None;
            meta.managed_fields = None;
            meta.self_link = None;
        }
    }
}

/// Mounts the registry credentials secret into every step and points
/// `DOCKER_CONFIG` at it. Re-applying to an already mutated object leaves a
/// single env var, mount and volume per secret.
pub fn inject_registry_secret<T: StepTemplate>(obj: &mut T, secret: &str) {
    let mount_path = format!("/{}", secret);

    for step in obj.steps_mut().iter_mut() {
        let env = step.env.get_or_insert_with(Vec::new);
        match env.iter_mut().find(|e| e.name == DOCKER_CONFIG_ENV) {
            Some(existing) => {
                existing.value = Some(mount_path.clone());
                existing.value_from = None;
            }
            None => env.push(EnvVar {
                name: DOCKER_CONFIG_ENV.to_string(),
                value: Some(mount_path.clone()),
                ..Default::default()
            }),
        }

        let mounts = step.volume_mounts.get_or_insert_with(Vec::new);
        mounts.retain(|m| m.name != secret);
        mounts.push(VolumeMount {
            name: secret.to_string(),
            mount_path: mount_path.clone(),
            read_only: Some(true),
            ..Default::default()
        });
    }

    let volumes = obj.volumes_mut();
    volumes.retain(|v| v.name != secret);
    volumes.push(Volume {
        name: secret.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    });
}

/// The step that blocks until the client has uploaded the sources and then
/// moves them into the workspace. When the nested move fails the flat move
/// is tried instead.
pub fn upload_step() -> Container {
    let script = format!(
        r#"
while [ ! -f {trigger} ]; do
    sleep 1;
done;
sync;
mkdir -p {workspace};
mv {staging}/* {workspace}/;
if [[ $? != 0 ]]; then
    mv {staging} {workspace}/;
fi
ls -lah {workspace};
sync;"#,
        trigger = UPLOAD_DONE_TRIGGER,
        workspace = WORKSPACE_DIR,
        staging = UPLOAD_STAGING_GLOB,
    );

    Container {
        name: UPLOAD_STEP_NAME.to_string(),
        image: Some(UPLOAD_STEP_IMAGE.to_string()),
        command: Some(vec!["sh".to_string()]),
        args: Some(vec!["-c".to_string(), script]),
        ..Default::default()
    }
}

pub fn prepend_upload_step<T: StepTemplate>(obj: &mut T) {
    obj.steps_mut().insert(0, upload_step());
    obj.clear_input_resources();
}

/// The mutation sequence shared by every deploy flow.
#[derive(Debug, Clone, Default)]
pub struct Mutator {
    namespace: String,
    naming: Naming,
    registry_secret: Option<String>,
    local_source: bool,
}

impl Mutator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_registry_secret(mut self, secret: Option<String>) -> Self {
        self.registry_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_local_source(mut self, local_source: bool) -> Self {
        self.local_source = local_source;
        self
    }

    /// Namespace and naming only, for kinds without execution steps.
    pub fn apply_identity<K: Resource>(&self, obj: &mut K) {
        set_identity(obj, &self.namespace, &self.naming);
    }

    pub fn apply<T: StepTemplate + Resource>(&self, obj: &mut T) {
        self.apply_identity(obj);

        let label = display_name(obj);
        if let Some(secret) = &self.registry_secret {
            debug!(
                "setting registry secret {:?} for \"{}/{}\"",
                secret, self.namespace, label
            );
            inject_registry_secret(obj, secret);
        }

        if self.local_source {
            debug!(
                "adding source uploading step to \"{}/{}\"",
                self.namespace, label
            );
            prepend_upload_step(obj);
        }
    }
}

pub(crate) fn display_name<K: Resource>(obj: &K) -> String {
    let meta = obj.meta();
    meta.name
        .clone()
        .or_else(|| meta.generate_name.clone())
        .unwrap_or_default()
}
