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
use crate::domain::deploy::{loader, require_namespace, submit, DeployContext, Upsert};
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::BuildTemplate;
use crate::shared::error::Result;

/// Knative BuildTemplate installed from a manifest (a "runtime").
#[derive(Debug, Clone, Default)]
pub struct BuildTemplateDescriptor {
    pub file: String,
    /// Overrides the manifest name when set.
    pub name: Option<String>,
    pub namespace: String,
    pub registry_secret: Option<String>,
}

impl BuildTemplateDescriptor {
    pub fn prepare(&self, mut template: BuildTemplate) -> BuildTemplate {
        let naming = match &self.name {
            Some(name) if !name.is_empty() => Naming::Exact(name.clone()),
            _ => Naming::Keep,
        };
        Mutator::new(&self.namespace)
            .with_naming(naming)
            .with_registry_secret(self.registry_secret.clone())
            .apply(&mut template);
        template
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<BuildTemplate>> {
        let namespace = require_namespace(&self.namespace)?;
        let template: BuildTemplate = loader::load(&self.file).await?;
        submit(client, namespace, self.prepare(template), ctx).await
    }
}
