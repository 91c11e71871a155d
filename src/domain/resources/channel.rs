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
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::{Channel, RemoteObject};
use crate::shared::error::Result;

/// In-memory eventing channel. No other channel kind is supported.
#[derive(Debug, Clone, Default)]
pub struct ChannelDescriptor {
    pub name: String,
    pub namespace: String,
}

impl ChannelDescriptor {
    pub fn build(&self) -> Channel {
        let mut channel = Channel::default();
        channel.stamp_types();
        Mutator::new(&self.namespace)
            .with_naming(Naming::Exact(self.name.clone()))
            .apply_identity(&mut channel);
        channel
    }

    pub async fn deploy<C: ClusterClient>(
        &self,
        client: &C,
        ctx: &DeployContext,
    ) -> Result<Upsert<Channel>> {
        let namespace = require_namespace(&self.namespace)?;
        submit(client, namespace, self.build(), ctx).await
    }
}
