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

pub mod batch;
pub mod loader;
pub mod mutator;
pub mod owner;
pub mod reconciler;
pub mod wait;

pub use self::mutator::{Mutator, Naming};
pub use self::reconciler::{create_or_update, Upsert};
pub use self::wait::WaitOptions;

use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::RemoteObject;
use crate::shared::error::{Result, TmError};
use tracing::info;

/// Per-invocation switches shared by every deploy flow.
#[derive(Debug, Clone, Default)]
pub struct DeployContext {
    /// Build and mutate objects without submitting them.
    pub dry_run: bool,
    /// Poll for readiness after submission.
    pub wait: Option<WaitOptions>,
}

impl DeployContext {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            wait: None,
        }
    }

    pub fn with_wait(mut self, wait: Option<WaitOptions>) -> Self {
        self.wait = wait;
        self
    }

    /// Waiting only makes sense for objects that were actually submitted.
    pub fn wait_options(&self) -> Option<&WaitOptions> {
        if self.dry_run {
            None
        } else {
            self.wait.as_ref()
        }
    }
}

pub(crate) fn require_namespace(namespace: &str) -> Result<&str> {
    if namespace.is_empty() {
        return Err(TmError::ValidationError("namespace is required".to_string()));
    }
    Ok(namespace)
}

/// Hands a mutated object to the reconciler, or returns it untouched on a
/// dry run once it passed the same validation.
pub(crate) async fn submit<K, C>(
    client: &C,
    namespace: &str,
    obj: K,
    ctx: &DeployContext,
) -> Result<Upsert<K>>
where
    K: RemoteObject,
    C: ClusterClient,
{
    if ctx.dry_run {
        reconciler::validate(&obj)?;
        return Ok(Upsert::DryRun(obj));
    }

    let api = client.api::<K>(namespace);
    let outcome = create_or_update(api.as_ref(), obj).await?;
    info!(
        "{} \"{}/{}\" {}",
        K::KIND,
        namespace,
        mutator::display_name(outcome.object()),
        outcome.verb()
    );
    Ok(outcome)
}
