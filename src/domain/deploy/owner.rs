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

use crate::infrastructure::kubernetes::client::ObjectApi;
use crate::infrastructure::kubernetes::objects::RemoteObject;
use crate::shared::error::{Result, TmError};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use tracing::debug;

/// Owner reference pointing at an already submitted `parent`.
pub fn owner_reference<P: RemoteObject>(parent: &P) -> Result<OwnerReference> {
    parent.owner_ref(&()).ok_or_else(|| {
        TmError::ValidationError(format!(
            "{} has no name or uid yet and cannot own other resources",
            P::KIND
        ))
    })
}

/// Replaces the owner references of `name` with `owner` alone. Existing
/// owners are dropped, not merged.
pub async fn set_owner<K: RemoteObject>(
    api: &dyn ObjectApi<K>,
    name: &str,
    owner: OwnerReference,
) -> Result<K> {
    let mut obj = api.get(name).await?;
    debug!(
        "setting {} \"{}/{}\" owner to {}/{}",
        K::KIND,
        api.namespace(),
        name,
        owner.kind,
        owner.name
    );
    obj.meta_mut().owner_references = Some(vec![owner]);
    api.update(&obj).await
}
