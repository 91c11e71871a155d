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

//! Create-or-update of a single remote object.
//!
//! Creates need no resource version, updates do. The upsert therefore tries
//! a create first and only on "already exists" fetches the live object to
//! borrow its resource version for the update:
//!
//! ```text
//! Creating ──ok──────────────────────────────────────────▶ Done(Created)
//!    │ already exists (fixed name only)
//!    ▼
//! ConflictDetected ─▶ Fetching ──resourceVersion──▶ Updating ─▶ Done(Updated)
//! ```
//!
//! Objects with a generated name never leave `Creating`: every call is
//! meant to produce a new sibling.

use crate::domain::deploy::mutator::display_name;
use crate::infrastructure::kubernetes::client::ObjectApi;
use crate::infrastructure::kubernetes::objects::RemoteObject;
use crate::shared::error::{Result, TmError};
use tracing::debug;

/// Outcome of a deploy step.
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert<K> {
    Created(K),
    Updated(K),
    /// Built and mutated but never submitted. Only produced by dry runs,
    /// never by [`create_or_update`].
    DryRun(K),
}

impl<K> Upsert<K> {
    pub fn object(&self) -> &K {
        match self {
            Upsert::Created(k) | Upsert::Updated(k) | Upsert::DryRun(k) => k,
        }
    }

    pub fn into_inner(self) -> K {
        match self {
            Upsert::Created(k) | Upsert::Updated(k) | Upsert::DryRun(k) => k,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Upsert::Updated(_))
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Upsert::DryRun(_))
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Upsert::Created(_) => "created",
            Upsert::Updated(_) => "updated",
            Upsert::DryRun(_) => "rendered",
        }
    }

    pub fn map<T>(self, f: impl FnOnce(K) -> T) -> Upsert<T> {
        match self {
            Upsert::Created(k) => Upsert::Created(f(k)),
            Upsert::Updated(k) => Upsert::Updated(f(k)),
            Upsert::DryRun(k) => Upsert::DryRun(f(k)),
        }
    }
}

enum UpsertState<K> {
    Creating(K),
    ConflictDetected(K),
    Fetching(K),
    Updating(K),
    Done(Upsert<K>),
}

/// Rejects objects that cannot be submitted without touching the API.
pub fn validate<K: RemoteObject>(obj: &K) -> Result<()> {
    obj.check_types()?;

    let meta = obj.meta();
    let has_name = meta.name.as_deref().is_some_and(|n| !n.is_empty());
    let has_prefix = meta.generate_name.as_deref().is_some_and(|n| !n.is_empty());
    if !has_name && !has_prefix {
        return Err(TmError::ValidationError(format!(
            "{} name is required",
            K::KIND
        )));
    }
    Ok(())
}

fn generates_name<K: RemoteObject>(obj: &K) -> bool {
    obj.meta()
        .generate_name
        .as_deref()
        .is_some_and(|n| !n.is_empty())
}

pub async fn create_or_update<K: RemoteObject>(
    api: &dyn ObjectApi<K>,
    obj: K,
) -> Result<Upsert<K>> {
    validate(&obj)?;

    if generates_name(&obj) {
        debug!(
            "creating {} with generated name \"{}/{}*\"",
            K::KIND,
            api.namespace(),
            display_name(&obj)
        );
        return api.create(&obj).await.map(Upsert::Created);
    }

    let mut state = UpsertState::Creating(obj);
    loop {
        state = match state {
            UpsertState::Creating(obj) => match api.create(&obj).await {
                Ok(created) => UpsertState::Done(Upsert::Created(created)),
                Err(e) if e.is_already_exists() => UpsertState::ConflictDetected(obj),
                Err(e) => return Err(e),
            },
            UpsertState::ConflictDetected(obj) => {
                debug!(
                    "{} \"{}/{}\" already exists, updating",
                    K::KIND,
                    api.namespace(),
                    display_name(&obj)
                );
                UpsertState::Fetching(obj)
            }
            UpsertState::Fetching(mut obj) => {
                let name = display_name(&obj);
                let current = api.get(&name).await?;
                obj.meta_mut().resource_version = current.meta().resource_version.clone();
                UpsertState::Updating(obj)
            }
            UpsertState::Updating(obj) => {
                UpsertState::Done(Upsert::Updated(api.update(&obj).await?))
            }
            UpsertState::Done(outcome) => return Ok(outcome),
        };
    }
}
