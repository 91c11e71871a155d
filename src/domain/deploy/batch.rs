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

//! Best-effort fan-out of independent deploy units.
//!
//! A fixed pool of workers drains a shared queue. Every unit reports its own
//! outcome and a failing unit never stops its siblings.

use crate::domain::deploy::mutator::{default_param_types, display_name, Mutator};
use crate::domain::deploy::{submit, DeployContext, Upsert};
use crate::domain::resources::ServiceDescriptor;
use crate::infrastructure::kubernetes::client::ClusterClient;
use crate::infrastructure::kubernetes::objects::{Manifest, RemoteObject, ResourceKind};
use crate::shared::error::{Result, TmError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// One independently deployable item of a batch.
#[derive(Debug, Clone)]
pub enum DeployUnit {
    Service(ServiceDescriptor),
    Manifest(Manifest),
}

impl DeployUnit {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DeployUnit::Service(_) => ResourceKind::Service,
            DeployUnit::Manifest(m) => m.kind(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            DeployUnit::Service(s) => s.name.clone(),
            DeployUnit::Manifest(m) => m.name().unwrap_or("<unnamed>").to_string(),
        }
    }
}

/// Values applied to manifests that do not carry their own.
#[derive(Debug, Clone, Default)]
pub struct BatchDefaults {
    pub namespace: String,
    pub registry_secret: Option<String>,
}

#[derive(Debug)]
pub struct UnitReport {
    pub label: String,
    pub kind: ResourceKind,
    pub outcome: std::result::Result<String, TmError>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl UnitReport {
    fn failed(label: String, kind: ResourceKind, reason: String) -> Self {
        let now = Utc::now();
        UnitReport {
            label,
            kind,
            outcome: Err(TmError::KubeError(reason)),
            started: now,
            finished: now,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished - self.started).num_milliseconds()
    }
}

fn describe<K: RemoteObject>(outcome: &Upsert<K>) -> String {
    format!("{} {}", display_name(outcome.object()), outcome.verb())
}

async fn submit_manifest<K, C>(
    client: &C,
    mut obj: K,
    defaults: &BatchDefaults,
    ctx: &DeployContext,
    mutate: impl FnOnce(&Mutator, &mut K),
) -> Result<String>
where
    K: RemoteObject,
    C: ClusterClient,
{
    let namespace = obj
        .meta()
        .namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| defaults.namespace.clone());
    let mutator =
        Mutator::new(namespace.as_str()).with_registry_secret(defaults.registry_secret.clone());
    mutate(&mutator, &mut obj);
    let outcome = submit(client, &namespace, obj, ctx).await?;
    Ok(describe(&outcome))
}

/// Deploys a single decoded manifest document.
pub async fn deploy_manifest<C: ClusterClient>(
    client: &C,
    manifest: Manifest,
    defaults: &BatchDefaults,
    ctx: &DeployContext,
) -> Result<String> {
    match manifest {
        Manifest::Task(task) => {
            submit_manifest(client, task, defaults, ctx, |m, t| {
                default_param_types(t);
                m.apply(t);
            })
            .await
        }
        Manifest::BuildTemplate(t) => {
            submit_manifest(client, t, defaults, ctx, |m, t| m.apply(t)).await
        }
        Manifest::Build(b) => submit_manifest(client, b, defaults, ctx, |m, b| m.apply(b)).await,
        Manifest::TaskRun(r) => {
            submit_manifest(client, r, defaults, ctx, |m, r| m.apply_identity(r)).await
        }
        Manifest::PipelineResource(r) => {
            submit_manifest(client, r, defaults, ctx, |m, r| m.apply_identity(r)).await
        }
        Manifest::Channel(c) => {
            submit_manifest(client, c, defaults, ctx, |m, c| m.apply_identity(c)).await
        }
        Manifest::Service(s) => {
            submit_manifest(client, s, defaults, ctx, |m, s| m.apply_identity(s)).await
        }
    }
}

async fn deploy_unit<C: ClusterClient>(
    client: &C,
    unit: DeployUnit,
    defaults: &BatchDefaults,
    ctx: &DeployContext,
) -> UnitReport {
    let label = unit.label();
    let kind = unit.kind();
    let started = Utc::now();

    let outcome = match unit {
        DeployUnit::Service(service) => service.deploy(client, ctx).await.map(|d| {
            match d.url() {
                Some(url) => format!("{} at {}", describe(&d.service), url),
                None => describe(&d.service),
            }
        }),
        DeployUnit::Manifest(manifest) => deploy_manifest(client, manifest, defaults, ctx).await,
    };

    UnitReport {
        label,
        kind,
        outcome,
        started,
        finished: Utc::now(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Deploys `units` with at most `concurrency` in flight. Reports come back in
/// the order the units were given, one per unit.
pub async fn run_batch<C>(
    client: Arc<C>,
    units: Vec<DeployUnit>,
    concurrency: usize,
    defaults: BatchDefaults,
    ctx: DeployContext,
) -> Vec<UnitReport>
where
    C: ClusterClient + 'static,
{
    if units.is_empty() {
        return Vec::new();
    }

    let workers = concurrency.max(1).min(units.len());
    info!("deploying {} units with {} workers", units.len(), workers);

    let expected = units
        .iter()
        .map(|u| (u.label(), u.kind()))
        .collect::<Vec<_>>();
    let queue = Arc::new(Mutex::new(
        units.into_iter().enumerate().collect::<VecDeque<_>>(),
    ));
    let defaults = Arc::new(defaults);
    let ctx = Arc::new(ctx);
    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, UnitReport)>();

    let handles = (0..workers)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            let client = Arc::clone(&client);
            let defaults = Arc::clone(&defaults);
            let ctx = Arc::clone(&ctx);
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, unit)) = next else {
                        break;
                    };
                    let (label, kind) = (unit.label(), unit.kind());
                    debug!("worker {} picked {} {}", worker, kind, label);
                    let deploy = deploy_unit(client.as_ref(), unit, &defaults, &ctx);
                    let report = AssertUnwindSafe(deploy)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| {
                            let reason =
                                format!("deploy panicked: {}", panic_message(payload.as_ref()));
                            UnitReport::failed(label, kind, reason)
                        });
                    if let Err(e) = &report.outcome {
                        warn!("{} {} failed: {}", report.kind, report.label, e);
                    }
                    if tx.send((index, report)).is_err() {
                        break;
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    drop(tx);

    let mut slots: Vec<Option<UnitReport>> = expected.iter().map(|_| None).collect();
    while let Some((index, report)) = rx.recv().await {
        slots[index] = Some(report);
    }

    for result in join_all(handles).await {
        if let Err(e) = result {
            warn!("deploy worker stopped abnormally: {}", e);
        }
    }

    slots
        .into_iter()
        .zip(expected)
        .map(|(slot, (label, kind))| {
            slot.unwrap_or_else(|| {
                warn!("{} {} was never reported", kind, label);
                UnitReport::failed(label, kind, "deploy worker stopped before reporting".into())
            })
        })
        .collect()
}
