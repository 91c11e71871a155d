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

//! In-memory cluster answering like the API server.

#![allow(dead_code)]

pub mod mock;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tm::{ClusterClient, ObjectApi, RemoteObject, TmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Get,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    pub kind: String,
    pub name: String,
}

type Key = (String, String, String);

#[derive(Default)]
struct State {
    objects: HashMap<Key, Value>,
    calls: Vec<Call>,
    counter: u64,
    rejected: HashSet<(String, String)>,
    panicking: HashSet<(String, String)>,
    auto_ready: bool,
}

impl State {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every created object immediately reports `Succeeded` and `Ready`.
    pub fn auto_ready(self) -> Self {
        self.state.lock().unwrap().auto_ready = true;
        self
    }

    /// Creates of `kind/name` fail with a server error.
    pub fn reject(&self, kind: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected
            .insert((kind.to_string(), name.to_string()));
    }

    /// Creates of `kind/name` panic inside the client call.
    pub fn panic_on(&self, kind: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .panicking
            .insert((kind.to_string(), name.to_string()));
    }

    /// Stores `obj` directly, as if created by someone else.
    pub fn seed<K: RemoteObject>(&self, namespace: &str, mut obj: K) -> K {
        let mut state = self.state.lock().unwrap();
        let n = state.next();
        let meta = obj.meta_mut();
        meta.namespace = Some(namespace.to_string());
        meta.uid = Some(format!("uid-{}", n));
        meta.resource_version = Some(n.to_string());
        let name = meta.name.clone().expect("seeded objects need a name");
        state.objects.insert(
            (K::KIND.kind().to_string(), namespace.to_string(), name),
            serde_json::to_value(&obj).unwrap(),
        );
        obj
    }

    /// Overwrites the status of a stored object with a single condition.
    pub fn set_condition(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
        type_: &str,
        status: &str,
        message: &str,
    ) {
        let mut state = self.state.lock().unwrap();
        let key = (kind.to_string(), namespace.to_string(), name.to_string());
        if let Some(value) = state.objects.get_mut(&key) {
            value["status"] = json!({
                "conditions": [{"type": type_, "status": status, "message": message}]
            });
        }
    }

    pub fn stored<K: RemoteObject>(&self, namespace: &str, name: &str) -> Option<K> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(K::KIND.kind().to_string(), namespace.to_string(), name.to_string()))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    pub fn names_of(&self, kind: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<_> = state
            .objects
            .keys()
            .filter(|(k, _, _)| k == kind)
            .map(|(_, _, n)| n.clone())
            .collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, verb: Verb) -> usize {
        self.calls().iter().filter(|c| c.verb == verb).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl ClusterClient for FakeCluster {
    fn api<K: RemoteObject>(&self, namespace: &str) -> Box<dyn ObjectApi<K>> {
        Box::new(FakeApi::<K> {
            state: Arc::clone(&self.state),
            namespace: namespace.to_string(),
            _kind: PhantomData,
        })
    }
}

struct FakeApi<K> {
    state: Arc<Mutex<State>>,
    namespace: String,
    _kind: PhantomData<fn() -> K>,
}

impl<K: RemoteObject> FakeApi<K> {
    fn key(&self, name: &str) -> Key {
        (
            K::KIND.kind().to_string(),
            self.namespace.clone(),
            name.to_string(),
        )
    }

    fn record(state: &mut State, verb: Verb, name: &str) {
        state.calls.push(Call {
            verb,
            kind: K::KIND.kind().to_string(),
            name: name.to_string(),
        });
    }
}

fn ready_status(kind: &str) -> Value {
    let mut status = json!({
        "conditions": [
            {"type": "Succeeded", "status": "True"},
            {"type": "Ready", "status": "True"}
        ]
    });
    if kind == "Service" {
        status["url"] = json!("http://hello.default.example.com");
    }
    status
}

#[async_trait::async_trait]
impl<K: RemoteObject> ObjectApi<K> for FakeApi<K> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create(&self, obj: &K) -> Result<K, TmError> {
        let mut state = self.state.lock().unwrap();
        let mut obj = obj.clone();
        let n = state.next();

        let meta: &mut ObjectMeta = obj.meta_mut();
        let name = match (&meta.name, &meta.generate_name) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(prefix)) if !prefix.is_empty() => format!("{}{:05x}", prefix, n),
            _ => return Err(TmError::KubeError("name or generateName is required".into())),
        };
        Self::record(&mut state, Verb::Create, &name);

        let id = (K::KIND.kind().to_string(), name.clone());
        if state.panicking.contains(&id) {
            drop(state);
            panic!("fake cluster crashed creating {}", name);
        }
        if state
            .rejected
            .contains(&(K::KIND.kind().to_string(), name.clone()))
        {
            return Err(TmError::KubeError(format!("admission denied {}", name)));
        }

        let key = self.key(&name);
        if state.objects.contains_key(&key) {
            return Err(TmError::already_exists(K::KIND.kind(), name, &self.namespace));
        }

        meta.name = Some(name);
        meta.namespace = Some(self.namespace.clone());
        meta.uid = Some(format!("uid-{}", n));
        meta.resource_version = Some(n.to_string());

        let mut value = serde_json::to_value(&obj).unwrap();
        if state.auto_ready {
            value["status"] = ready_status(K::KIND.kind());
        }
        state.objects.insert(key, value.clone());
        Ok(serde_json::from_value(value).unwrap())
    }

    async fn get(&self, name: &str) -> Result<K, TmError> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, Verb::Get, name);
        state
            .objects
            .get(&self.key(name))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
            .ok_or_else(|| TmError::not_found(K::KIND.kind(), name, &self.namespace))
    }

    async fn update(&self, obj: &K) -> Result<K, TmError> {
        let mut state = self.state.lock().unwrap();
        let name = obj.meta().name.clone().unwrap_or_default();
        Self::record(&mut state, Verb::Update, &name);

        let key = self.key(&name);
        let current: K = match state.objects.get(&key) {
            Some(v) => serde_json::from_value(v.clone()).unwrap(),
            None => return Err(TmError::not_found(K::KIND.kind(), name, &self.namespace)),
        };
        if obj.meta().resource_version != current.meta().resource_version {
            return Err(TmError::Conflict(format!(
                "the object {} has been modified",
                name
            )));
        }

        let n = state.next();
        let mut obj = obj.clone();
        obj.meta_mut().uid = current.meta().uid.clone();
        obj.meta_mut().resource_version = Some(n.to_string());

        let mut value = serde_json::to_value(&obj).unwrap();
        if let Some(status) = serde_json::to_value(&current).unwrap().get("status") {
            value["status"] = status.clone();
        }
        state.objects.insert(key, value.clone());
        Ok(serde_json::from_value(value).unwrap())
    }
}
