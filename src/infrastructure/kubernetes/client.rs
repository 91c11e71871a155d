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

use crate::infrastructure::kubernetes::objects::RemoteObject;
use crate::shared::error::TmError;
use kube::api::PostParams;
use kube::{Api, Client};

/// Per-kind view of the cluster API. Only "already exists" and "not found"
/// are distinguished; every other failure arrives as `Conflict` or
/// `KubeError`.
#[async_trait::async_trait]
pub trait ObjectApi<K: RemoteObject>: Send + Sync {
    fn namespace(&self) -> &str;

    async fn create(&self, obj: &K) -> Result<K, TmError>;

    async fn get(&self, name: &str) -> Result<K, TmError>;

    async fn update(&self, obj: &K) -> Result<K, TmError>;
}

/// Hands out namespaced [`ObjectApi`] handles for any resource kind.
pub trait ClusterClient: Send + Sync {
    fn api<K: RemoteObject>(&self, namespace: &str) -> Box<dyn ObjectApi<K>>;
}

pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub async fn new() -> Result<Self, TmError> {
        let client = Client::try_default().await.map_err(|e| {
            TmError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn get_client(&self) -> Client {
        self.client.clone()
    }

    pub async fn new_with_config(
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, TmError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new().await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| TmError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| TmError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                TmError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            TmError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }
}

impl ClusterClient for KubeClusterClient {
    fn api<K: RemoteObject>(&self, namespace: &str) -> Box<dyn ObjectApi<K>> {
        Box::new(KubeObjectApi::<K>::new(self.client.clone(), namespace))
    }
}

pub struct KubeObjectApi<K> {
    api: Api<K>,
    namespace: String,
}

impl<K: RemoteObject> KubeObjectApi<K> {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    fn object_name(obj: &K) -> String {
        let meta = obj.meta();
        meta.name
            .clone()
            .or_else(|| meta.generate_name.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl<K: RemoteObject> ObjectApi<K> for KubeObjectApi<K> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create(&self, obj: &K) -> Result<K, TmError> {
        let pp = PostParams::default();
        self.api.create(&pp, obj).await.map_err(|e| {
            TmError::from_api(e, K::KIND.kind(), &Self::object_name(obj), &self.namespace)
        })
    }

    async fn get(&self, name: &str) -> Result<K, TmError> {
        self.api
            .get(name)
            .await
            .map_err(|e| TmError::from_api(e, K::KIND.kind(), name, &self.namespace))
    }

    async fn update(&self, obj: &K) -> Result<K, TmError> {
        let name = obj.meta().name.as_deref().ok_or_else(|| {
            TmError::ConfigError(format!("{} name is required for update", K::KIND))
        })?;
        let pp = PostParams::default();
        self.api
            .replace(name, &pp, obj)
            .await
            .map_err(|e| TmError::from_api(e, K::KIND.kind(), name, &self.namespace))
    }
}
