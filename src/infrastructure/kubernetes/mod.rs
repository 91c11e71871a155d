pub mod client;
pub mod objects;

pub use client::{ClusterClient, KubeClusterClient, KubeObjectApi, ObjectApi};
pub use objects::{
    Build, BuildTemplate, Channel, Manifest, PipelineResource, RemoteObject, ResourceKind,
    Service, Task, TaskRun,
};
