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

mod common;

use common::mock::{status_json, MockApiServer};
use serde_json::json;
use tm::infrastructure::kubernetes::Task;
use tm::{create_or_update, KubeObjectApi, ObjectApi, RemoteObject, TmError};

const TASKS: &str = "/apis/tekton.dev/v1alpha1/namespaces/default/tasks";
const LINT: &str = "/apis/tekton.dev/v1alpha1/namespaces/default/tasks/lint";

fn task_json(resource_version: &str, image: &str) -> String {
    json!({
        "apiVersion": "tekton.dev/v1alpha1",
        "kind": "Task",
        "metadata": {
            "name": "lint",
            "namespace": "default",
            "uid": "0b7e6c8e",
            "resourceVersion": resource_version
        },
        "spec": {
            "steps": [{"name": "lint", "image": image}]
        }
    })
    .to_string()
}

fn desired() -> Task {
    let mut task: Task =
        serde_json::from_str(&task_json("", "golangci/golangci-lint")).unwrap();
    task.metadata.uid = None;
    task.metadata.resource_version = None;
    task
}

#[tokio::test]
async fn test_create_posts_to_plural_path() {
    let server =
        MockApiServer::new().on_post(TASKS, 201, &task_json("11", "golangci/golangci-lint"));
    let api = KubeObjectApi::<Task>::new(server.clone().into_client(), "default");

    let outcome = create_or_update(&api, desired()).await.unwrap();

    assert!(outcome.is_created());
    assert_eq!(outcome.object().metadata.resource_version.as_deref(), Some("11"));
    assert_eq!(server.requests(), vec![("POST".to_string(), TASKS.to_string())]);
}

#[tokio::test]
async fn test_already_exists_status_is_recognised() {
    let server = MockApiServer::new().on_post(
        TASKS,
        409,
        &status_json(409, "AlreadyExists", "tasks.tekton.dev \"lint\" already exists"),
    );
    let api = KubeObjectApi::<Task>::new(server.into_client(), "default");

    let err = api.create(&desired()).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn test_stale_update_is_a_conflict() {
    let server = MockApiServer::new().on_put(
        LINT,
        409,
        &status_json(409, "Conflict", "the object has been modified"),
    );
    let api = KubeObjectApi::<Task>::new(server.into_client(), "default");

    let err = api.update(&desired()).await.unwrap_err();
    assert!(matches!(err, TmError::Conflict(msg) if msg.contains("modified")));
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let server = MockApiServer::new();
    let api = KubeObjectApi::<Task>::new(server.into_client(), "default");

    let err = api.get("lint").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(api.namespace(), "default");
}

#[tokio::test]
async fn test_upsert_against_existing_object() {
    let server = MockApiServer::new()
        .on_post(
            TASKS,
            409,
            &status_json(409, "AlreadyExists", "tasks.tekton.dev \"lint\" already exists"),
        )
        .on_get(LINT, 200, &task_json("41", "golangci/golangci-lint"))
        .on_put(LINT, 200, &task_json("42", "golangci/golangci-lint:v1.55"));
    let api = KubeObjectApi::<Task>::new(server.clone().into_client(), "default");

    let outcome = create_or_update(&api, desired()).await.unwrap();

    assert!(outcome.is_updated());
    assert_eq!(outcome.object().metadata.resource_version.as_deref(), Some("42"));
    assert!(outcome.object().check_types().is_ok());
    let methods: Vec<_> = server.requests().into_iter().map(|(m, _)| m).collect();
    assert_eq!(methods, vec!["POST", "GET", "PUT"]);
}
