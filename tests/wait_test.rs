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

use common::{FakeCluster, Verb};
use std::time::Duration;
use tm::domain::deploy::wait::wait_for_condition;
use tm::infrastructure::kubernetes::{Build, TaskRun};
use tm::{ClusterClient, RemoteObject, TmError, WaitOptions};

fn options(timeout_ms: u64) -> WaitOptions {
    WaitOptions {
        timeout: Duration::from_millis(timeout_ms),
        interval: Duration::from_millis(5),
    }
}

fn build(name: &str) -> Build {
    let mut build = Build::default();
    build.stamp_types();
    build.metadata.name = Some(name.to_string());
    build
}

#[tokio::test]
async fn test_false_condition_fails_with_message() {
    let cluster = FakeCluster::new();
    cluster.seed("default", build("hello-1"));
    cluster.set_condition(
        "Build",
        "default",
        "hello-1",
        "Succeeded",
        "False",
        "step build-step-build exited with code 1",
    );
    let api = cluster.api::<Build>("default");

    let err = wait_for_condition(api.as_ref(), "hello-1", "Succeeded", &options(1000))
        .await
        .unwrap_err();

    match err {
        TmError::ValidationError(msg) => assert!(msg.contains("exited with code 1")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(cluster.count(Verb::Get), 1);
}

#[tokio::test]
async fn test_unknown_condition_times_out() {
    let cluster = FakeCluster::new();
    cluster.seed("default", build("hello-2"));
    cluster.set_condition("Build", "default", "hello-2", "Succeeded", "Unknown", "");
    let api = cluster.api::<Build>("default");

    let err = wait_for_condition(api.as_ref(), "hello-2", "Succeeded", &options(30))
        .await
        .unwrap_err();

    assert!(matches!(err, TmError::Timeout(_)));
    assert!(cluster.count(Verb::Get) > 1);
}

#[tokio::test]
async fn test_missing_object_stops_waiting() {
    let cluster = FakeCluster::new();
    let api = cluster.api::<TaskRun>("default");

    let err = wait_for_condition(api.as_ref(), "absent", "Succeeded", &options(1000))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
