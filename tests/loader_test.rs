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

use tm::domain::deploy::loader::{load, resolve};
use tm::infrastructure::kubernetes::Task;
use tm::{RemoteObject, TmError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TASK: &str = r#"apiVersion: tekton.dev/v1alpha1
kind: Task
metadata:
  name: kaniko
spec:
  steps:
    - name: build
      image: gcr.io/kaniko-project/executor
"#;

/// Answers every request with `status` and `body` until the test ends.
async fn serve(status: &'static str, body: &'static str) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/yaml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{}/runtime/task.yaml", addr)
}

#[tokio::test]
async fn test_load_remote_manifest() {
    let url = serve("200 OK", TASK).await;

    let task: Task = load(&url).await.unwrap();

    assert_eq!(task.metadata.name.as_deref(), Some("kaniko"));
    assert_eq!(task.spec.steps.len(), 1);
    assert!(task.check_types().is_ok());
}

#[tokio::test]
async fn test_downloaded_copy_removed_on_drop() {
    let url = serve("200 OK", TASK).await;

    let manifest = resolve(&url).await.unwrap();
    assert!(manifest.is_downloaded());
    let path = manifest.path().to_path_buf();
    assert!(path.exists());
    assert!(manifest.read().unwrap().contains("kind: Task"));

    drop(manifest);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_remote_error_status_is_not_found() {
    let url = serve("404 Not Found", "").await;

    let err = load::<Task>(&url).await.unwrap_err();

    assert!(matches!(err, TmError::ManifestNotFound { .. }));
}

#[tokio::test]
async fn test_local_manifest_is_not_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("task.yaml");
    std::fs::write(&path, TASK).unwrap();

    let manifest = resolve(path.to_str().unwrap()).await.unwrap();

    assert!(!manifest.is_downloaded());
    drop(manifest);
    assert!(path.exists());
}
