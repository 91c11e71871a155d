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

/// API groups
pub const TEKTON_GROUP: &str = "tekton.dev";
pub const BUILD_GROUP: &str = "build.knative.dev";
pub const SERVING_GROUP: &str = "serving.knative.dev";
pub const MESSAGING_GROUP: &str = "messaging.knative.dev";
pub const API_VERSION_V1ALPHA1: &str = "v1alpha1";

/// Registry credentials
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

/// Source upload step
pub const UPLOAD_DONE_TRIGGER: &str = ".uploadIsDone";
pub const UPLOAD_STEP_NAME: &str = "sources-receiver";
pub const UPLOAD_STEP_IMAGE: &str = "busybox";
pub const UPLOAD_STAGING_GLOB: &str = "/home/*";
pub const WORKSPACE_DIR: &str = "/workspace/workspace";

/// Task parameters
pub const PARAM_TYPE_STRING: &str = "string";

/// Build and task-run wiring
pub const IMAGE_ARGUMENT: &str = "IMAGE";
pub const SOURCES_INPUT: &str = "sources";
pub const PIPELINE_RESOURCE_GIT: &str = "git";

/// Defaults
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_REVISION: &str = "master";
pub const DEFAULT_IMAGE_TAG: &str = "latest";
pub const DEFAULT_BUILD_TIMEOUT: &str = "10m";
pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 600;
pub const WAIT_POLL_INTERVAL_SECS: u64 = 2;

/// Conditions
pub const CONDITION_SUCCEEDED: &str = "Succeeded";
pub const CONDITION_READY: &str = "Ready";

/// Resource labels
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_MANAGED_BY_VALUE: &str = "tm";
