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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, TmError>;

#[derive(Error, Debug)]
pub enum TmError {
    #[error("Manifest not found: '{location}': {reason}")]
    ManifestNotFound { location: String, reason: String },

    #[error("Failed to parse {kind} manifest: {reason}")]
    ParseError { kind: String, reason: String },

    #[error("Object {field} mismatch: got {actual:?}, want {expected:?}")]
    SchemaMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Resource not found: {resource_type} '{name}' in namespace '{namespace}'")]
    NotFound {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("Resource already exists: {resource_type} '{name}' in namespace '{namespace}'")]
    AlreadyExists {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TmError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn parse_error(kind: impl Into<String>, reason: impl ToString) -> Self {
        Self::ParseError {
            kind: kind.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn already_exists(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Translates an API failure for `resource_type/name` into the variants
    /// the reconciler inspects. Anything that is not a 404 or a 409 keeps the
    /// server message verbatim.
    pub fn from_api(
        err: kube::Error,
        resource_type: &str,
        name: &str,
        namespace: &str,
    ) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
                Self::already_exists(resource_type, name, namespace)
            }
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict(ae.message),
            kube::Error::Api(ae) if ae.code == 404 => {
                Self::not_found(resource_type, name, namespace)
            }
            kube::Error::Api(ae) => Self::KubeError(ae.message),
            e => Self::KubeError(e.to_string()),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<kube::Error> for TmError {
    fn from(err: kube::Error) -> Self {
        TmError::KubeError(err.to_string())
    }
}
