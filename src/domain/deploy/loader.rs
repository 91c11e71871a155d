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

//! Manifest loader
//!
//! Resolves a manifest location (local path or URL) and decodes it into a
//! typed remote object. The `kind`/`apiVersion` header is checked before the
//! typed decode, so a manifest of the wrong kind is rejected as
//! `SchemaMismatch` rather than half-parsed.

use crate::infrastructure::kubernetes::objects::kind::Header;
use crate::infrastructure::kubernetes::objects::{Manifest, RemoteObject};
use crate::infrastructure::source;
use crate::shared::error::{Result, TmError};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// A manifest available on local storage. Downloaded copies live in a
/// temporary file that is deleted together with this value.
#[derive(Debug)]
pub struct ResolvedManifest {
    path: PathBuf,
    _download: Option<TempPath>,
}

impl ResolvedManifest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_downloaded(&self) -> bool {
        self._download.is_some()
    }

    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| TmError::ManifestNotFound {
            location: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

pub async fn resolve(location: &str) -> Result<ResolvedManifest> {
    if location.is_empty() {
        return Err(TmError::ManifestNotFound {
            location: String::new(),
            reason: "no manifest location given".to_string(),
        });
    }

    if source::is_local(location) {
        return Ok(ResolvedManifest {
            path: PathBuf::from(location),
            _download: None,
        });
    }

    debug!("cannot find {:?} locally, downloading", location);
    let download = source::download(location).await?;
    Ok(ResolvedManifest {
        path: download.to_path_buf(),
        _download: Some(download),
    })
}

/// Decodes a single document into `K`.
pub fn decode<K: RemoteObject>(content: &str) -> Result<K> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| TmError::parse_error(K::KIND.kind(), e))?;
    let header = Header::of(&value);
    K::KIND.check(&header.api_version, &header.kind)?;
    serde_yaml::from_value(value).map_err(|e| TmError::parse_error(K::KIND.kind(), e))
}

pub async fn load<K: RemoteObject>(location: &str) -> Result<K> {
    let manifest = resolve(location).await?;
    decode(&manifest.read()?)
}

pub async fn load_all(location: &str) -> Result<Vec<Manifest>> {
    let manifest = resolve(location).await?;
    Manifest::decode_all(&manifest.read()?)
}
