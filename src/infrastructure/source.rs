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

//! Local/remote resolution of sources and manifest locations

use crate::shared::error::{Result, TmError};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempPath;
use tracing::debug;

const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

fn git_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?|git|ssh)://[^\s]+?\.git/?$|(?:https?://)?(?:www\.)?(?:github\.com|gitlab\.com|bitbucket\.org)/[\w.-]+/[\w.-]+/?$|git@[\w.-]+:[\w./-]+$)",
        )
        .expect("git url pattern is valid")
    })
}

/// Where the code behind a build or a service comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Git(String),
    Local(PathBuf),
    Image(String),
}

impl SourceLocation {
    /// Existing paths win over URL patterns; anything that is neither a path
    /// nor a git repository is treated as a container image reference.
    pub fn classify(source: &str) -> Self {
        if is_local(source) {
            SourceLocation::Local(PathBuf::from(source))
        } else if git_url_regex().is_match(source) {
            SourceLocation::Git(source.to_string())
        } else {
            SourceLocation::Image(source.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SourceLocation::Local(_))
    }
}

pub fn is_local(location: &str) -> bool {
    !location.is_empty() && Path::new(location).exists()
}

/// Fetches `url` into a temporary file that is removed when the returned
/// path is dropped.
pub async fn download(url: &str) -> Result<TempPath> {
    let parsed = reqwest::Url::parse(url).map_err(|e| TmError::ManifestNotFound {
        location: url.to_string(),
        reason: e.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()?;

    debug!("downloading {}", parsed);
    let resp = client
        .get(parsed)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| TmError::ManifestNotFound {
            location: url.to_string(),
            reason: e.to_string(),
        })?;
    let bytes = resp.bytes().await?;

    let mut file = tempfile::Builder::new()
        .prefix("tm-manifest-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_git_urls() {
        for url in [
            "https://github.com/triggermesh/nodejs-runtime",
            "https://gitlab.example.com/team/app.git",
            "git@github.com:triggermesh/tm.git",
            "ssh://git.example.com/repo.git",
        ] {
            assert_eq!(
                SourceLocation::classify(url),
                SourceLocation::Git(url.to_string()),
                "{url}"
            );
        }
    }

    #[test]
    fn test_classify_images() {
        for image in [
            "gcr.io/google-samples/hello-app:1.0",
            "busybox",
            "registry.local:5000/team/app@sha256:abc",
        ] {
            assert_eq!(
                SourceLocation::classify(image),
                SourceLocation::Image(image.to_string())
            );
        }
    }

    #[test]
    fn test_classify_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        assert!(SourceLocation::classify(path).is_local());
        assert!(!is_local(""));
    }

    #[tokio::test]
    async fn test_download_rejects_non_url() {
        let err = download("not a url").await.unwrap_err();
        assert!(matches!(err, TmError::ManifestNotFound { .. }));
    }
}
