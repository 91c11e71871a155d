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

use crate::infrastructure::constants::{DEFAULT_WAIT_TIMEOUT_SECS, WAIT_POLL_INTERVAL_SECS};
use crate::infrastructure::kubernetes::client::ObjectApi;
use crate::infrastructure::kubernetes::objects::{HasConditions, RemoteObject};
use crate::shared::error::{Result, TmError};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            interval: Duration::from_secs(WAIT_POLL_INTERVAL_SECS),
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Polls `name` until its `condition_type` condition turns `True`.
///
/// A `False` condition fails immediately with the condition message; an
/// `Unknown` or missing condition keeps polling until the timeout.
pub async fn wait_for_condition<K>(
    api: &dyn ObjectApi<K>,
    name: &str,
    condition_type: &str,
    options: &WaitOptions,
) -> Result<K>
where
    K: RemoteObject + HasConditions,
{
    let started = Instant::now();
    info!(
        "waiting for {} \"{}/{}\" to become {}",
        K::KIND,
        api.namespace(),
        name,
        condition_type
    );

    loop {
        let obj = api.get(name).await?;
        match obj.condition(condition_type) {
            Some(c) if c.status == "True" => return Ok(obj),
            Some(c) if c.status == "False" => {
                return Err(TmError::ValidationError(format!(
                    "{} {} failed: {}",
                    K::KIND,
                    name,
                    c.message
                        .as_deref()
                        .or(c.reason.as_deref())
                        .unwrap_or("no reason reported")
                )));
            }
            Some(c) => debug!("{} {} is {}: {:?}", K::KIND, name, c.status, c.reason),
            None => debug!("{} {} reports no {} condition yet", K::KIND, name, condition_type),
        }

        if started.elapsed() >= options.timeout {
            return Err(TmError::Timeout(format!(
                "{} {} did not become {} within {} seconds",
                K::KIND,
                name,
                condition_type,
                options.timeout.as_secs()
            )));
        }

        sleep(options.interval).await;
    }
}
