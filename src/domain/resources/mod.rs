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

//! Per-kind deploy flows

pub mod build;
pub mod buildtemplate;
pub mod channel;
pub mod pipeline;
pub mod pipelineresource;
pub mod service;
pub mod task;
pub mod taskrun;

pub use self::build::BuildDescriptor;
pub use self::buildtemplate::BuildTemplateDescriptor;
pub use self::channel::ChannelDescriptor;
pub use self::pipeline::{PipelineRun, TaskPipeline};
pub use self::pipelineresource::PipelineResourceDescriptor;
pub use self::service::{ServiceDeployment, ServiceDescriptor};
pub use self::task::TaskDescriptor;
pub use self::taskrun::TaskRunDescriptor;
