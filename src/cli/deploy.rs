//! Deploy commands

use super::commands::GlobalArgs;
use super::display::{StatusIcon, TableRenderer};
use crate::domain::config::dynamic::parse_key_value_pairs;
use crate::domain::config::{parse_units, DeployConfig};
use crate::domain::deploy::batch::{run_batch, BatchDefaults};
use crate::domain::deploy::{loader, DeployContext, Upsert};
use crate::domain::resources::{
    BuildDescriptor, BuildTemplateDescriptor, ChannelDescriptor, PipelineResourceDescriptor,
    ServiceDescriptor, TaskDescriptor, TaskPipeline, TaskRunDescriptor,
};
use crate::infrastructure::constants::{DEFAULT_BUILD_TIMEOUT, DEFAULT_REVISION};
use crate::infrastructure::kubernetes::client::KubeClusterClient;
use crate::infrastructure::kubernetes::objects::RemoteObject;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
pub struct DeployCommand {
    /// Function definition or multi-document manifest to deploy
    #[arg(long = "from", short = 'f', default_value = "serverless.yaml")]
    pub file: String,

    /// Number of concurrent deployment workers
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub kind: Option<DeployKind>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeployKind {
    /// Deploy a knative service
    #[command(aliases = ["services", "svc"])]
    Service(ServiceArgs),

    /// Deploy a knative build
    #[command(aliases = ["builds"])]
    Build(BuildArgs),

    /// Deploy a knative build template
    #[command(aliases = ["buildtemplates", "bldtmpl"])]
    Buildtemplate(BuildTemplateArgs),

    /// Deploy an in-memory eventing channel
    #[command(aliases = ["channels"])]
    Channel(ChannelArgs),

    /// Deploy a tekton Task
    #[command(aliases = ["tasks"])]
    Task(TaskArgs),

    /// Run a tekton Task through a TaskRun
    #[command(aliases = ["taskruns"])]
    Taskrun(TaskRunArgs),

    /// Deploy a tekton git PipelineResource
    #[command(aliases = ["pipelineresources"])]
    Pipelineresource(PipelineResourceArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServiceArgs {
    pub name: String,

    /// Service source to deploy: local folder with sources, git repository or docker image
    #[arg(long = "from", short = 'f')]
    pub source: String,

    /// Git revision (branch, tag, commit SHA or ref)
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Existing buildtemplate name, local path or URL to buildtemplate yaml file
    #[arg(long, default_value = "")]
    pub runtime: String,

    /// Service image build timeout
    #[arg(long, default_value = DEFAULT_BUILD_TIMEOUT)]
    pub build_timeout: String,

    /// Concurrent requests per container: 0 for unlimited
    #[arg(long)]
    pub concurrency: Option<i64>,

    /// Buildtemplate arguments
    #[arg(long = "build-argument", value_name = "KEY=VALUE")]
    pub build_args: Vec<String>,

    /// Name of secrets populating the container environment
    #[arg(long = "env-secret")]
    pub env_secrets: Vec<String>,

    /// Service labels
    #[arg(long = "label", short = 'l', value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Revision template annotations (key1=val1,key2=val2)
    #[arg(long = "annotation", short = 'a')]
    pub annotations: Vec<String>,

    /// Environment variables of the service, eg. `--env foo=bar`
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Image tag to build
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    pub name: String,

    /// Git URL or local path to get sources from
    #[arg(long)]
    pub source: String,

    /// Git source revision
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Buildtemplate name to use with build
    #[arg(long)]
    pub buildtemplate: String,

    /// Build arguments
    #[arg(long, value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Build timeout
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildTemplateArgs {
    /// Local path or URL to buildtemplate yaml file
    #[arg(long = "from", short = 'f')]
    pub file: String,

    /// Overrides the name declared in the manifest
    #[arg(long)]
    pub name: Option<String>,

    /// Name of k8s secret to use in buildtemplate as registry auth json
    #[arg(long)]
    pub credentials: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ChannelArgs {
    pub name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct TaskArgs {
    /// Overrides the name declared in the manifest
    pub name: Option<String>,

    /// Task yaml manifest path or URL
    #[arg(long, short = 'f')]
    pub file: String,

    /// Submit under a generated name with this prefix
    #[arg(long)]
    pub generate_name: Option<String>,

    /// Prepend the source upload step
    #[arg(long)]
    pub from_local_source: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TaskRunArgs {
    /// TaskRun name, generated when omitted
    pub name: Option<String>,

    /// Name of task to run
    #[arg(long, short = 't')]
    pub task: String,

    /// Name of pipelineresource to pass into task
    #[arg(long = "resources", short = 'r')]
    pub pipeline_resource: Option<String>,

    /// Secret name with registry credentials
    #[arg(long, short = 's')]
    pub secret: Option<String>,

    /// Task parameters
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Service account the run executes as
    #[arg(long)]
    pub service_account: Option<String>,

    /// TaskRun timeout
    #[arg(long)]
    pub timeout: Option<String>,

    /// Run the task directly instead of a disposable clone of it
    #[arg(long)]
    pub no_clone: bool,

    /// Prepend the source upload step to the clone
    #[arg(long)]
    pub from_local_source: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PipelineResourceArgs {
    pub name: String,

    /// Git repository URL
    #[arg(long)]
    pub url: String,

    /// Git revision
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,
}

/// Prints the submitted object, or its YAML on a dry run.
fn report<K: RemoteObject>(outcome: &Upsert<K>) -> anyhow::Result<()> {
    let obj = outcome.object();
    if outcome.is_dry_run() {
        println!("---\n{}", serde_yaml::to_string(obj)?);
        return Ok(());
    }

    let meta = obj.meta();
    let name = meta
        .name
        .as_deref()
        .or(meta.generate_name.as_deref())
        .unwrap_or_default();
    println!(
        "{} {} {} {}",
        StatusIcon::for_upsert(outcome).green(),
        K::KIND,
        name.bold(),
        outcome.verb()
    );
    Ok(())
}

impl DeployCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let conf = global.resolve_config(self.concurrency)?;
        let ctx = conf.deploy_context()?;
        let client = KubeClusterClient::new_with_config(conf.kubeconfig.clone(), conf.context.clone())
            .await?;

        match &self.kind {
            None => self.deploy_file(client, &conf, ctx).await,
            Some(kind) => kind.execute(&client, &conf, &ctx).await,
        }
    }

    async fn deploy_file(
        &self,
        client: KubeClusterClient,
        conf: &DeployConfig,
        ctx: DeployContext,
    ) -> anyhow::Result<()> {
        let manifest = loader::resolve(&self.file).await?;
        let units = parse_units(&manifest.read()?, conf)?;
        if units.is_empty() {
            anyhow::bail!("{} contains nothing to deploy", self.file);
        }

        let defaults = BatchDefaults {
            namespace: conf.namespace.clone(),
            registry_secret: conf.registry_secret(),
        };
        let reports = run_batch(Arc::new(client), units, conf.concurrency, defaults, ctx).await;
        println!("{}", TableRenderer::new().render_batch_results(&reports));

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            anyhow::bail!("{} of {} deployments failed", failed, reports.len());
        }
        Ok(())
    }
}

impl DeployKind {
    pub async fn execute(
        &self,
        client: &KubeClusterClient,
        conf: &DeployConfig,
        ctx: &DeployContext,
    ) -> anyhow::Result<()> {
        let namespace = conf.namespace.clone();
        match self {
            DeployKind::Service(args) => {
                let annotations = args
                    .annotations
                    .iter()
                    .flat_map(|a| parse_key_value_pairs(a))
                    .collect();
                let deployment = ServiceDescriptor {
                    name: args.name.clone(),
                    namespace,
                    source: args.source.clone(),
                    revision: args.revision.clone(),
                    runtime: args.runtime.clone(),
                    registry: conf.registry.clone(),
                    registry_secret: conf.registry_secret(),
                    build_timeout: Some(args.build_timeout.clone()),
                    concurrency: args.concurrency,
                    build_args: args.build_args.clone(),
                    env: args.env.clone(),
                    env_secrets: args.env_secrets.clone(),
                    labels: args.labels.clone(),
                    annotations,
                    image_tag: args.tag.clone(),
                }
                .deploy(client, ctx)
                .await?;

                if let Some(template) = &deployment.template {
                    report(template)?;
                }
                if let Some(build) = &deployment.build {
                    report(build)?;
                }
                report(&deployment.service)?;
                if let Some(url) = deployment.url() {
                    println!("{}", url.cyan());
                }
            }
            DeployKind::Build(args) => {
                let build = BuildDescriptor {
                    name: args.name.clone(),
                    generate_name: None,
                    namespace,
                    source: args.source.clone(),
                    revision: args.revision.clone(),
                    template: args.buildtemplate.clone(),
                    args: args.args.clone(),
                    timeout: args.timeout.clone(),
                    registry_secret: conf.registry_secret(),
                }
                .deploy(client, ctx)
                .await?;
                report(&build)?;
            }
            DeployKind::Buildtemplate(args) => {
                let template = BuildTemplateDescriptor {
                    file: args.file.clone(),
                    name: args.name.clone(),
                    namespace,
                    registry_secret: args.credentials.clone().or_else(|| conf.registry_secret()),
                }
                .deploy(client, ctx)
                .await?;
                report(&template)?;
            }
            DeployKind::Channel(args) => {
                let channel = ChannelDescriptor {
                    name: args.name.clone(),
                    namespace,
                }
                .deploy(client, ctx)
                .await?;
                report(&channel)?;
            }
            DeployKind::Task(args) => {
                let task = TaskDescriptor {
                    file: args.file.clone(),
                    name: args.name.clone().unwrap_or_default(),
                    namespace,
                    generate_name: args.generate_name.clone(),
                    registry_secret: conf.registry_secret(),
                    from_local_source: args.from_local_source,
                }
                .deploy(client, ctx)
                .await?;
                report(&task)?;
            }
            DeployKind::Taskrun(args) if args.no_clone => {
                let run = TaskRunDescriptor {
                    name: args.name.clone().unwrap_or_default(),
                    generate_name: None,
                    namespace,
                    task: args.task.clone(),
                    pipeline_resource: args.pipeline_resource.clone(),
                    params: args.params.clone(),
                    service_account: args.service_account.clone(),
                    timeout: args.timeout.clone(),
                }
                .deploy(client, ctx)
                .await?;
                report(&run)?;
            }
            DeployKind::Taskrun(args) => {
                let run = TaskPipeline {
                    task: args.task.clone(),
                    namespace,
                    pipeline_resource: args.pipeline_resource.clone(),
                    params: args.params.clone(),
                    registry_secret: args.secret.clone().or_else(|| conf.registry_secret()),
                    from_local_source: args.from_local_source,
                    service_account: args.service_account.clone(),
                    timeout: args.timeout.clone(),
                }
                .run(client, ctx)
                .await?;
                report(&run.task)?;
                report(&run.task_run)?;
            }
            DeployKind::Pipelineresource(args) => {
                let resource = PipelineResourceDescriptor {
                    name: args.name.clone(),
                    namespace,
                    url: args.url.clone(),
                    revision: args.revision.clone(),
                }
                .deploy(client, ctx)
                .await?;
                report(&resource)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};

    fn deploy(argv: &[&str]) -> DeployCommand {
        let args = CliArgs::try_parse_from(argv).unwrap();
        match args.command {
            Commands::Deploy(cmd) => cmd,
        }
    }

    #[test]
    fn test_batch_form_defaults() {
        let cmd = deploy(&["tm", "deploy"]);
        assert_eq!(cmd.file, "serverless.yaml");
        assert!(cmd.kind.is_none());

        let cmd = deploy(&["tm", "deploy", "-f", "all.yaml", "-c", "8"]);
        assert_eq!(cmd.file, "all.yaml");
        assert_eq!(cmd.concurrency, Some(8));
    }

    #[test]
    fn test_service_flags() {
        let cmd = deploy(&[
            "tm",
            "deploy",
            "svc",
            "hello",
            "-f",
            "https://github.com/x/hello.git",
            "--runtime",
            "kaniko",
            "-e",
            "FOO=bar",
            "--build-argument",
            "DIRECTORY=src",
        ]);
        match cmd.kind {
            Some(DeployKind::Service(args)) => {
                assert_eq!(args.name, "hello");
                assert_eq!(args.revision, "master");
                assert_eq!(args.build_timeout, "10m");
                assert_eq!(args.env, vec!["FOO=bar".to_string()]);
                assert_eq!(args.build_args, vec!["DIRECTORY=src".to_string()]);
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_taskrun_flags() {
        let cmd = deploy(&[
            "tm", "deploy", "taskrun", "-t", "kaniko", "-r", "repo", "-p", "IMAGE=x",
        ]);
        match cmd.kind {
            Some(DeployKind::Taskrun(args)) => {
                assert_eq!(args.task, "kaniko");
                assert_eq!(args.pipeline_resource.as_deref(), Some("repo"));
                assert!(!args.no_clone);
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }
}
