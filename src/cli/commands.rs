// CLI command definitions

use super::deploy::DeployCommand;
use crate::domain::config::{
    apply_to_deploy_config, parse_dynamic_configs, ConfigOverrides, DeployConfig,
};
use clap::{Args, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "tm",
    version,
    about = "Deploy Knative and Tekton resources",
    long_about = "A command line tool that turns deployment intents into Knative Serving, Build, Eventing and Tekton resources"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Deploy resources, either one by kind or a whole file in parallel
    #[command(alias = "create")]
    Deploy(DeployCommand),
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Namespace to deploy to
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// Docker registry host the built images are pushed to
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Name of the secret holding registry credentials
    #[arg(long, global = true)]
    pub registry_secret: Option<String>,

    /// Path to a TOML configuration file (falls back to TM_CONFIG)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Print the resources instead of submitting them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Wait until the deployed resources are ready
    #[arg(long, global = true)]
    pub wait: bool,

    /// How long --wait waits, e.g. 90s, 10m
    #[arg(long, value_name = "DURATION", global = true)]
    pub wait_timeout: Option<String>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Dynamic configuration properties to override any setting (-D key=value)
    ///
    /// Keys: namespace, registry, registry-secret, concurrency, dry-run, wait,
    /// wait-timeout, kubeconfig, context
    ///
    /// Example: -Dnamespace=ci -Dwait=true
    #[arg(short = 'D', value_name = "KEY=VALUE", global = true)]
    pub properties: Vec<String>,
}

impl GlobalArgs {
    /// Priority: -D properties > command line > config file > defaults
    pub fn resolve_config(&self, concurrency: Option<usize>) -> anyhow::Result<DeployConfig> {
        let overrides = ConfigOverrides {
            namespace: self.namespace.clone(),
            registry: self.registry.clone(),
            registry_secret: self.registry_secret.clone(),
            concurrency,
            dry_run: self.dry_run,
            wait: self.wait,
            wait_timeout: self.wait_timeout.clone(),
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        };

        let mut conf = DeployConfig::load(self.config.as_deref())?.merge(&overrides);
        if !self.properties.is_empty() {
            let properties = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_deploy_config(&properties, &mut conf)?;
        }
        conf.validate()?;
        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "tm", "deploy", "channel", "events", "-n", "ci", "--dry-run", "-Dwait=true",
        ])
        .unwrap();
        assert_eq!(args.global.namespace.as_deref(), Some("ci"));
        assert!(args.global.dry_run);

        let conf = args.global.resolve_config(None).unwrap();
        assert_eq!(conf.namespace, "ci");
        assert!(conf.wait);
        assert!(conf.dry_run);
    }

    #[test]
    fn test_bad_property_rejected() {
        let args = CliArgs::try_parse_from(["tm", "-Dnovalue", "deploy"]).unwrap();
        assert!(args.global.resolve_config(None).is_err());
    }
}
