//! site_stack: synthesizes the static website stack into a deployable
//! template, asset manifest and `deploy.sh`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use site_stack::config::Overrides;
use site_stack::{App, ConfigError, SiteConfig, StaticWebsite, SynthError};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "site_stack")]
#[command(about = "Synthesize the static website stack")]
struct Args {
    /// Config file, defaults to site_stack.toml when it exists
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the template, asset manifest and deploy script
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory holding the built site, relative to the current directory
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    #[arg(long)]
    stack_name: Option<String>,

    /// 12 digit AWS account id
    #[arg(long)]
    account: Option<String>,

    #[arg(long)]
    region: Option<String>,
}

fn run(args: Args) -> Result<(), SynthError> {
    let mut config = SiteConfig::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
    let overrides = Overrides {
        stack_name: args.stack_name,
        account: args.account,
        region: args.region,
        asset_dir: args.asset_dir,
        out_dir: args.out,
    };
    config.apply_overrides(overrides.relative_to(&cwd));
    info!(
        stack = %config.stack_name,
        region = %config.region,
        account = config.account.as_deref().unwrap_or("<deploy time>"),
        "synthesizing"
    );

    let site = StaticWebsite::new(&config)?;
    let mut app = App::new(&config.base_dir, &config.out_dir);
    app.add_stack(site.stack);
    for assembly in app.synth()? {
        info!(
            stack = %assembly.stack_name,
            out = %config.out_dir.display(),
            "done, run deploy.sh to deploy"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
