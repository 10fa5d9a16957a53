mod commands;
mod prompt;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, Subcommand};
use commands::ProvisionAnswers;
use prompt::Prompter;
use provisioner::{Host, ProvisionerError, Provisioner, Settings, SettingsBuilder, SettingsFile};
use support::{fs::local::LocalFileSystem, net::HttpFetcher, process::os::OsProcessManager};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Defaults to `provision`.
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    #[arg(
        long,
        env = "GAIA_MULTINODE_HOME",
        global = true,
        help = "Directory holding the gaia-node-<N> instances (defaults to $HOME)"
    )]
    pub home: Option<PathBuf>,
    #[arg(
        long = "installer-url",
        env = "GAIA_MULTINODE_INSTALLER_URL",
        global = true,
        help = "URL of the gaianet install script"
    )]
    pub installer_url: Option<String>,
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        help = "TOML settings file, flags and env variables take precedence"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Create and start new instances (interactive unless answered by flags).
    Provision {
        #[arg(short, long, help = "Model menu entry, 1 to 5")]
        model: Option<String>,
        #[arg(long = "config-url", help = "Custom model config URL (menu entry 5)")]
        config_url: Option<String>,
        #[arg(short = 'n', long, help = "Number of instances to create")]
        count: Option<u32>,
    },
    /// Start every existing instance.
    StartAll,
    /// Stop every existing instance.
    StopAll,
    /// Print the Node ID and Device ID of every instance.
    Ids,
    /// Print every existing instance with its port.
    List,
}

pub fn settings(global: &GlobalArgs) -> anyhow::Result<Settings> {
    let mut builder = SettingsBuilder::new();

    if let Some(path) = &global.config {
        builder = builder.with_file(SettingsFile::load_from_toml(path)?);
    }

    if let Some(home) = &global.home {
        builder = builder.with_home_dir(home);
    }

    if let Some(url) = &global.installer_url {
        builder = builder.with_install_script_url(url);
    }

    Ok(builder.build()?)
}

/// Exit code for a failed run: the failing external command's code, or 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ProvisionerError>()
        .map(ProvisionerError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = settings(&args.global)?;
    let host = Host::new(settings, LocalFileSystem, OsProcessManager);
    let mut stdout = io::stdout();

    match args.cmd.unwrap_or(Commands::Provision {
        model: None,
        config_url: None,
        count: None,
    }) {
        Commands::Provision {
            model,
            config_url,
            count,
        } => {
            let now = Instant::now();
            let provisioner = Provisioner::new(host, HttpFetcher::new());
            let mut prompter = Prompter::new(io::stdin().lock(), stdout);
            let answers = ProvisionAnswers {
                model,
                config_url,
                count,
            };

            let report = commands::provision(&mut prompter, &provisioner, &answers).await?;
            let elapsed = now.elapsed();
            writeln!(
                prompter.output(),
                "🚀 {} instance(s) up in {elapsed:.2?}, run `gaia-multinode ids` to list their IDs",
                report.instances.len()
            )?;
        },
        Commands::StartAll => commands::start_all(&host, &mut stdout).await?,
        Commands::StopAll => commands::stop_all(&host, &mut stdout).await?,
        Commands::Ids => commands::ids(&host, &mut stdout).await?,
        Commands::List => commands::list(&host, &mut stdout).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::from(exit_code(&e))
        },
    }
}
