use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use toolbx::bootstrap::{BootstrapRequest, Bootstrapper, park_forever};
use toolbx::config;
use toolbx::context::Context;
use toolbx::create::{Assembly, ContainerSpec, Orchestrator, Terminal};
use toolbx::engine::Podman;
use toolbx::host::{RealHost, is_inside_container};
use toolbx::identity::{
    HostIdentity, NameFlags, OsRelease, resolve_names, validate_subid_ranges,
};
use toolbx::migrate::{Coordinator, skip_reason};
use toolbx::platform::PlatformProfile;

const OS_RELEASE: &str = "/etc/os-release";
const MIGRATION_CONTEXT: &str = "pre-flight storage migration";

#[derive(Parser)]
#[command(name = "toolbox", version, about = "Tool for interactive command line environments")]
struct Cli {
    /// Log messages at or above this level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Error)]
    log_level: LogLevel,

    /// Same as --log-level=debug
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to all questions
    #[arg(short = 'y', long = "assumeyes", global = true)]
    assume_yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new Toolbx container
    Create {
        /// Path to a file with registry credentials
        #[arg(long)]
        authfile: Option<PathBuf>,

        /// Assign a different name to the container
        #[arg(short, long)]
        container: Option<String>,

        /// Create a container for a different operating system distribution
        #[arg(short, long)]
        distro: Option<String>,

        /// Change the name of the base image used to create the container
        #[arg(short, long)]
        image: Option<String>,

        /// Create a container for a different operating system release
        #[arg(short, long)]
        release: Option<String>,

        /// Container name (same as --container)
        name: Option<String>,
    },

    /// Initialize a running container
    #[command(hide = true)]
    InitContainer(BootstrapRequest),

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::InitContainer(_) => "init-container",
            Command::Completion { .. } => "completion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    init_logging(level);

    if let Command::Completion { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "toolbox", &mut std::io::stdout());
        return Ok(());
    }

    let host = RealHost;
    let profile = PlatformProfile::current();

    if let Command::InitContainer(request) = &cli.command {
        Bootstrapper::new("/", &host).run(request)?;
        park_forever();
    }

    let config_dir = dirs::config_dir();
    let cfg = match &config_dir {
        Some(dir) => config::load(&config::config_path(dir))?,
        None => config::Config::default(),
    };
    let engine = Podman::new(cfg.engine.clone()).with_log_level(level.as_str());
    let mut ctx = Context::new(profile, cfg, HostIdentity::current(&host), config_dir);

    match skip_reason(cli.command.name(), is_inside_container(&host)) {
        Some(reason) => debug!("Skipping storage migration: {reason}"),
        None => {
            let outcome = Coordinator::for_context(&engine, &mut ctx, &host)?
                .migrate()
                .context(MIGRATION_CONTEXT)?;
            debug!("Storage migration: {outcome:?}");
        }
    }

    match cli.command {
        Command::Create {
            authfile,
            container,
            distro,
            image,
            release,
            name,
        } => {
            let flags = NameFlags {
                container: container.or(name),
                distro,
                image,
                release,
            };
            create(&ctx, &engine, &host, flags, authfile, level, cli.assume_yes)
        }
        Command::InitContainer(_) | Command::Completion { .. } => Ok(()),
    }
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("toolbx={0},toolbox={0}", level.as_str())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn create(
    ctx: &Context,
    engine: &Podman,
    host: &RealHost,
    flags: NameFlags,
    auth_file: Option<PathBuf>,
    level: LogLevel,
    assume_yes: bool,
) -> Result<()> {
    if is_inside_container(host) {
        bail!("this command must be run on the host, not inside a container");
    }
    if let Some(path) = &auth_file
        && !path.is_file()
    {
        bail!("file {} not found", path.display());
    }

    validate_subid_ranges(ctx.profile, &ctx.identity, Path::new("/etc"))?;
    let names = resolve_names(&flags, &ctx.config, &OsRelease::read(Path::new(OS_RELEASE)))?;
    let spec = ContainerSpec::new(names, auth_file);

    let executable = std::env::current_exe().ok();
    let assembly = Assembly {
        profile: ctx.profile,
        identity: &ctx.identity,
        engine_log_level: engine.log_level(),
        toolbox_log_level: level.as_str(),
        executable: executable.as_deref(),
    };
    let console = Terminal::new(ctx.config.prompt_timeout.map(Duration::from_secs));

    Orchestrator::new(engine, host, console, assembly)
        .assume_yes(assume_yes)
        .create(&spec)?;

    println!("Created container: {}", spec.name);
    println!("{}", enter_hint(&ctx.config.engine, spec.name.as_str(), &ctx.identity));
    Ok(())
}

/// Engine commands that start the new container and open a login shell in it.
fn enter_hint(engine: &str, container: &str, identity: &HostIdentity) -> String {
    let start = shell_words::join([engine, "start", container]);
    let shell = identity.shell.to_string_lossy();
    let mut exec = vec![engine, "exec", "--interactive", "--tty"];
    if let Some(user) = &identity.user {
        exec.extend(["--user", user.as_str()]);
    }
    exec.extend([container, &*shell, "-l"]);
    format!("Enter with: {start} && {}", shell_words::join(exec))
}
