use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use jbang_op_lib::{BaseProject, Context, ExitStatusError, JBangOperation, EXIT_FAILURE, EXIT_SUCCESS};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jbang-op")]
#[command(about = "Run JBang scripts from a project directory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project directory (defaults to the nearest project root)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Run JBang in this directory instead of the project directory
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// JBang installation directory (defaults to JBANG_HOME, then PATH)
    #[arg(long, global = true)]
    jbang_home: Option<PathBuf>,

    /// Do not fail when JBang exits with a non-zero status
    #[arg(long, global = true)]
    no_exit_on_failure: bool,

    /// Suppress all logging
    #[arg(short = 'q', long, global = true)]
    silent: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script
    Run {
        /// Script file, URL or alias
        script: String,

        /// Argument passed to JBang before the script
        #[arg(short = 'J', long = "jbang-arg", allow_hyphen_values = true)]
        jbang_args: Vec<String>,

        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,

        /// Arguments to pass to the script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Initialize a new script
    Init {
        /// Name of the script file to create
        name: String,

        /// Argument passed to JBang after `init`
        #[arg(short = 'J', long = "jbang-arg", allow_hyphen_values = true)]
        jbang_args: Vec<String>,

        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Run JBang with raw arguments
    Exec {
        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,

        /// Arguments to pass to JBang
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Show the resolved operation settings
    Show {
        /// Output format
        #[arg(long, default_value = "human")]
        format: ShowFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::ValueEnum, Clone)]
enum ShowFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => match err.downcast_ref::<ExitStatusError>() {
            // already reported by the operation
            Some(status) => status.status(),
            None => {
                eprintln!("Error: {err:#}");
                EXIT_FAILURE
            }
        },
    };

    process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        return handle_completions(shell);
    }

    let start_dir = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    let mut context = Context::load(cli.config.clone(), &start_dir)?;
    if let Some(dir) = &cli.project {
        context.project = BaseProject::new(dir);
    }

    init_logging(&log_level(cli.verbose, context.config.log.level()));

    let op = base_operation(&cli, &context);

    match cli.command {
        Commands::Run {
            script,
            jbang_args,
            dry_run,
            args,
        } => {
            let op = op.jbang_args(jbang_args).script(script).args(args);
            handle_execute(op, dry_run).await
        }
        Commands::Init {
            name,
            jbang_args,
            dry_run,
        } => {
            let op = op.jbang_arg("init").jbang_args(jbang_args).jbang_arg(name);
            handle_execute(op, dry_run).await
        }
        Commands::Exec { dry_run, args } => handle_execute(op.jbang_args(args), dry_run).await,
        Commands::Show { format } => handle_show(&op, format),
        Commands::Completions { shell } => handle_completions(shell),
    }
}

/// Operation bound to the project, with config and then CLI flags applied.
fn base_operation(cli: &Cli, context: &Context) -> JBangOperation {
    let mut op = context.operation();
    if let Some(home) = &cli.jbang_home {
        op = op.jbang_home(home);
    }
    if let Some(dir) = &cli.work_dir {
        op = op.work_dir(dir);
    }
    if cli.no_exit_on_failure {
        op = op.exit_on_failure(false);
    }
    if cli.silent {
        op = op.silent(true);
    }
    op
}

fn log_level(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn handle_execute(op: JBangOperation, dry_run: bool) -> Result<()> {
    if dry_run {
        let cwd = op
            .get_work_dir()
            .map(|dir| format!(" (cwd: {})", dir.display()))
            .unwrap_or_default();
        println!("Would execute: {}{}", op.command_line(), cwd);
        return Ok(());
    }

    if !op.is_silent() {
        tracing::debug!(command = ?op.shell_command(), "launching jbang");
    }

    // execute() blocks until JBang exits
    tokio::task::spawn_blocking(move || op.execute()).await??;
    Ok(())
}

#[derive(Serialize)]
struct Settings {
    command: String,
    shell_command: Vec<String>,
    script: Option<String>,
    jbang_args: Vec<String>,
    args: Vec<String>,
    jbang_home: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    exit_on_failure: bool,
    silent: bool,
}

impl From<&JBangOperation> for Settings {
    fn from(op: &JBangOperation) -> Self {
        Self {
            command: op.command_line(),
            shell_command: op.shell_command(),
            script: op.get_script().map(str::to_string),
            jbang_args: op.get_jbang_args().to_vec(),
            args: op.get_args().to_vec(),
            jbang_home: op.get_jbang_home().map(PathBuf::from),
            work_dir: op.get_work_dir().map(PathBuf::from),
            exit_on_failure: op.is_exit_on_failure(),
            silent: op.is_silent(),
        }
    }
}

fn handle_show(op: &JBangOperation, format: ShowFormat) -> Result<()> {
    let settings = Settings::from(op);

    match format {
        ShowFormat::Human => {
            println!("Command: {}", settings.command);
            println!(
                "JBang home: {}",
                settings
                    .jbang_home
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(PATH)".to_string())
            );
            println!(
                "Working directory: {}",
                settings
                    .work_dir
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
            println!("Exit on failure: {}", settings.exit_on_failure);
            println!("Silent: {}", settings.silent);
        }
        ShowFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
