//! rollcall daemon: entry point for running the attendance server.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rollcall_crypto::OsRandom;
use rollcall_node::{open_store, AttendanceNode, NodeConfig};
use rollcall_store::{export_csv, AttendanceLedger, CredentialStore};
use rollcall_types::StudentId;
use rollcall_utils::LogFormat;

#[derive(Parser)]
#[command(name = "rollcall", about = "Geofenced, QR/OTP verified attendance server")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the attendance ledger.
    #[arg(long, env = "ROLLCALL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ROLLCALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ROLLCALL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP server until SIGINT/SIGTERM.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:8080".
        #[arg(long, env = "ROLLCALL_LISTEN")]
        listen: Option<String>,
    },
    /// Manage registered students.
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },
    /// Write the attendance ledger as CSV.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum StudentAction {
    /// Register a student, replacing any existing password.
    Add {
        student_id: String,
        name: String,
        #[arg(long, env = "ROLLCALL_STUDENT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match cli.config {
        Some(ref path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    rollcall_utils::init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Serve { listen } => {
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            tracing::info!(
                listen = %config.listen_addr,
                data_dir = %config.data_dir.display(),
                "starting rollcall server"
            );
            let mut node = AttendanceNode::new(config)?;
            node.run().await?;
            tracing::info!("rollcall daemon exited cleanly");
        }
        Command::Student {
            action:
                StudentAction::Add {
                    student_id,
                    name,
                    password,
                },
        } => {
            let student = StudentId::new(student_id)?;
            let store = open_store(&config)?;
            store
                .credential_store(Arc::new(OsRandom))
                .add_student(&student, &name, &password)?;
            store.force_sync()?;
            tracing::info!(student = %student, "student registered");
        }
        Command::Export { output } => {
            let store = open_store(&config)?;
            let records = store.attendance_ledger().iter_records()?;
            let rows = match output {
                Some(ref path) => {
                    let file = File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    export_csv(&records, BufWriter::new(file))?
                }
                None => export_csv(&records, io::stdout().lock())?,
            };
            tracing::info!(rows, "attendance exported");
        }
    }

    Ok(())
}
