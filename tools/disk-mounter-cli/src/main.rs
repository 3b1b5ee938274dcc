use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use disk_mounter::{LinuxHal, MountOps, Mounter, MounterConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod logging;

#[derive(Debug, Parser)]
#[command(name = "disk-mounter")]
#[command(about = "Mount, unmount, remount and swap on block devices, guided by /proc/mounts")]
struct Cli {
    /// TOML file with mounter settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the total number of unmount attempts
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Override the pause between unmount attempts, in milliseconds
    #[arg(long, global = true)]
    retry_sleep_ms: Option<u64>,

    /// Override the per-command timeout, in seconds
    #[arg(long, global = true)]
    command_timeout_secs: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mount a partition unless it is already mounted there
    Mount {
        partition: String,
        mount_point: String,
        /// Extra arguments for mount(8), after `--`
        #[arg(last = true)]
        options: Vec<String>,
    },
    /// Unmount a partition or mount point, retrying while busy
    Unmount { target: String },
    /// Move the device mounted at FROM to TO
    Remount {
        from: String,
        to: String,
        /// Extra arguments for mount(8), after `--`
        #[arg(last = true)]
        options: Vec<String>,
    },
    /// Remount a mount point read-only in place
    RemountRo { mount_point: String },
    /// Enable swap on a partition unless it is already active
    SwapOn { partition: String },
    /// Print whether a partition or mount point is mounted
    IsMounted { target: String },
    /// Print whether a path is a mount point
    IsMountPoint { path: String },
    /// Print the device mounted at a mount point
    FindDevice { mount_point: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = build_config(&cli)?;
    let mounter = Mounter::new(Arc::new(LinuxHal::new()), &config);
    let retry = mounter.retry();
    log::debug!(
        "mount table {}, {} unmount attempts {:?} apart",
        mounter.mount_table_path().display(),
        retry.max_attempts,
        retry.interval
    );

    run(&mounter, cli.command, &mut io::stdout().lock())
}

fn build_config(cli: &Cli) -> Result<MounterConfig> {
    let mut config = match &cli.config {
        Some(path) => MounterConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MounterConfig::default(),
    };
    if let Some(max_retries) = cli.max_retries {
        config.max_unmount_retries = max_retries;
    }
    if let Some(sleep_ms) = cli.retry_sleep_ms {
        config.unmount_retry_sleep_ms = sleep_ms;
    }
    if let Some(timeout) = cli.command_timeout_secs {
        config.command_timeout_secs = timeout;
    }
    config.validate().context("invalid mounter settings")?;
    Ok(config)
}

fn run(mounter: &Mounter, command: Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Mount {
            partition,
            mount_point,
            options,
        } => {
            let options: Vec<&str> = options.iter().map(String::as_str).collect();
            mounter
                .mount(&partition, &mount_point, &options)
                .with_context(|| format!("mounting {partition} at {mount_point}"))?;
            log::info!("{} mounted at {}", partition, mount_point);
        }
        Commands::Unmount { target } => {
            let unmounted = mounter
                .unmount(&target)
                .with_context(|| format!("unmounting {target}"))?;
            if unmounted {
                log::info!("{} unmounted", target);
            } else {
                log::info!("{} was not mounted", target);
            }
        }
        Commands::Remount { from, to, options } => {
            let options: Vec<&str> = options.iter().map(String::as_str).collect();
            mounter
                .remount(&from, &to, &options)
                .with_context(|| format!("remounting {from} at {to}"))?;
            log::info!("{} remounted at {}", from, to);
        }
        Commands::RemountRo { mount_point } => {
            mounter
                .remount_as_readonly(&mount_point)
                .with_context(|| format!("remounting {mount_point} read-only"))?;
            log::info!("{} remounted read-only", mount_point);
        }
        Commands::SwapOn { partition } => {
            mounter
                .swap_on(&partition)
                .with_context(|| format!("enabling swap on {partition}"))?;
            log::info!("swap enabled on {}", partition);
        }
        Commands::IsMounted { target } => {
            writeln!(out, "{}", mounter.is_mounted(&target)?)?;
        }
        Commands::IsMountPoint { path } => {
            writeln!(out, "{}", mounter.is_mount_point(&path)?)?;
        }
        Commands::FindDevice { mount_point } => {
            // Nothing mounted is an answer, not a failure: print nothing.
            match mounter.find_device_for_mount_point(&mount_point)? {
                Some(device) => writeln!(out, "{device}")?,
                None => log::info!("nothing is mounted at {}", mount_point),
            }
        }
    }
    Ok(())
}
