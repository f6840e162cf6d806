use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dockpd_core::{PdDevice, PdFirmware, ProxyConfig, TracingObserver, UsbProxy};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Dock hub PD firmware tool", long_about = None)]
struct Args {
    /// PD controller subtype
    #[arg(long, default_value_t = 0)]
    subtype: u8,

    /// PD port instance
    #[arg(long, default_value_t = 0)]
    instance: u8,

    /// Firmware image to write; omit to only resolve identity and version
    #[arg(long)]
    firmware: Option<String>,

    /// Advisory version string of the firmware image
    #[arg(long)]
    fw_version: Option<String>,

    /// Path to a proxy config TOML (VID/PID, retry timeout)
    #[arg(long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(&args) {
        error!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ProxyConfig::load_from_file(path)
            .with_context(|| format!("loading config {path}"))?,
        None => ProxyConfig::default(),
    };

    let proxy = Arc::new(
        UsbProxy::open_with_ids(config.vid, config.pid).context("opening hub proxy")?,
    );

    let mut pd = PdDevice::new(proxy, args.subtype, args.instance);
    pd.setup().context("device setup")?;

    info!(
        name = pd.name().unwrap_or("?"),
        instance_id = pd.instance_id().unwrap_or("?"),
        version = %pd.version(),
        "PD device ready"
    );

    if let Some(path) = &args.firmware {
        let mut firmware =
            PdFirmware::from_file(path).with_context(|| format!("loading firmware {path}"))?;
        if let Some(version) = &args.fw_version {
            firmware = firmware.with_version(version);
        }

        pd.write_firmware(&firmware, &TracingObserver)
            .context("firmware write")?;

        info!("Firmware written; version refreshes on next enumeration");
    }

    Ok(())
}
