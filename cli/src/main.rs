//! CLI for live packet capture and dissection
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! r-wirecli --help
//!
//! # list capture devices
//! r-wirecli --list
//!
//! # capture on the first device for 10 seconds
//! sudo r-wirecli
//!
//! # capture and keep only TCP traffic from one host
//! sudo r-wirecli --filter "Protocol=tcp & Source=192.168.1.10"
//! ```
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use core::time;
use log::*;
use r_wirelib::{
    capture::{Device, DeviceConfig, wire},
    filter,
    packet::DecodedPacket,
    session::{CaptureSession, SessionEvent},
    store::PacketStore,
};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, mpsc},
    thread,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for live packet capture and dissection
struct Args {
    /// List capture devices and exit
    #[arg(short, long, default_value_t = false)]
    list: bool,

    /// Index of the capture device to open
    #[arg(short, long, default_value_t = 0)]
    device: usize,

    /// How long to capture, in seconds
    #[arg(short, long, default_value_t = 10)]
    seconds: u64,

    /// Display filter of &-joined FieldName=value clauses
    #[arg(short, long)]
    filter: Option<String>,

    /// Put the capture device into promiscuous mode
    #[arg(long, default_value_t = false)]
    promiscuous: bool,

    /// Write the captured session to a capture file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print a previously saved capture file instead of capturing
    #[arg(long)]
    load: Option<PathBuf>,

    /// Output packets as json instead of table text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only print final output nothing else
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Prints debug logs including those from r-wirelib
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[doc(hidden)]
fn initialize_logger(args: &Args) -> Result<()> {
    let filter = if args.quiet {
        simplelog::LevelFilter::Error
    } else if args.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    simplelog::TermLogger::init(
        filter,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[doc(hidden)]
fn print_args(args: &Args, devices: &[Arc<dyn Device>]) {
    info!("configuration:");
    info!("device:      {}", args.device);
    info!("devices:     {}", devices.len());
    info!("seconds:     {}", args.seconds);
    info!("filter:      {}", args.filter.as_deref().unwrap_or(""));
    info!("promiscuous: {}", args.promiscuous);
    info!("json:        {}", args.json);
    info!("quiet:       {}", args.quiet);
}

#[doc(hidden)]
fn compile_filter(args: &Args) -> Result<filter::Predicate> {
    match &args.filter {
        Some(expression) => filter::compile(expression)
            .map_err(|e| eyre!("invalid filter: {}", e)),
        None => Ok(filter::Predicate::default()),
    }
}

#[doc(hidden)]
fn print_devices(devices: &[Arc<dyn Device>]) {
    let mut device_table = prettytable::Table::new();

    device_table.add_row(prettytable::row!["INDEX", "NAME", "DESCRIPTION", "LINK"]);

    for (i, device) in devices.iter().enumerate() {
        device_table.add_row(prettytable::row![
            i,
            device.name(),
            device.description(),
            device.link_type()
        ]);
    }

    device_table.printstd();
}

#[doc(hidden)]
fn print_packets(args: &Args, packets: &[DecodedPacket]) -> Result<()> {
    if args.json {
        let j: String = serde_json::to_string(&packets)?;
        println!("{}", j);
    } else {
        let mut packet_table = prettytable::Table::new();

        packet_table.add_row(prettytable::row![
            "NO.",
            "TIME",
            "PROTOCOL",
            "SOURCE",
            "DESTINATION",
            "LENGTH",
            "INFO",
        ]);

        for p in packets.iter() {
            packet_table.add_row(prettytable::row![
                p.sequence,
                format!("{:.6}", p.arrival_offset),
                p.protocol,
                p.source,
                p.destination,
                p.wire_length,
                p.info
            ]);
        }

        packet_table.printstd();
    }

    Ok(())
}

#[doc(hidden)]
fn print_loaded(args: &Args, path: &PathBuf) -> Result<()> {
    let predicate = compile_filter(args)?;

    let mut file = fs::File::open(path)?;
    let store = PacketStore::import(&mut file)?;

    info!("loaded {} packets from {}", store.len(), path.display());

    print_packets(args, &store.filtered(&predicate))
}

#[doc(hidden)]
#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[doc(hidden)]
#[cfg(windows)]
fn is_root() -> bool {
    // On Windows, check if running as Administrator
    // This is a simplified check - raw socket operations require admin privileges
    use std::process::Command;
    Command::new("net")
        .args(["session"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[doc(hidden)]
fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(&args)?;

    if let Some(path) = &args.load {
        return print_loaded(&args, path);
    }

    let predicate = compile_filter(&args)?;

    let devices = wire::devices();

    if args.list {
        print_devices(&devices);
        return Ok(());
    }

    if !is_root() {
        return Err(eyre!("permission denied: must run with root privileges"));
    }

    if devices.is_empty() {
        return Err(eyre!("no capture devices found"));
    }

    print_args(&args, &devices);

    let (tx, rx) = mpsc::channel::<SessionEvent>();

    let mut session = CaptureSession::builder()
        .devices(devices)
        .notifier(tx)
        .build()?;

    session.start(
        args.device,
        Some(DeviceConfig {
            promiscuous: args.promiscuous,
            ..DeviceConfig::default()
        }),
    )?;

    let event = rx.recv()?;
    debug!("session event: {:?}", event);

    info!("capturing for {} seconds...", args.seconds);

    thread::sleep(time::Duration::from_secs(args.seconds));

    session.stop()?;

    let store = session.store();
    let store = store
        .lock()
        .map_err(|_| eyre!("failed to lock packet store"))?;

    print_packets(&args, &store.filtered(&predicate))?;

    info!(
        "captured {} packets, dropped {}",
        store.len(),
        session.dropped_frames()
    );

    if let Some(path) = &args.save {
        let mut file = fs::File::create(path)?;
        store.export(&mut file)?;
        info!("saved capture to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
