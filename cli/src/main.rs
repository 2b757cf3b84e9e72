//! CLI for discovering live hosts on a local IPv4 subnet
//!
//! Every usable address of the selected network is probed with either ICMP
//! echo requests or ARP, and the hosts that answer are reported as they are
//! found. Press Ctrl-C once to stop early and still get a report.
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! sudo lanprobe --help
//!
//! # ICMP sweep of the default interface's network
//! sudo lanprobe
//!
//! # ARP sweep of a specific network, mirrored to a log file
//! sudo lanprobe --method arp --network 192.168.1.0/24 --log-file scan.log
//! ```
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use ipnet::Ipv4Net;
use itertools::Itertools;
use lanprobe_lib::{
    error::LanProbeError,
    network::{self, NetworkInterface},
    scanners::{
        DEFAULT_PROBE_TIMEOUT, HostUp, MAX_WORKERS, ProberFactory, ScanMessage,
        ScanResult, Scanner,
        arp_prober::ArpProberFactory,
        coordinator::{CancelCheck, ScanCoordinator},
        icmp_prober::IcmpProberFactory,
        resolver::WireResolver,
        sink::ChannelSink,
    },
    wire,
};
use log::*;
use serde::Serialize;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
    },
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// Probe method selectable from the command line
enum Method {
    /// ICMP echo request / reply
    Icmp,
    /// Link-layer address resolution
    Arp,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for discovering live hosts on a local IPv4 subnet
struct Args {
    /// Probe method used to discover hosts
    #[arg(long, value_enum, default_value_t = Method::Icmp)]
    method: Method,

    /// Network to scan in CIDR notation, defaults to the network of the
    /// selected interface
    #[arg(long)]
    network: Option<Ipv4Net>,

    /// Choose a specific network interface for the scan
    #[arg(short, long)]
    interface: Option<String>,

    /// How long to wait for each reply in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    /// Maximum number of concurrent probe workers
    #[arg(long, default_value_t = MAX_WORKERS)]
    workers: usize,

    /// Append every result line to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output final report in json instead of table text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only print final output nothing else
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Prints debug logs including those from lanprobe-lib
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Debug, Serialize)]
/// Final report printed with --json
struct Report<'a> {
    hosts: &'a [HostUp],
    responded_count: usize,
    aborted_by_user: bool,
    elapsed_ms: u128,
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
fn print_args(args: &Args, interface: &NetworkInterface) {
    info!("configuration:");
    info!("method:     {:?}", args.method);
    info!("network:    {}", args.network.unwrap_or(interface.cidr));
    info!(
        "interface:  {}",
        args.interface.as_deref().unwrap_or(&interface.name)
    );
    info!("user_ip:    {}", interface.ipv4);
    info!("timeout_ms: {}", args.timeout_ms);
    info!("workers:    {}", args.workers);
    info!(
        "log_file:   {}",
        args.log_file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );
    info!("json:       {}", args.json);
    info!("quiet:      {}", args.quiet);
}

#[doc(hidden)]
fn open_log(path: &Path) -> Option<Box<dyn Write + Send>> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(Box::new(file)),
        Err(e) => {
            warn!(
                "failed to open log file {}, continuing without it: {}",
                path.display(),
                e
            );
            None
        }
    }
}

#[doc(hidden)]
fn create_sink(
    args: &Args,
    notifier: mpsc::Sender<ScanMessage>,
) -> Arc<ChannelSink> {
    let log = args.log_file.as_deref().and_then(open_log);

    match log {
        Some(log) => Arc::new(ChannelSink::with_log(notifier, log)),
        None => Arc::new(ChannelSink::new(notifier)),
    }
}

#[doc(hidden)]
fn create_prober_factory(
    args: &Args,
    interface: &Arc<NetworkInterface>,
) -> Result<Arc<dyn ProberFactory>> {
    let timeout = Duration::from_millis(args.timeout_ms);

    match args.method {
        Method::Icmp => Ok(Arc::new(IcmpProberFactory::new(timeout))),
        Method::Arp => {
            let wire = wire::default(interface)?;
            let resolver =
                WireResolver::start(Arc::clone(interface), wire, timeout)?;
            Ok(Arc::new(ArpProberFactory::new(Arc::new(resolver))))
        }
    }
}

#[doc(hidden)]
fn intercept_ctrl_c() -> Result<CancelCheck> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    ctrlc::set_handler(move || {
        // a second ctrl-c exits without waiting for in-flight probes
        if flag.swap(true, Ordering::SeqCst) {
            process::exit(1);
        }
        println!("captured ctrl-c! finishing in-flight probes...");
    })
    .map_err(|err| eyre!("failed to set ctrl-c handler: {}", err))?;

    Ok(Arc::new(move || cancelled.load(Ordering::SeqCst)))
}

#[doc(hidden)]
fn process_scan(
    scanner: &dyn Scanner,
    rx: Receiver<ScanMessage>,
) -> Result<(ScanResult, Vec<HostUp>)> {
    let mut hosts: Vec<HostUp> = Vec::new();

    info!("starting scan...");

    let handle = scanner.scan()?;

    loop {
        let msg = rx.recv()?;

        match msg {
            ScanMessage::Done => {
                debug!("scanning complete");
                break;
            }
            ScanMessage::Info(m) => {
                debug!("probing {}", m.ip);
            }
            ScanMessage::HostUp(host) => {
                info!("{}", host);
                hosts.push(host);
            }
            ScanMessage::Aborted => {
                warn!("Scan aborted by user.");
            }
            // already logged by the library
            ScanMessage::SendFailed { .. }
            | ScanMessage::WorkerFailed { .. } => {}
        }
    }

    let result = handle.join().map_err(LanProbeError::from)??;

    let hosts = hosts.into_iter().sorted_by_key(|h| h.ip).collect();

    Ok((result, hosts))
}

#[doc(hidden)]
fn print_report(
    args: &Args,
    result: &ScanResult,
    hosts: &[HostUp],
    elapsed: Duration,
) -> Result<()> {
    if args.json {
        let report = Report {
            hosts,
            responded_count: result.responded_count,
            aborted_by_user: result.aborted_by_user,
            elapsed_ms: elapsed.as_millis(),
        };
        let j: String = serde_json::to_string(&report)?;
        println!("{}", j);
        return Ok(());
    }

    println!("Scan complete. Hosts responding: {}", result.responded_count);

    if !hosts.is_empty() {
        let mut table = prettytable::Table::new();

        table.add_row(prettytable::row!["IP", "MAC", "METHOD"]);

        for h in hosts {
            let mac = h.mac.map(|m| m.to_string()).unwrap_or_default();
            table.add_row(prettytable::row![h.ip, mac, h.method]);
        }

        table.printstd();
    }

    let rounded = Duration::from_millis(elapsed.as_millis() as u64);
    info!("elapsed: {}", humantime::format_duration(rounded));

    Ok(())
}

#[doc(hidden)]
#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[doc(hidden)]
#[cfg(windows)]
fn is_root() -> bool {
    // raw socket operations require admin privileges
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

    let mut args = Args::parse();

    initialize_logger(&args)?;

    if !is_root() {
        return Err(eyre!("permission denied: must run with root privileges"));
    }

    let interface = match &args.interface {
        Some(name) => network::get_interface(name)
            .map_err(|e| eyre!("Could not find network interface: {}", e))?,
        None => network::get_default_interface().map_err(|e| {
            eyre!("Could not detect default network interface: {}", e)
        })?,
    };

    let interface = Arc::new(interface);

    args.interface = Some(interface.name.clone());

    let target = *args.network.get_or_insert(interface.cidr);

    print_args(&args, &interface);

    let prober_factory = create_prober_factory(&args, &interface)?;

    let (tx, rx) = mpsc::channel::<ScanMessage>();

    let scanner = ScanCoordinator::builder()
        .network(target.network())
        .netmask(target.netmask())
        .prober_factory(prober_factory)
        .sink(create_sink(&args, tx))
        .cancel_check(intercept_ctrl_c()?)
        .max_workers(args.workers)
        .build()?;

    let started = Instant::now();

    let (result, hosts) = process_scan(&scanner, rx)?;

    print_report(&args, &result, &hosts, started.elapsed())?;

    Ok(())
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
