use std::{
    env,
    sync::{Arc, mpsc},
};

use color_eyre::eyre::{Result, eyre};
use lanprobe_lib::{
    network,
    scanners::{
        DEFAULT_PROBE_TIMEOUT, HostUp, ScanMessage, Scanner,
        arp_prober::ArpProberFactory, coordinator::ScanCoordinator,
        resolver::WireResolver, sink::ChannelSink,
    },
    wire,
};

fn is_root() -> bool {
    match env::var("USER") {
        Ok(val) => val == "root",
        Err(_e) => false,
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    if !is_root() {
        return Err(eyre!("permission denied: must run with root privileges"));
    }

    let interface = Arc::new(network::get_default_interface()?);
    let wire = wire::default(&interface)?;
    let resolver = WireResolver::start(
        Arc::clone(&interface),
        wire,
        DEFAULT_PROBE_TIMEOUT,
    )?;
    let (tx, rx) = mpsc::channel::<ScanMessage>();

    let scanner = ScanCoordinator::builder()
        .network(interface.cidr.network())
        .netmask(interface.cidr.netmask())
        .prober_factory(Arc::new(ArpProberFactory::new(Arc::new(resolver))))
        .sink(Arc::new(ChannelSink::new(tx)))
        .build()?;

    let handle = scanner.scan()?;

    let mut results: Vec<HostUp> = Vec::new();

    loop {
        let msg = rx.recv()?;

        match msg {
            ScanMessage::Done => {
                println!("scanning complete");
                break;
            }
            ScanMessage::HostUp(host) => {
                println!("{} [{:?}]", host, host.mac);
                results.push(host);
            }
            ScanMessage::Info(_) => {}
            _ => {
                println!("{:?}", msg)
            }
        }
    }

    let result = handle
        .join()
        .map_err(|_| eyre!("scan thread panicked"))??;

    println!("results: {:?}", results);
    println!("hosts responding: {}", result.responded_count);

    Ok(())
}
