use std::{
    env,
    sync::{Arc, mpsc},
};

use color_eyre::eyre::{Result, eyre};
use lanprobe_lib::{
    network,
    scanners::{
        DEFAULT_PROBE_TIMEOUT, HostUp, ScanMessage, Scanner,
        coordinator::ScanCoordinator, icmp_prober::IcmpProberFactory,
        sink::ChannelSink,
    },
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

    let interface = network::get_default_interface()?;
    let (tx, rx) = mpsc::channel::<ScanMessage>();

    let factory = IcmpProberFactory::new(DEFAULT_PROBE_TIMEOUT);

    let scanner = ScanCoordinator::builder()
        .network(interface.cidr.network())
        .netmask(interface.cidr.netmask())
        .prober_factory(Arc::new(factory))
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
                println!("{}", host);
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
