use mockall::predicate::eq;
use pnet::util::MacAddr;

use crate::{error::LanProbeError, scanners::resolver::MockResolver};

use super::*;

#[test]
fn reports_up_with_resolved_mac() {
    let target = Ipv4Addr::new(192, 168, 0, 12);
    let mac = MacAddr::new(0x00, 0x1b, 0x44, 0x11, 0x3a, 0xb7);

    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .with(eq(target))
        .times(1)
        .returning(move |_| Ok(mac));

    let mut prober = ArpProber::new(Arc::new(resolver));

    assert_eq!(
        prober.probe(0, target),
        ProbeOutcome::Up {
            ip: target,
            mac: Some(mac),
        }
    );
}

#[test]
fn reports_down_on_any_resolution_failure() {
    let target = Ipv4Addr::new(192, 168, 0, 13);

    let mut resolver = MockResolver::new();
    let mut seq = mockall::Sequence::new();
    resolver
        .expect_resolve()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|ip| {
            Err(LanProbeError::Resolve {
                ip,
                error: "timed out".to_string(),
            })
        });
    resolver
        .expect_resolve()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(LanProbeError::Wire("link down".to_string())));

    let mut prober = ArpProber::new(Arc::new(resolver));

    assert_eq!(prober.probe(0, target), ProbeOutcome::Down);
    assert_eq!(prober.probe(1, target), ProbeOutcome::Down);
}

#[test]
fn factory_shares_resolver_between_workers() {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .times(3)
        .returning(|_| Ok(MacAddr::zero()));

    let factory = ArpProberFactory::new(Arc::new(resolver));

    assert_eq!(factory.method(), ProbeMethod::Arp);

    for worker in 0..3 {
        let mut prober = factory.create(worker).unwrap();
        let outcome = prober.probe(worker, Ipv4Addr::new(10, 0, 0, 1));
        assert!(matches!(outcome, ProbeOutcome::Up { mac: Some(_), .. }));
    }
}
