//! File changes reach live state through the watches.

#![cfg(feature = "file-watch")]

mod common;

use common::{ConfigDir, RecordingDevice, init_tracing, peer_file};
use hotswap_reconcile::prelude::*;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const BASE: &str = "Hostname = \"gateway-1\"\nLogLevel = 3\n";

async fn started(config: &ConfigDir) -> ReconciliationCoordinator {
    let coordinator = ReconciliationCoordinator::builder()
        .with_config_dir(config.dir.path())
        .with_device(RecordingDevice::new())
        .with_watch_debounce(Duration::from_millis(100))
        .build()
        .unwrap();
    coordinator.start().await.unwrap();
    coordinator
}

#[tokio::test]
async fn test_file_write_reloads_domain() {
    init_tracing();
    let config = ConfigDir::new();
    config.write(Domain::Base, BASE);
    config.write(Domain::AgentPeers, &peer_file("Agents", &["A"]));
    let coordinator = started(&config).await;
    assert_eq!(coordinator.peers(PeerCategory::Agent).len(), 1);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = coordinator.subscribe(move |domain| {
        let _ = tx.send(domain);
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    config.write(Domain::AgentPeers, &peer_file("Agents", &["A", "B", "C"]));

    let domain = timeout(Duration::from_secs(3), rx.recv()).await.unwrap();
    assert_eq!(domain, Some(Domain::AgentPeers));
    assert_eq!(coordinator.peers(PeerCategory::Agent).len(), 3);
    assert!(coordinator.peers(PeerCategory::Console).is_empty());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_recreated_file_is_picked_up() {
    let config = ConfigDir::new();
    config.write(Domain::Base, BASE);
    config.write(Domain::SourceIps, "\"1.1.1.1\" = []");
    let coordinator = started(&config).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = coordinator.subscribe(move |domain| {
        if domain == Domain::SourceIps {
            let _ = tx.send(());
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    config.remove(Domain::SourceIps);
    timeout(Duration::from_secs(3), rx.recv()).await.unwrap();
    assert!(coordinator.source_ips().is_empty());

    config.write(Domain::SourceIps, "\"2.2.2.2\" = []\n\"3.3.3.3\" = []");
    timeout(Duration::from_secs(3), async {
        while coordinator.source_ips().len() != 2 {
            rx.recv().await;
        }
    })
    .await
    .unwrap();

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_stop_watching_ignores_later_writes() {
    let config = ConfigDir::new();
    config.write(Domain::Base, BASE);
    let coordinator = started(&config).await;
    coordinator.stop_watching();

    tokio::time::sleep(Duration::from_millis(50)).await;
    config.write(Domain::ConsolePeers, &peer_file("ACs", &["console-1"]));
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(coordinator.peers(PeerCategory::Console).is_empty());
}
