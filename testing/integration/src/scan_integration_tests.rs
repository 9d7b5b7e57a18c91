use crate::common::{assert_complete_and_ordered, busy_params, expected_blocks};
use shardscan_ledger_core::api::TrustedSource;
use shardscan_scanner::{MemorySink, ScanConfig, ScanError, ScanState, Scanner};
use shardscan_simulator::{ShardchainSimulator, SimulatorParams};
use std::{collections::HashSet, sync::Arc, time::Duration};

#[tokio::test]
async fn test_scan_covers_every_shard_block() {
    for seed in [1, 2, 3, 17, 2024] {
        // Arrange
        let simulator = Arc::new(ShardchainSimulator::new(busy_params(seed)).unwrap());
        let sink = MemorySink::new();
        let mut scanner = Scanner::new(simulator.clone(), sink.clone(), ScanConfig::default().with_max_master_blocks(40));

        // Act
        let report = scanner.run(triggered::trigger().1).await.unwrap();

        // Assert
        assert_eq!(report.master_blocks, 40);
        let last = report.last_master.unwrap().seqno;
        assert_eq!(last, 41);
        let expected = expected_blocks(&simulator, 1, last);
        assert_eq!(report.shard_blocks as usize, expected.len());
        assert_complete_and_ordered(&simulator, &sink.records(), &expected);

        let masters: Vec<u32> = sink.records().iter().filter(|r| r.is_masterchain()).map(|r| r.seqno).collect();
        assert_eq!(masters, (1..=41).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_scan_multiple_workchains() {
    let params = SimulatorParams { workchains: vec![0, 1, 7], ..busy_params(5) };
    let simulator = Arc::new(ShardchainSimulator::new(params).unwrap());
    let sink = MemorySink::new();
    let config = ScanConfig::default().without_master_records().with_max_master_blocks(25);
    let mut scanner = Scanner::new(simulator.clone(), sink.clone(), config);

    let report = scanner.run(triggered::trigger().1).await.unwrap();

    let expected = expected_blocks(&simulator, 1, report.last_master.unwrap().seqno);
    assert_complete_and_ordered(&simulator, &sink.records(), &expected);
    let workchains: HashSet<i32> = sink.records().iter().map(|r| r.workchain).collect();
    assert_eq!(workchains, HashSet::from([0, 1, 7]));
}

#[tokio::test]
async fn test_scan_resumes_after_late_start() {
    // The scanner only starts once the ledger already has history
    let simulator = Arc::new(ShardchainSimulator::new(busy_params(8)).unwrap());
    simulator.advance(30);
    let sink = MemorySink::new();
    let mut scanner = Scanner::new(simulator.clone(), sink.clone(), ScanConfig::default().with_max_master_blocks(20));

    let report = scanner.run(triggered::trigger().1).await.unwrap();

    assert_eq!(report.last_master.unwrap().seqno, 51);
    let expected = expected_blocks(&simulator, 31, 51);
    assert_complete_and_ordered(&simulator, &sink.records(), &expected);
}

#[tokio::test]
async fn test_scan_cancellation_keeps_frontier_consistent() {
    let params = SimulatorParams { interval: Duration::from_millis(10), ..busy_params(12) };
    let simulator = Arc::new(ShardchainSimulator::new(params).unwrap());
    let sink = MemorySink::new();
    let mut scanner = Scanner::new(simulator.clone(), sink.clone(), ScanConfig::default());
    let (trigger, listener) = triggered::trigger();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.trigger();
    });

    let report = tokio::time::timeout(Duration::from_secs(10), scanner.run(listener)).await.unwrap().unwrap();
    canceller.await.unwrap();

    assert_eq!(scanner.state(), ScanState::Stopped);
    let last = scanner.last_master().unwrap().seqno;
    assert_eq!(report.master_blocks, u64::from(last - 1));
    // Everything up to the last processed master block is recorded, nothing beyond it
    let expected = expected_blocks(&simulator, 1, last);
    assert_complete_and_ordered(&simulator, &sink.records(), &expected);
    for (shard, seqno) in scanner.frontier().iter() {
        assert!(expected.values().any(|block| block.shard == *shard && block.seqno == *seqno) || *seqno == 1);
    }
}

#[tokio::test]
async fn test_lost_source_is_fatal() {
    let simulator = Arc::new(ShardchainSimulator::new(busy_params(4)).unwrap());
    let sink = MemorySink::new();
    let mut scanner = Scanner::new(simulator.clone(), sink.clone(), ScanConfig::default().with_max_master_blocks(10));
    scanner.initialize().await.unwrap();
    let master = simulator.wait_master_block(2).await.unwrap();
    scanner.process_master(&master).unwrap();
    let frontier = scanner.frontier().clone();
    let written = sink.len();

    simulator.set_offline(true);
    let result = scanner.run(triggered::trigger().1).await;

    assert!(matches!(result, Err(ScanError::SourceUnavailable(_))));
    assert_eq!(scanner.state(), ScanState::Fatal);
    assert_eq!(scanner.frontier(), &frontier);
    assert_eq!(sink.len(), written);
}

#[tokio::test]
async fn test_rescan_with_fresh_frontier_is_identical() {
    // Two scanners over the same deterministic ledger write the same blocks in the same order
    let scan = |seed| async move {
        let simulator = Arc::new(ShardchainSimulator::new(busy_params(seed)).unwrap());
        let sink = MemorySink::new();
        let mut scanner = Scanner::new(simulator, sink.clone(), ScanConfig::default().with_max_master_blocks(15));
        scanner.run(triggered::trigger().1).await.unwrap();
        sink.records().into_iter().map(|r| (r.workchain, r.shard, r.seqno, r.hash, r.value)).collect::<Vec<_>>()
    };

    assert_eq!(scan(77).await, scan(77).await);
}
