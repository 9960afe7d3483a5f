//! End-to-end bridge runs against the fake Relay API and JSON-RPC chain.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use common::{start_fake_services, FakeServer, FAKE_BLOCK, FAKE_CHAIN_ID, FAKE_REQUEST_ID, FAKE_TX_HASH};
use farcaster_agent::blockchain::{BlockchainClient, BlockchainError, Wallet};
use farcaster_agent::bridge::{BridgeError, BridgeOutcome, RelayBridge, RelayClient};
use farcaster_agent::config::{BridgeConfig, ChainEndpoint, TimingConfig};
use farcaster_agent::http::{ApiClient, Auth};
use farcaster_agent::publish::BoundedPoll;
use farcaster_agent::Shutdown;
use serde_json::json;

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OPTIMISM: u64 = 10;

fn amount() -> U256 {
    U256::from(600_000_000_000_000u64)
}

fn tx_hash() -> TxHash {
    FAKE_TX_HASH.parse().unwrap()
}

fn bridge(server: &FakeServer, receipt_timeout_secs: u64) -> RelayBridge {
    let wallet = Wallet::from_private_key(DEV_KEY).unwrap();
    let endpoint = ChainEndpoint {
        chain_id: FAKE_CHAIN_ID,
        rpc_url: format!("{}/rpc", server.url()),
        failover_urls: vec![],
    };
    let chain = BlockchainClient::connect(&endpoint, &wallet, 5).unwrap();
    let relay = RelayClient::new(ApiClient::new(reqwest::Client::new(), "relay", server.url(), Auth::None));
    let config = BridgeConfig {
        receipt_timeout_secs,
        ..BridgeConfig::default()
    };

    RelayBridge::new(relay, chain, wallet.address(), &config, &TimingConfig::default())
        .with_poll(BoundedPoll::new(3, Duration::ZERO))
        .with_receipt_interval(Duration::from_millis(20))
}

#[tokio::test]
async fn test_invalid_requests_make_no_calls() {
    let server = start_fake_services().await;
    let bridge = bridge(&server, 5);
    let mut rx = Shutdown::new().subscribe();

    let err = bridge.bridge(U256::ZERO, OPTIMISM, &mut rx).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRequest(ref m) if m.contains("greater than zero")));

    let err = bridge.bridge(amount(), FAKE_CHAIN_ID, &mut rx).await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRequest(ref m) if m.contains("8453")));
    assert!(err.is_config());

    assert_eq!(server.state.quotes(), 0);
    assert_eq!(server.state.rpc_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_low_balance_stops_before_quote() {
    let server = start_fake_services().await;
    server.state.balance_wei.store(1_000, Ordering::SeqCst);
    let mut rx = Shutdown::new().subscribe();

    let err = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap_err();

    assert!(matches!(err, BridgeError::InsufficientFunds { have, need } if have == U256::from(1_000u64) && need == amount()));
    assert_eq!(server.state.quotes(), 0);
}

#[tokio::test]
async fn test_quote_error_document_sends_nothing() {
    let server = start_fake_services().await;
    server.state.set_quote(400, json!({ "message": "Amount is too low", "errorCode": "AMOUNT_TOO_LOW" }));
    let mut rx = Shutdown::new().subscribe();

    let err = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap_err();

    match err {
        BridgeError::QuoteRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Amount is too low"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(server.state.broadcasts(), 0);
}

#[tokio::test]
async fn test_quote_without_steps_is_rejected() {
    let server = start_fake_services().await;
    server.state.set_quote(200, json!({ "details": {} }));
    let mut rx = Shutdown::new().subscribe();

    let err = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap_err();

    assert!(matches!(err, BridgeError::QuoteRejected { status: 200, .. }));
    assert_eq!(server.state.broadcasts(), 0);
}

#[tokio::test]
async fn test_bridge_completes() {
    let server = start_fake_services().await;
    server.state.set_intent_status("success");
    let mut rx = Shutdown::new().subscribe();

    let outcome = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap();

    assert_eq!(
        outcome,
        BridgeOutcome::Completed {
            tx_hash: tx_hash(),
            request_id: FAKE_REQUEST_ID.to_string(),
            block_number: Some(FAKE_BLOCK),
        }
    );

    let request = server.state.last_quote_request.lock().unwrap().clone().unwrap();
    assert_eq!(request["originChainId"], FAKE_CHAIN_ID);
    assert_eq!(request["destinationChainId"], OPTIMISM);
    assert_eq!(request["amount"], "600000000000000");
    assert_eq!(request["tradeType"], "EXACT_INPUT");

    let raw = server.state.raw_transactions.lock().unwrap().clone();
    assert_eq!(raw.len(), 1);
    assert!(raw[0].starts_with("0x02"), "expected an EIP-1559 envelope, got {}", raw[0]);
    assert_eq!(server.state.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_receipt_lookup_errors_are_retried() {
    let server = start_fake_services().await;
    server.state.receipt_failures.store(2, Ordering::SeqCst);
    server.state.set_intent_status("success");
    let mut rx = Shutdown::new().subscribe();

    let outcome = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap();

    assert!(matches!(outcome, BridgeOutcome::Completed { .. }));
    assert!(server.state.receipt_calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_missing_receipt_leaves_bridge_pending() {
    let server = start_fake_services().await;
    server.state.mined.store(false, Ordering::SeqCst);
    let mut rx = Shutdown::new().subscribe();

    let outcome = bridge(&server, 1).bridge(amount(), OPTIMISM, &mut rx).await.unwrap();

    assert_eq!(
        outcome,
        BridgeOutcome::Pending {
            tx_hash: tx_hash(),
            request_id: FAKE_REQUEST_ID.to_string(),
            last_status: Some("no receipt after 1s".to_string()),
        }
    );
    assert_eq!(server.state.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reverted_deposit_keeps_identifiers() {
    let server = start_fake_services().await;
    server.state.reverted.store(true, Ordering::SeqCst);
    let mut rx = Shutdown::new().subscribe();

    let err = bridge(&server, 5).bridge(amount(), OPTIMISM, &mut rx).await.unwrap_err();

    match err {
        BridgeError::Unconfirmed { tx_hash: hash, request_id, source } => {
            assert_eq!(hash, tx_hash());
            assert_eq!(request_id, FAKE_REQUEST_ID);
            assert!(matches!(source, BlockchainError::Reverted(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(server.state.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_interrupt_during_receipt_wait() {
    let server = start_fake_services().await;
    server.state.mined.store(false, Ordering::SeqCst);
    let shutdown = Shutdown::new();
    let mut rx = shutdown.subscribe();

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.trigger();
    });

    let bridge = bridge(&server, 120);
    let outcome = tokio::time::timeout(Duration::from_secs(5), bridge.bridge(amount(), OPTIMISM, &mut rx))
        .await
        .expect("receipt wait ignored the shutdown")
        .unwrap();

    assert_eq!(
        outcome,
        BridgeOutcome::Interrupted {
            tx_hash: tx_hash(),
            request_id: FAKE_REQUEST_ID.to_string(),
        }
    );
    assert_eq!(server.state.broadcasts(), 1);
}
