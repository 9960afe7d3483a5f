//! Programmable fake remote services for integration tests.
//!
//! One axum router on an ephemeral port answers the hub, Neynar, Warpcast
//! and Relay paths the agent uses, plus a JSON-RPC chain at `/rpc`. Every handler bumps a counter in
//! [`FakeState`] so tests can assert how often each endpoint was hit.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use prost::Message as _;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use farcaster_agent::farcaster::message::{hash_hex, HubMessage};

pub const WARPCAST_KEY: &str = "good-key";

/// Chain id served by `/rpc` (Base).
pub const FAKE_CHAIN_ID: u64 = 8453;
/// Hash `eth_sendRawTransaction` answers with.
pub const FAKE_TX_HASH: &str = "0x9f2c7ad8ef1d8d2a1e5b7f3c4a6b8d0e2f4a6c8e0b2d4f6a8c0e2b4d6f8a0c2e";
pub const FAKE_BLOCK: u64 = 12;
pub const FAKE_REQUEST_ID: &str = "0xreq";

#[derive(Default)]
pub struct FakeState {
    pub submit_calls: AtomicU32,
    pub lookup_calls: AtomicU32,
    pub channel_calls: AtomicU32,
    pub dm_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub quote_calls: AtomicU32,

    /// Cast hash → envelope bytes. A resubmitted hash is stored once.
    pub casts: Mutex<HashMap<String, Vec<u8>>>,
    /// Idempotency key → request body. Duplicate keys are collapsed.
    pub direct_casts: Mutex<HashMap<String, Value>>,
    pub channels: Mutex<HashMap<String, Value>>,
    pub last_api_key: Mutex<Option<String>>,

    /// When false, `castById` answers 404 even for stored casts.
    pub visible: AtomicBool,
    /// Non-zero makes `submitMessage` reject with this status.
    pub reject_status: AtomicU16,
    pub intent_status: Mutex<String>,

    /// Body and status `POST /quote` answers with.
    pub quote: Mutex<(u16, Value)>,
    pub last_quote_request: Mutex<Option<Value>>,

    pub rpc_calls: AtomicU32,
    pub receipt_calls: AtomicU32,
    pub raw_transactions: Mutex<Vec<String>>,
    pub balance_wei: AtomicU64,
    /// When false, receipts stay `null`.
    pub mined: AtomicBool,
    pub reverted: AtomicBool,
    /// Receipt queries still to answer with a JSON-RPC error.
    pub receipt_failures: AtomicU32,
}

impl FakeState {
    pub fn submits(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn stored_casts(&self) -> usize {
        self.casts.lock().unwrap().len()
    }

    pub fn add_channel(&self, id: &str, parent_url: &str) {
        self.channels.lock().unwrap().insert(
            id.to_string(),
            json!({ "id": id, "name": format!("Channel {}", id), "parent_url": parent_url, "follower_count": 10 }),
        );
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn reject_with(&self, status: u16) {
        self.reject_status.store(status, Ordering::SeqCst);
    }

    pub fn set_quote(&self, status: u16, body: Value) {
        *self.quote.lock().unwrap() = (status, body);
    }

    pub fn set_intent_status(&self, status: &str) {
        *self.intent_status.lock().unwrap() = status.to_string();
    }

    pub fn quotes(&self) -> u32 {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> usize {
        self.raw_transactions.lock().unwrap().len()
    }
}

/// A quote for 0.0006 ETH from Base to Optimism.
pub fn quote_body() -> Value {
    json!({
        "steps": [{
            "id": "deposit",
            "requestId": FAKE_REQUEST_ID,
            "items": [{
                "status": "incomplete",
                "data": {
                    "to": "0xa5f565650890fba1824ee0f21ebbbf660a179934",
                    "data": "0x58109c",
                    "value": "600000000000000",
                    "maxFeePerGas": "1000000",
                    "maxPriorityFeePerGas": "1000",
                    "chainId": FAKE_CHAIN_ID
                }
            }]
        }],
        "details": {
            "currencyIn": { "amount": "600000000000000" },
            "currencyOut": { "amount": "590000000000000" }
        },
        "fees": { "relayer": { "amountFormatted": "0.00001" } }
    })
}

pub struct FakeServer {
    pub addr: SocketAddr,
    pub state: Arc<FakeState>,
}

impl FakeServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Serve `router` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

pub async fn start_fake_services() -> FakeServer {
    let state = Arc::new(FakeState {
        intent_status: Mutex::new("pending".to_string()),
        quote: Mutex::new((200, quote_body())),
        balance_wei: AtomicU64::new(1_000_000_000_000_000_000),
        mined: AtomicBool::new(true),
        ..FakeState::default()
    });

    let router = Router::new()
        .route("/v1/submitMessage", post(submit_message))
        .route("/v1/castById", get(cast_by_id))
        .route("/v2/farcaster/channel", get(channel))
        .route("/v2/ext-send-direct-cast", put(send_direct_cast))
        .route("/v2/direct-cast-inbox", get(inbox))
        .route("/v2/direct-cast-conversation", get(conversation))
        .route("/intents/status", get(intent_status))
        .route("/quote", post(quote))
        .route("/rpc", post(rpc))
        .with_state(state.clone());

    FakeServer {
        addr: spawn(router).await,
        state,
    }
}

type Reply = (StatusCode, Json<Value>);

async fn submit_message(State(state): State<Arc<FakeState>>, headers: HeaderMap, body: Bytes) -> Reply {
    state.submit_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_api_key.lock().unwrap() = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let reject = state.reject_status.load(Ordering::SeqCst);
    if reject != 0 {
        let status = StatusCode::from_u16(reject).unwrap_or(StatusCode::UNAUTHORIZED);
        return (status, Json(json!({ "errCode": "unauthorized", "message": "invalid api key" })));
    }

    let message = match HubMessage::decode(body.as_ref()) {
        Ok(message) => message,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({ "message": e.to_string() }))),
    };
    let hash = hash_hex(&message.hash);
    state
        .casts
        .lock()
        .unwrap()
        .entry(hash.clone())
        .or_insert_with(|| body.to_vec());
    (StatusCode::OK, Json(json!({ "hash": hash, "hashScheme": "HASH_SCHEME_BLAKE3" })))
}

async fn cast_by_id(State(state): State<Arc<FakeState>>, Query(query): Query<HashMap<String, String>>) -> Reply {
    state.lookup_calls.fetch_add(1, Ordering::SeqCst);
    let hash = query.get("hash").cloned().unwrap_or_default();
    let known = state.casts.lock().unwrap().contains_key(&hash);
    if known && state.visible.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({ "hash": hash })))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "errCode": "not_found" })))
    }
}

async fn channel(State(state): State<Arc<FakeState>>, Query(query): Query<HashMap<String, String>>) -> Reply {
    state.channel_calls.fetch_add(1, Ordering::SeqCst);
    let id = query.get("id").cloned().unwrap_or_default();
    match state.channels.lock().unwrap().get(&id) {
        Some(channel) => (StatusCode::OK, Json(json!({ "channel": channel }))),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Channel not found" }))),
    }
}

async fn send_direct_cast(State(state): State<Arc<FakeState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    state.dm_calls.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", WARPCAST_KEY);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errors": [{ "message": "Unauthorized" }] })),
        );
    }

    let key = body["idempotencyKey"].as_str().unwrap_or_default().to_string();
    state.direct_casts.lock().unwrap().entry(key).or_insert(body);
    (StatusCode::OK, Json(json!({ "result": { "success": true } })))
}

async fn inbox() -> Reply {
    (
        StatusCode::OK,
        Json(json!({
            "result": {
                "conversations": [{
                    "conversationId": "123-456",
                    "participants": [{ "fid": 123, "username": "alice" }, { "fid": 456 }],
                    "lastMessage": { "message": "see you tomorrow", "senderFid": 123, "timestamp": 1_700_000_000_000i64 },
                    "unreadCount": 2
                }]
            },
            "next": { "cursor": "page-2" }
        })),
    )
}

async fn conversation(Query(query): Query<HashMap<String, String>>) -> Reply {
    let id = query.get("conversationId").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "messages": [
                { "text": format!("hello from {}", id), "author": { "fid": 123, "username": "alice" } },
                { "message": "legacy body", "senderFid": 456 }
            ]
        })),
    )
}

async fn intent_status(State(state): State<Arc<FakeState>>, Query(query): Query<HashMap<String, String>>) -> Reply {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    let status = state.intent_status.lock().unwrap().clone();
    (
        StatusCode::OK,
        Json(json!({ "status": status, "requestId": query.get("requestId") })),
    )
}

async fn quote(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Reply {
    state.quote_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_quote_request.lock().unwrap() = Some(body);
    let (status, body) = state.quote.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap_or(StatusCode::OK), Json(body))
}

fn hex_quantity(n: u64) -> String {
    format!("0x{:x}", n)
}

/// Single or batched JSON-RPC requests.
async fn rpc(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Json<Value> {
    match body {
        Value::Array(calls) => Json(Value::Array(calls.iter().map(|call| answer(&state, call)).collect())),
        call => Json(answer(&state, &call)),
    }
}

fn answer(state: &FakeState, call: &Value) -> Value {
    state.rpc_calls.fetch_add(1, Ordering::SeqCst);
    let id = call["id"].clone();
    let result = match call["method"].as_str().unwrap_or_default() {
        "eth_chainId" => json!(hex_quantity(FAKE_CHAIN_ID)),
        "eth_getBalance" => json!(hex_quantity(state.balance_wei.load(Ordering::SeqCst))),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_blockNumber" => json!(hex_quantity(FAKE_BLOCK)),
        "eth_gasPrice" | "eth_maxPriorityFeePerGas" => json!("0x3b9aca00"),
        "eth_estimateGas" => json!("0x186a0"),
        "eth_sendRawTransaction" => {
            let raw = call["params"][0].as_str().unwrap_or_default().to_string();
            state.raw_transactions.lock().unwrap().push(raw);
            json!(FAKE_TX_HASH)
        }
        "eth_getTransactionReceipt" => {
            state.receipt_calls.fetch_add(1, Ordering::SeqCst);
            let failing = state
                .receipt_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return json!({ "jsonrpc": "2.0", "id": id, "error": { "code": -32000, "message": "header not found" } });
            }
            if state.mined.load(Ordering::SeqCst) {
                receipt(call["params"][0].clone(), !state.reverted.load(Ordering::SeqCst))
            } else {
                Value::Null
            }
        }
        other => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {} not found", other) }
            })
        }
    };
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn receipt(tx_hash: Value, success: bool) -> Value {
    let status = if success { "0x1" } else { "0x0" };
    json!({
        "type": "0x2",
        "status": status,
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": hex_quantity(FAKE_BLOCK),
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": "0xa5f565650890fba1824ee0f21ebbbf660a179934",
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512))
    })
}
