//! Tests for the JSON-RPC ledger client against a scripted node.

use super::rpc::MockRpcTransport;
use super::*;
use crate::domain::{BatchCode, DrugName, ExpiryDate};
use chrono::NaiveDate;
use rstest::rstest;

const CONTRACT: &str = "0x36cb291A088d9Fa979e4e7AaC46D0477a7450DF5";
const SENDER: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";
const TX_HASH: &str = "0xa1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
const DRUG_ID: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";

fn submission() -> DrugSubmission {
    DrugSubmission::new(
        DrugName::new("Paracetamol").expect("name"),
        BatchCode::new("B100").expect("batch"),
        "Acme",
        ExpiryDate::new(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date")),
    )
    .expect("submission")
}

fn registered_log(address: &str) -> Value {
    json!({
        "address": address,
        "topics": [abi::event_topic(abi::DRUG_REGISTERED_SIGNATURE), DRUG_ID],
        "data": abi::to_hex(&abi::encode_drug_fields("Paracetamol", "B100", "Acme", 1_735_689_600)),
    })
}

fn receipt(status: &str, logs: Vec<Value>) -> Value {
    json!({ "transactionHash": TX_HASH, "status": status, "logs": logs })
}

fn config() -> LedgerClientConfig {
    LedgerClientConfig::new(CONTRACT)
        .with_confirmation_timeout(Duration::from_millis(40))
        .with_poll_interval(Duration::from_millis(5))
}

/// Node that confirms after `pending_polls` empty receipts.
fn scripted_node(pending_polls: usize, confirmed: Value) -> MockRpcTransport {
    let mut transport = MockRpcTransport::new();
    let mut polls = 0_usize;
    transport
        .expect_call()
        .returning(move |method, params| match method {
            "eth_accounts" => Ok(json!([SENDER])),
            "eth_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or_default();
                assert_eq!(tx["from"], SENDER);
                assert_eq!(tx["to"], CONTRACT.to_ascii_lowercase());
                let data = tx["data"].as_str().unwrap_or_default();
                let selector = abi::to_hex(&abi::selector(abi::REGISTER_DRUG_SIGNATURE));
                assert!(data.starts_with(&selector));
                Ok(json!(TX_HASH))
            }
            "eth_getTransactionReceipt" => {
                polls += 1;
                if polls > pending_polls {
                    Ok(confirmed.clone())
                } else {
                    Ok(Value::Null)
                }
            }
            other => panic!("unexpected rpc method {other}"),
        });
    transport
}

async fn connected_client(transport: MockRpcTransport) -> JsonRpcLedgerClient {
    let connection = Arc::new(LedgerConnection::new(Arc::new(transport)));
    connection.initialise().await;
    JsonRpcLedgerClient::new(connection, config()).expect("valid config")
}

#[tokio::test]
async fn submit_waits_for_receipt_and_extracts_drug_id() {
    let node = scripted_node(2, receipt("0x1", vec![registered_log(CONTRACT)]));
    let client = connected_client(node).await;

    let result = client.submit(&submission()).await.expect("confirmed");

    assert_eq!(
        result,
        LedgerReceipt {
            confirmation_id: TX_HASH.to_owned(),
            drug_id: Some(DRUG_ID.to_owned()),
        }
    );
}

#[tokio::test]
async fn receipt_without_event_confirms_without_drug_id() {
    let node = scripted_node(0, receipt("0x1", vec![]));
    let client = connected_client(node).await;

    let result = client.submit(&submission()).await.expect("confirmed");

    assert_eq!(result.confirmation_id, TX_HASH);
    assert_eq!(result.drug_id, None);
}

#[tokio::test]
async fn event_from_another_contract_is_ignored() {
    let other = "0x0000000000000000000000000000000000000001";
    let node = scripted_node(0, receipt("0x1", vec![registered_log(other)]));
    let client = connected_client(node).await;

    let result = client.submit(&submission()).await.expect("confirmed");

    assert_eq!(result.drug_id, None);
}

#[tokio::test]
async fn reverted_receipt_is_rejected() {
    let node = scripted_node(0, receipt("0x0", vec![]));
    let client = connected_client(node).await;

    let err = client.submit(&submission()).await.expect_err("reverted");

    assert!(matches!(err, LedgerError::Rejected { .. }));
}

#[tokio::test]
async fn missing_receipt_times_out() {
    let node = scripted_node(usize::MAX, Value::Null);
    let client = connected_client(node).await;

    let err = client.submit(&submission()).await.expect_err("never mined");

    match err {
        LedgerError::Timeout { waited_ms } => assert!(waited_ms >= 40),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn node_error_on_send_is_rejected() {
    let mut transport = MockRpcTransport::new();
    transport
        .expect_call()
        .returning(|method, _| match method {
            "eth_accounts" => Ok(json!([SENDER])),
            _ => Err(RpcError::Remote {
                code: -32000,
                message: "insufficient funds".to_owned(),
            }),
        });
    let client = connected_client(transport).await;

    let err = client.submit(&submission()).await.expect_err("refused");

    assert_eq!(err, LedgerError::rejected("-32000: insufficient funds"));
}

#[tokio::test]
async fn uninitialised_connection_never_sends() {
    let mut transport = MockRpcTransport::new();
    transport.expect_call().times(0);
    let connection = Arc::new(LedgerConnection::new(Arc::new(transport)));
    let client = JsonRpcLedgerClient::new(connection, config()).expect("valid config");

    let err = client.submit(&submission()).await.expect_err("not connected");

    assert!(matches!(err, LedgerError::Unavailable { .. }));
}

#[tokio::test]
async fn uninitialised_connection_never_fetches() {
    let mut transport = MockRpcTransport::new();
    transport.expect_call().times(0);
    let connection = Arc::new(LedgerConnection::new(Arc::new(transport)));
    let client = JsonRpcLedgerClient::new(connection, config()).expect("valid config");
    let id = DrugIdentifier::parse(TX_HASH).expect("identifier");

    let err = client.fetch(&id).await.expect_err("not connected");

    assert!(matches!(err, LedgerError::Unavailable { .. }));
}

#[tokio::test]
async fn fetch_decodes_the_registration_event() {
    let node = scripted_node(0, receipt("0x1", vec![registered_log(CONTRACT)]));
    let client = connected_client(node).await;
    let id = DrugIdentifier::parse(TX_HASH).expect("identifier");

    let drug = client.fetch(&id).await.expect("found");

    assert_eq!(
        drug,
        LedgerDrug {
            name: "Paracetamol".to_owned(),
            batch: "B100".to_owned(),
            manufacturer_name: "Acme".to_owned(),
            expiry_timestamp: 1_735_689_600,
        }
    );
}

#[rstest]
#[case::no_receipt(Value::Null)]
#[case::no_event(receipt("0x1", vec![]))]
#[tokio::test]
async fn fetch_without_event_is_not_found(#[case] confirmed: Value) {
    let mut transport = MockRpcTransport::new();
    transport
        .expect_call()
        .returning(move |method, _| match method {
            "eth_accounts" => Ok(json!([SENDER])),
            _ => Ok(confirmed.clone()),
        });
    let client = connected_client(transport).await;
    let id = DrugIdentifier::parse(TX_HASH).expect("identifier");

    assert_eq!(client.fetch(&id).await, Err(LedgerError::not_found()));
}

#[tokio::test]
async fn fetch_on_unreachable_node_is_unavailable() {
    let mut transport = MockRpcTransport::new();
    transport.expect_call().times(1).returning(|_, _| {
        Err(RpcError::Transport {
            message: "connection refused".to_owned(),
        })
    });
    let client = connected_client(transport).await;
    let id = DrugIdentifier::parse(TX_HASH).expect("identifier");

    assert!(matches!(
        client.fetch(&id).await,
        Err(LedgerError::Unavailable { .. })
    ));
}

#[rstest]
#[case("")]
#[case("0x1234")]
#[case("36cb291A088d9Fa979e4e7AaC46D0477a7450DF5")]
#[case("0xZZcb291A088d9Fa979e4e7AaC46D0477a7450DF5")]
fn malformed_contract_addresses_are_rejected(#[case] address: &str) {
    let connection = Arc::new(LedgerConnection::new(Arc::new(MockRpcTransport::new())));

    let result = JsonRpcLedgerClient::new(connection, LedgerClientConfig::new(address));

    assert!(matches!(
        result,
        Err(LedgerConfigError::InvalidContractAddress { .. })
    ));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let connection = Arc::new(LedgerConnection::new(Arc::new(MockRpcTransport::new())));

    let result = JsonRpcLedgerClient::new(
        connection,
        LedgerClientConfig::new(CONTRACT).with_poll_interval(Duration::ZERO),
    );

    assert!(matches!(result, Err(LedgerConfigError::ZeroPollInterval)));
}
