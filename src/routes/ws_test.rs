use futures::{SinkExt, StreamExt};
use replica::document::Stamp;
use replica::message::ClientMessage;
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::*;
use crate::state::test_helpers;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

async fn serve() -> String {
    let state = test_helpers::test_app_state();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, crate::routes::app(state)).await.unwrap();
    });
    format!("ws://{addr}")
}

async fn next_message(client: &mut Client) -> ServerMessage {
    loop {
        let frame = timeout(Duration::from_secs(2), client.next())
            .await
            .expect("socket receive timed out")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = frame {
            return message::decode_server(text.as_str()).unwrap();
        }
    }
}

async fn send(client: &mut Client, request: &ClientMessage) {
    let text = message::encode(request).unwrap();
    client.send(WsMessage::Text(text.into())).await.unwrap();
}

// =============================================================================
// IDENTITY
// =============================================================================

#[test]
fn identity_needs_id_and_name() {
    assert!(user_from_params(&params(&[])).is_none());
    assert!(user_from_params(&params(&[("user_id", "u1")])).is_none());
    assert!(user_from_params(&params(&[("user_id", "u1"), ("name", "")])).is_none());

    let user = user_from_params(&params(&[("user_id", "u1"), ("name", "Ana"), ("avatar", "https://a.test/1.png")]));
    let user = user.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Ana");
    assert_eq!(user.avatar.as_deref(), Some("https://a.test/1.png"));
}

// =============================================================================
// DISPATCH
// =============================================================================

#[tokio::test]
async fn invalid_json_is_answered_with_codec_error() {
    let state = test_helpers::test_app_state();
    let replies = process_inbound_text(&state, "b", 1, "{not json").await;
    assert!(matches!(replies.as_slice(), [ServerMessage::Error { code, .. }] if code == "E_CODEC"));
}

#[tokio::test]
async fn unknown_syscall_is_a_codec_error() {
    let state = test_helpers::test_app_state();
    let replies = process_inbound_text(&state, "b", 1, r#"{"syscall":"board:nuke","data":{}}"#).await;
    assert!(matches!(replies.as_slice(), [ServerMessage::Error { code, .. }] if code == "E_CODEC"));
}

#[tokio::test]
async fn valid_write_has_no_direct_reply() {
    let state = test_helpers::test_app_state();
    let (tx, mut rx) = mpsc::channel(8);
    let (id, _) = services::board::join_board(&state, "b", None, tx).await;

    let request = ClientMessage::StorageSet { key: "k".into(), value: json!({}), stamp: Stamp::new(1, id) };
    let replies = process_inbound_text(&state, "b", id, &message::encode(&request).unwrap()).await;
    assert!(replies.is_empty());
    assert!(matches!(rx.recv().await, Some(ServerMessage::StorageSet { .. })));
}

#[tokio::test]
async fn write_from_unjoined_connection_is_rejected() {
    let state = test_helpers::test_app_state();
    let (tx, _rx) = mpsc::channel(8);
    services::board::join_board(&state, "b", None, tx).await;

    let request = ClientMessage::StorageDelete { key: "k".into(), stamp: Stamp::new(1, 99) };
    let replies = process_inbound_text(&state, "b", 99, &message::encode(&request).unwrap()).await;
    assert!(matches!(replies.as_slice(), [ServerMessage::Error { code, .. }] if code == "E_UNKNOWN_CONNECTION"));
}

// =============================================================================
// END TO END
// =============================================================================

#[tokio::test]
async fn two_clients_converge_over_sockets() {
    let base = serve().await;
    let (mut a, _) = connect_async(format!("{base}/api/ws/rome?user_id=u1&name=Ana")).await.unwrap();
    let ServerMessage::Welcome(welcome_a) = next_message(&mut a).await else {
        panic!("expected welcome");
    };
    assert_eq!(welcome_a.session_id, "board-rome");

    let (mut b, _) = connect_async(format!("{base}/api/ws/rome")).await.unwrap();
    let ServerMessage::Welcome(welcome_b) = next_message(&mut b).await else {
        panic!("expected welcome");
    };
    assert_eq!(welcome_b.others.len(), 1);
    assert_eq!(welcome_b.others[0].user.as_ref().map(|u| u.name.as_str()), Some("Ana"));

    // a hears about b
    assert!(matches!(next_message(&mut a).await, ServerMessage::PresenceUpdate { .. }));

    let stamp = Stamp::new(welcome_a.clock + 1, welcome_a.connection_id);
    let value = json!({"objectId": "k1", "type": "rectangle", "left": 100.0});
    send(&mut a, &ClientMessage::StorageSet { key: "k1".into(), value: value.clone(), stamp }).await;

    for client in [&mut a, &mut b] {
        match next_message(client).await {
            ServerMessage::StorageSet { key, value: got, .. } => {
                assert_eq!(key, "k1");
                assert_eq!(got, value);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    b.close(None).await.unwrap();
    assert_eq!(
        next_message(&mut a).await,
        ServerMessage::PresenceLeft { connection_id: welcome_b.connection_id }
    );
}

#[tokio::test]
async fn healthz_is_ok() {
    let base = serve().await;
    let addr = base.trim_start_matches("ws://");
    let mut stream = TcpStream::connect(addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut stream, b"GET /healthz HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut body = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut body).await.unwrap();
    assert!(body.starts_with("HTTP/1.1 200"));
}
