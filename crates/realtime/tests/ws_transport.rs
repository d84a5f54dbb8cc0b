use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        protocol::Message,
    },
};
use webagent_core::{ConnectionConfig, Credential, RealtimeTransport, RemoteAudioTrack, RoomEvent};
use webagent_realtime::WsTransport;

const OPEN_URL: &[u8] = br#"{"type":"navigate","action":"open_url","url":"https://example.com"}"#;

/// Accepts one connection, plays a short scripted session and returns what the
/// client sent.
async fn scripted_server(
    listener: TcpListener,
    handshake: oneshot::Sender<(String, Option<String>)>,
) -> Vec<Value> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_hdr_async(
        stream,
        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let auth = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let _ = handshake.send((req.uri().path().to_string(), auth));
            Ok(resp)
        },
    )
    .await
    .unwrap();

    let mut received = Vec::new();
    let join = ws.next().await.unwrap().unwrap();
    received.push(serde_json::from_str(join.to_text().unwrap()).unwrap());

    for frame in [
        Message::Text(r#"{"type":"joined","room":"web-agent"}"#.into()),
        Message::Binary(OPEN_URL.to_vec().into()),
        Message::Text(r#"{"type":"active_speakers","speakers":["agent"]}"#.into()),
        Message::Text(
            r#"{"type":"track_subscribed","sid":"TR_1","participant":"agent","kind":"audio"}"#
                .into(),
        ),
        Message::Text(r#"{"type":"leave","reason":"room closed"}"#.into()),
    ] {
        ws.send(frame).await.unwrap();
    }

    while let Some(Ok(frame)) = ws.next().await {
        if let Message::Text(text) = frame {
            received.push(serde_json::from_str(&text).unwrap());
        }
    }
    received
}

#[tokio::test]
async fn test_session_negotiates_and_maps_frames_to_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (handshake_tx, handshake_rx) = oneshot::channel();
    let server = tokio::spawn(scripted_server(listener, handshake_tx));

    let transport = WsTransport::new();
    let (mut session, mut events) = transport
        .connect(
            &format!("ws://{addr}"),
            &Credential::new("tok_abc"),
            &ConnectionConfig::default(),
        )
        .await
        .unwrap();

    let (path, auth) = handshake_rx.await.unwrap();
    assert_eq!(path, "/rtc");
    assert_eq!(auth.as_deref(), Some("Bearer tok_abc"));

    assert_eq!(events.recv().await, Some(RoomEvent::Connected));
    match events.recv().await {
        Some(RoomEvent::DataReceived { payload, .. }) => assert_eq!(&payload[..], OPEN_URL),
        other => panic!("Expected DataReceived, got {other:?}"),
    }
    assert_eq!(
        events.recv().await,
        Some(RoomEvent::TrackSubscribed(RemoteAudioTrack {
            sid: "TR_1".into(),
            participant: "agent".into(),
        }))
    );
    assert_eq!(
        events.recv().await,
        Some(RoomEvent::Disconnected {
            reason: Some("room closed".into())
        })
    );
    // The reader stops after a terminal event.
    assert_eq!(events.recv().await, None);

    session.set_microphone_enabled(true).await.unwrap();
    session.disconnect().await.unwrap();

    let received = server.await.unwrap();
    let types: Vec<&str> = received
        .iter()
        .map(|frame| frame["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["join", "publish_track", "unpublish_track", "leave"]);

    let join = &received[0]["options"];
    assert_eq!(join["audio"], false);
    assert_eq!(join["video"], false);
    assert_eq!(join["dynacast"], true);
    assert_eq!(join["adaptive_stream"], true);
    assert_eq!(join["stop_local_track_on_unpublish"], true);
    assert_eq!(join["audio_capture_defaults"]["sample_rate"], 48_000);
    assert_eq!(received[1]["capture"]["noise_suppression"], true);
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = WsTransport::new()
        .connect(
            &format!("ws://{addr}"),
            &Credential::new("tok_abc"),
            &ConnectionConfig::default(),
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_empty_server_url_fails() {
    let result = WsTransport::new()
        .connect("", &Credential::new("tok_abc"), &ConnectionConfig::default())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_audio_enabled_config_publishes_on_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut received: Vec<Value> = Vec::new();
        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                Message::Text(text) => {
                    let value: Value = serde_json::from_str(&text).unwrap();
                    let is_publish = value["type"] == "publish_track";
                    received.push(value);
                    if is_publish {
                        ws.send(Message::Text(r#"{"type":"joined","room":"web-agent"}"#.into()))
                            .await
                            .unwrap();
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    let config = ConnectionConfig {
        audio: true,
        ..ConnectionConfig::default()
    };
    let transport = WsTransport::with_event_buffer(1);
    let (mut session, mut events) = transport
        .connect(&format!("ws://{addr}"), &Credential::new("tok_abc"), &config)
        .await
        .unwrap();

    // The server only answers once the microphone track is published.
    assert_eq!(events.recv().await, Some(RoomEvent::Connected));
    session.disconnect().await.unwrap();

    let received = server.await.unwrap();
    let types: Vec<&str> = received
        .iter()
        .map(|frame| frame["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, ["join", "publish_track", "unpublish_track", "leave"]);
    assert_eq!(received[0]["options"]["audio"], true);
    assert_eq!(received[1]["kind"], "audio");
    assert_eq!(received[1]["capture"]["sample_rate"], 48_000);
}
