use std::sync::{Arc, Mutex};

use parikshak_core::{
    ActivityLog, MediaAsset,
    emotion::EmotionStreamClient,
    types::{EmotionLabel, EmotionSegment},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const LINES: [&str; 3] = [
    r#"{"start":0,"end":10,"emotions":{"arousal":0.8,"valence":0.7,"dominance":0.6}}"#,
    r#"{"start":10,"end":20,"emotions":{"arousal":0.2,"valence":0.1,"dominance":0.3},"noise_events":["Chatter"]}"#,
    r#"{"start":20,"end":30,"emotions":{"arousal":0.9,"valence":0.2,"dominance":0.5},"disturbances":["Door slam"]}"#,
];

async fn media(dir: &tempfile::TempDir) -> MediaAsset {
    let path = dir.path().join("lecture.mp3");
    tokio::fs::write(&path, b"ID3 not really audio").await.unwrap();
    MediaAsset::open(&path).await.unwrap()
}

#[tokio::test]
async fn segments_arrive_in_order_with_running_total() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}\n", LINES.join("\n"))))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let asset = media(&dir).await;
    let client = EmotionStreamClient::new(&format!("{}/", server.uri()), ActivityLog::new());

    let mut seen = Vec::new();
    let segments = client
        .analyze(&asset, |segment: &EmotionSegment, all: &[EmotionSegment]| {
            seen.push((segment.start, all.len()));
        })
        .await;

    assert_eq!(seen, vec![(0.0, 1), (10.0, 2), (20.0, 3)]);
    assert_eq!(segments[0].emotion, EmotionLabel::HappyHighEnergy);
    assert_eq!(segments[1].emotion, EmotionLabel::SadBored);
    assert_eq!(segments[1].disturbances, vec!["Chatter"]);
    assert_eq!(segments[2].emotion, EmotionLabel::HighEnergy);
    assert!((segments[0].confidence - 0.7).abs() < 1e-9);
}

#[tokio::test]
async fn missing_endpoint_yields_empty_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = ActivityLog::new();
    let client = EmotionStreamClient::new(&server.uri(), log.clone());

    let segments = client
        .analyze(&media(&dir).await, |_: &EmotionSegment, _: &[EmotionSegment]| {})
        .await;

    assert!(segments.is_empty());
    assert!(log.contains("Endpoint not found (404)"));
}

#[tokio::test]
async fn bad_gateway_mentions_the_tunnel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = ActivityLog::new();
    let client = EmotionStreamClient::new(&server.uri(), log.clone());
    client
        .analyze(&media(&dir).await, |_: &EmotionSegment, _: &[EmotionSegment]| {})
        .await;

    assert!(log.contains("Bad gateway (502)"));
}

/// Read one HTTP request off the socket, body included.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());

    match content_length {
        Some(length) => {
            while buf.len() < header_end + length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
        }
        None => {
            while !buf.ends_with(b"0\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

#[tokio::test]
async fn dropped_connection_keeps_earlier_segments() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        // one whole line plus half of the next, then hang up mid-chunk
        let payload = format!("{}\n{}", LINES[0], &LINES[1][..30]);
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\ntransfer-encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{}\r\n", payload.len(), payload);
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(chunk.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        drop(socket);
    });

    let dir = tempfile::tempdir().unwrap();
    let log = ActivityLog::new();
    let client = EmotionStreamClient::new(&format!("http://{addr}"), log.clone());

    let delivered = Arc::new(Mutex::new(0usize));
    let counter = delivered.clone();
    let segments = client
        .analyze(&media(&dir).await, move |_: &EmotionSegment, _: &[EmotionSegment]| {
            *counter.lock().unwrap() += 1;
        })
        .await;

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start, 0.0);
    assert_eq!(*delivered.lock().unwrap(), 1);
}
