//! Attachment flow tests against a loopback HTTP responder: the hash check
//! deduplicates uploads, and new content goes up as one multipart POST.

use sneedchat::attach::{AttachmentClient, UploadOutcome};
use sneedchat::error::ChatError;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// BLAKE3 of the bytes `foo`.
const FOO_HASH: &str = "04e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";

/// One HTTP request as seen by the responder.
struct Received {
    path: String,
    body: Vec<u8>,
}

/// Read a single HTTP/1.1 request: request line, headers, then exactly
/// `Content-Length` body bytes.
async fn read_request(stream: &mut TcpStream) -> Option<Received> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let path = head.lines().next()?.split_whitespace().nth(1)?.to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        })
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }
    Some(Received { path, body })
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let reply = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(reply.as_bytes()).await.unwrap();
}

/// Accept connections forever, answering `/fs/check-file` with `check_reply`
/// and everything else with an empty 200, recording every request in order.
fn spawn_responder(
    listener: TcpListener,
    check_reply: &'static str,
) -> mpsc::UnboundedReceiver<Received> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(req) = read_request(&mut stream).await {
                    let reply = if req.path == "/fs/check-file" {
                        check_reply
                    } else {
                        "{}"
                    };
                    respond(&mut stream, "200 OK", reply).await;
                    let _ = tx.send(req);
                }
            });
        }
    });
    rx
}

#[tokio::test]
async fn test_submit_skips_upload_when_server_has_content() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let mut requests = spawn_responder(listener, r#"{"exists":true}"#);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.jpg");
    std::fs::write(&path, b"foo").unwrap();

    let outcome = AttachmentClient::new(base).submit(&path).await.unwrap();
    assert_eq!(
        outcome,
        UploadOutcome::AlreadyPresent {
            hash: FOO_HASH.to_string()
        }
    );

    let check = requests.recv().await.unwrap();
    assert_eq!(check.path, "/fs/check-file");
    assert!(String::from_utf8_lossy(&check.body).contains(FOO_HASH));

    // The whole exchange was that one hash check; no bytes were uploaded.
    let extra = tokio::time::timeout(Duration::from_millis(300), requests.recv()).await;
    assert!(extra.is_err(), "request arrived after a positive hash check");
}

#[tokio::test]
async fn test_submit_uploads_new_content_as_multipart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let mut requests = spawn_responder(listener, r#"{"exists":false}"#);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.jpg");
    std::fs::write(&path, b"fresh attachment bytes").unwrap();

    let outcome = AttachmentClient::new(base).submit(&path).await.unwrap();
    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));

    let check = requests.recv().await.unwrap();
    assert_eq!(check.path, "/fs/check-file");

    let upload = requests.recv().await.unwrap();
    assert_eq!(upload.path, "/fs/upload-file");
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"cat.jpg\""));
    assert!(body.contains("fresh attachment bytes"));
}

#[tokio::test]
async fn test_submit_surfaces_check_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        if read_request(&mut stream).await.is_some() {
            respond(&mut stream, "500 Internal Server Error", "{}").await;
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.jpg");
    std::fs::write(&path, b"foo").unwrap();

    let err = AttachmentClient::new(base).submit(&path).await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 500, .. }));
}
