//! HTTP fetches against a throwaway local server.

use anyhow::Result;
use handover_cli::core::{ErrorKind, UpdateError};
use handover_cli::test_utils::RecordingLauncher;
use handover_cli::upgrade::remote::RemoteStream;
use handover_cli::upgrade::{HttpRemote, Remote, ReplacementProtocol, UpdateRequest, is_up_to_date};
use reqwest::Url;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

/// A remote that talks to the local server directly, whatever proxy the
/// environment configures.
fn remote() -> HttpRemote {
    HttpRemote::with_client(reqwest::Client::builder().no_proxy().build().expect("client builds"))
}

/// Serve `body` for `/app` and 404 for anything else until the test ends.
async fn serve(body: &'static [u8], last_modified: Option<&'static str>) -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let is_head = head.starts_with("HEAD ");
                let found = head.split_whitespace().nth(1) == Some("/app");

                let mut response = if found {
                    format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n", body.len())
                } else {
                    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n".to_string()
                };
                if found && let Some(modified) = last_modified {
                    response.push_str(&format!("Last-Modified: {modified}\r\n"));
                }
                response.push_str("Connection: close\r\n\r\n");

                let _ = socket.write_all(response.as_bytes()).await;
                if found && !is_head {
                    let _ = socket.write_all(body).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    Ok(Url::parse(&format!("http://{address}/app"))?)
}

#[tokio::test]
async fn test_http_stream_delivers_body() -> Result<()> {
    let url = serve(b"version two over http", None).await?;

    let mut stream = remote().open(&url).await?;
    let mut body = Vec::new();
    while let Some(chunk) = stream.next_chunk().await? {
        body.extend(chunk);
    }

    assert_eq!(body, b"version two over http");
    Ok(())
}

#[tokio::test]
async fn test_http_last_modified_header() -> Result<()> {
    let url = serve(b"x", Some(LAST_MODIFIED)).await?;

    let modified = remote().last_modified(&url).await?;
    assert_eq!(modified.map(|time| time.to_rfc3339()), Some("2015-10-21T07:28:00+00:00".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_http_missing_header_is_unknown() -> Result<()> {
    let url = serve(b"x", None).await?;
    assert_eq!(remote().last_modified(&url).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_http_epoch_header_is_unknown() -> Result<()> {
    let url = serve(b"x", Some("Thu, 01 Jan 1970 00:00:00 GMT")).await?;
    assert_eq!(remote().last_modified(&url).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_http_not_found_is_fetch_error() -> Result<()> {
    let url = serve(b"x", None).await?.join("/missing")?;

    let err = remote().open(&url).await.unwrap_err();
    assert!(matches!(err, UpdateError::Fetch { .. }));
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(err.to_string().contains("404"));
    Ok(())
}

#[tokio::test]
async fn test_staleness_against_http_remote() -> Result<()> {
    let temp = TempDir::new()?;
    let local = temp.path().join("app");
    tokio::fs::write(&local, b"installed").await?;

    let url = serve(b"x", Some(LAST_MODIFIED)).await?;
    assert!(is_up_to_date(&remote(), &url, &local).await?);

    let unknown = serve(b"x", None).await?;
    assert!(!is_up_to_date(&remote(), &unknown, &local).await?);
    Ok(())
}

/// Fetch overwrites an existing destination with the full stream.
#[tokio::test]
async fn test_protocol_fetches_over_http() -> Result<()> {
    let temp = TempDir::new()?;
    let local = temp.path().join("nested").join("app.jar");
    tokio::fs::create_dir_all(local.parent().unwrap()).await?;
    tokio::fs::write(&local, b"a much longer previous version of the artifact").await?;

    let url = serve(b"v2", None).await?;
    let launcher = RecordingLauncher::new();
    let request = UpdateRequest::new(url, &local, ["--resume"])?;

    let report = ReplacementProtocol::new(remote()).with_launcher(&launcher).run(&request).await?;

    assert_eq!(report.bytes_written, 2);
    assert_eq!(tokio::fs::read(&local).await?, b"v2");
    assert_eq!(launcher.spawned().len(), 1);
    assert_eq!(launcher.spawned()[0].args, vec!["--resume"]);
    Ok(())
}
