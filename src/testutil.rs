// src/testutil.rs
// =============================================================================
// Tiny in-process HTTP servers for tests.
//
// They speak just enough HTTP/1.1 to answer one request per connection with
// a canned response, so tests never need the real internet.
// =============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// Builds a raw HTTP/1.1 response. `extra_headers` lines must end in "\r\n".
pub fn response(status_line: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        extra_headers,
        body.len(),
        body
    )
}

// Starts a server that answers every request with `route(path)`.
pub async fn serve<F>(route: F) -> SocketAddr
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let route = Arc::new(route);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let route = Arc::clone(&route);
            tokio::spawn(async move {
                let _ = answer(stream, route.as_ref()).await;
            });
        }
    });

    addr
}

// Starts a server that accepts connections and then says nothing for `hold`.
pub async fn serve_silent(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(hold).await;
                drop(stream);
            });
        }
    });

    addr
}

// Starts a server that sends headers promising 100 bytes, sends a few of
// them, then stalls for `hold`.
pub async fn serve_stalled_body(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request_path(&mut stream).await.is_err() {
                    return;
                }
                let head = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial body";
                if stream.write_all(head.as_bytes()).await.is_ok() {
                    let _ = stream.flush().await;
                    tokio::time::sleep(hold).await;
                }
            });
        }
    });

    addr
}

// An address nothing is listening on.
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn answer<F>(mut stream: TcpStream, route: &F) -> std::io::Result<()>
where
    F: Fn(&str) -> String,
{
    let path = read_request_path(&mut stream).await?;
    let reply = route(&path);
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await
}

// Reads the request head and returns the path from "GET /path HTTP/1.1".
async fn read_request_path(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&head);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    Ok(path)
}
