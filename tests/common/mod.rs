//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use fastmirror::cache::CacheStore;
use fastmirror::config::MirrorConfig;
use fastmirror::handlers::Dispatcher;
use fastmirror::http::HttpServer;

/// Start a mock origin returning a fixed response, on an ephemeral port.
pub async fn start_mock_origin(
    content_type: &'static str,
    body: &'static [u8],
) -> SocketAddr {
    start_programmable_origin(move || async move { (200, content_type, body.to_vec()) }).await
}

/// Start a programmable mock origin; the closure produces each response.
pub async fn start_programmable_origin<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, &'static str, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;

                        let (status, content_type, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let head = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            status_text,
                            content_type,
                            body.len(),
                        );
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Spawn a fastmirror server for the given config on an ephemeral port.
pub async fn spawn_server(config: MirrorConfig) -> SocketAddr {
    let store = Arc::new(CacheStore::new(&config.cache.dir).unwrap());
    let dispatcher = Dispatcher::from_config(&config, store).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, dispatcher);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Client that never pools connections or picks up system proxies.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
