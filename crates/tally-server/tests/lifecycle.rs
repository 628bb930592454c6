//! End-to-end process lifecycle over a real socket.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use tally_core::TallyError;
use tally_server::config::TallyConfig;
use tally_server::server;
use tally_server::store::MemoryStore;

fn free_addr() -> SocketAddr {
    let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    l.local_addr().unwrap()
}

fn config(listen: SocketAddr) -> TallyConfig {
    let mut cfg = TallyConfig::default();
    cfg.server.listen = listen.to_string();
    cfg.readiness.max_attempts = 3;
    cfg.readiness.interval_ms = 10;
    cfg.validate().unwrap();
    cfg
}

async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

async fn wait_listening(addr: SocketAddr) {
    for _ in 0..200 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never started listening on {addr}");
}

#[tokio::test]
async fn unreachable_store_never_binds() {
    let addr = free_addr();
    let store = Arc::new(MemoryStore::new());
    store.set_reachable(false);

    let err = server::run_with_store(config(addr), store.clone(), std::future::pending())
        .await
        .expect_err("must fail");

    assert!(matches!(err, TallyError::StoreUnreachable { attempts: 3 }));
    assert!(err.is_fatal());
    assert_eq!(store.ping_count(), 3);
    assert!(store.is_closed());
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn serves_then_drains_and_closes_store() {
    let addr = free_addr();
    let store = Arc::new(MemoryStore::new());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server::run_with_store(config(addr), store.clone(), async move {
        let _ = stop_rx.await;
    }));
    wait_listening(addr).await;

    let res = raw_get(addr, "/hits").await;
    assert!(res.starts_with("HTTP/1.1 200"), "{res}");
    assert!(res.ends_with("{\"total\":1}"), "{res}");

    let res = raw_get(addr, "/").await;
    assert!(res.contains("Backend says hai noroc bade Vasile!"));

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    assert!(store.is_closed());
    assert!(TcpStream::connect(addr).await.is_err());
}
