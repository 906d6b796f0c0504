//! End-to-end: real server, real TCP, file cache on disk, stub catalog.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use product_lookup::cache::{CacheMode, FileCache};
use product_lookup::middleware::{LoggerMiddleware, Pipeline};
use product_lookup::server::Server;
use product_lookup::service::LookupService;
use product_lookup::upstream::{
    Item, ItemAttributes, ItemLookup, ItemLookupResponse, LookupRequest, UpstreamError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct Catalog {
    calls: AtomicUsize,
}

#[async_trait]
impl ItemLookup for Catalog {
    async fn item_lookup(
        &self,
        request: &LookupRequest,
    ) -> Result<ItemLookupResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.item_id() == "EMPTY" {
            return Ok(ItemLookupResponse::default());
        }
        Ok(ItemLookupResponse::with_items(vec![Item {
            asin: request.item_id().to_owned(),
            detail_page_url: format!("https://example.com/dp/{}", request.item_id()),
            item_attributes: Some(ItemAttributes {
                title: "Example Widget".into(),
                brand: "Acme".into(),
                ..Default::default()
            }),
            ..Default::default()
        }]))
    }
}

async fn start(cache_dir: &Path) -> (SocketAddr, Arc<Catalog>) {
    let catalog = Arc::new(Catalog {
        calls: AtomicUsize::new(0),
    });
    let cache = CacheMode::File(FileCache::create(cache_dir).await.unwrap());
    let service = Arc::new(LookupService::new(catalog.clone(), cache));
    let stack = Pipeline::new(service.router())
        .with(Arc::new(LoggerMiddleware))
        .build();

    let server = Server::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run(stack));
    (addr, catalog)
}

/// Sends one request with `Connection: close` and splits the reply.
async fn send(addr: SocketAddr, head: &str, body: &str) -> (u16, String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!(
        "{head}\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    let (headers, body) = text.split_once("\r\n\r\n").unwrap();
    let status = headers[9..12].parse().unwrap();
    (status, headers.to_owned(), body.to_owned())
}

#[tokio::test]
async fn lookup_populates_cache_and_then_serves_from_it() {
    let tmp = tempfile::tempdir().unwrap();
    let (addr, catalog) = start(tmp.path()).await;

    let (status, headers, body) = send(addr, "GET /?item_id=B000X HTTP/1.1", "").await;
    assert_eq!(status, 200);
    assert!(headers.contains("Content-Type: application/json"));
    assert!(body.contains(r#""Title":"Example Widget""#));
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);

    let cached = std::fs::read_to_string(tmp.path().join("B000X")).unwrap();
    assert_eq!(cached, body);

    let (status, _, again) = send(
        addr,
        "POST / HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded",
        "item_id=B000X",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(again, body);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn validation_and_mapping_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let (addr, catalog) = start(tmp.path()).await;

    let (status, _, body) = send(addr, "GET /?item_id= HTTP/1.1", "").await;
    assert_eq!(status, 400);
    assert_eq!(body, "invalid item id: ");
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);

    let (status, _, body) = send(addr, "GET /?item_id=EMPTY HTTP/1.1", "").await;
    assert_eq!(status, 500);
    assert!(body.starts_with("failed to get item from response"));
    assert!(!tmp.path().join("EMPTY").exists());
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let tmp = tempfile::tempdir().unwrap();
    let (addr, _) = start(tmp.path()).await;

    let (status, headers, body) = send(addr, "GET /hc HTTP/1.1", "").await;
    assert_eq!(status, 200);
    assert!(headers.contains("Content-Length: 0"));
    assert!(body.is_empty());

    let (status, _, _) = send(addr, "GET /items HTTP/1.1", "").await;
    assert_eq!(status, 404);

    let (status, headers, _) = send(addr, "PUT / HTTP/1.1", "").await;
    assert_eq!(status, 405);
    assert!(headers.contains("Allow: GET, POST"));
}
