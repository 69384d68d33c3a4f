//! HTTP/WebSocket bridge (C12): serves the embedded terminal page, a health
//! check, and a `/ws` upgrade that relays to the native telnet listener.
//!
//! Grounded in the teacher's asset-embedding idiom (`crates/client/src/assets.rs`,
//! `rust_embed::Embed`), repurposed here for one HTML/JS page instead of
//! game assets.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{CONNECTION, UPGRADE};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use rust_embed::Embed;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::{Message, Role};
use tokio_tungstenite::WebSocketStream;

use mud_core::codec::IacFilter;

use crate::state::AppState;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

fn full_body(bytes: impl Into<Bytes>) -> BoxBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

pub async fn run(state: Arc<AppState>, bind_addr: String) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("web bridge listening on {bind_addr}");

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("web bridge accept failed: {e}");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle(req, state.clone(), addr));
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service)
                .with_upgrades()
                .await
            {
                log::debug!("web bridge connection {addr} ended: {e}");
            }
        });
    }
}

async fn handle(
    mut req: Request<Incoming>,
    state: Arc<AppState>,
    addr: SocketAddr,
) -> Result<Response<BoxBody>, Infallible> {
    let path = req.uri().path().to_string();

    let response = match (req.method(), path.as_str()) {
        (&hyper::Method::GET, "/") => serve_index(),
        (&hyper::Method::GET, "/health") => serve_health(),
        (&hyper::Method::GET, "/ws") => {
            if !origin_allowed(&req, &state) {
                return Ok(Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(full_body("origin not allowed"))
                    .unwrap());
            }
            match upgrade_websocket(&mut req, state.clone(), addr) {
                Some(response) => response,
                None => Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .body(full_body("expected a websocket upgrade"))
                    .unwrap(),
            }
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(full_body("not found"))
            .unwrap(),
    };

    Ok(response)
}

fn serve_index() -> Response<BoxBody> {
    match Assets::get("index.html") {
        Some(file) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "text/html; charset=utf-8")
            .body(full_body(file.data.into_owned()))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(full_body("index.html missing"))
            .unwrap(),
    }
}

fn serve_health() -> Response<BoxBody> {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "mud-server",
    });
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(full_body(body.to_string()))
        .unwrap()
}

/// Empty Origin is allowed (native clients, e.g. curl); `"*"` allows all;
/// otherwise the Origin must exact-match one of the trimmed CSV entries,
/// optionally ignoring a `scheme://` prefix on either side.
fn origin_allowed(req: &Request<Incoming>, state: &AppState) -> bool {
    let origin = match req.headers().get("origin") {
        Some(v) => match v.to_str() {
            Ok(s) if !s.is_empty() => s,
            _ => return true,
        },
        None => return true,
    };

    if state.config.allowed_origins.iter().any(|o| o == "*") {
        return true;
    }

    state.config.allowed_origins.iter().any(|allowed| {
        allowed == origin || strip_scheme(allowed) == strip_scheme(origin)
    })
}

fn strip_scheme(s: &str) -> &str {
    s.split_once("://").map(|(_, rest)| rest).unwrap_or(s)
}

fn upgrade_websocket(
    req: &mut Request<Incoming>,
    state: Arc<AppState>,
    addr: SocketAddr,
) -> Option<Response<BoxBody>> {
    let upgrade_hdr = req
        .headers()
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !upgrade_hdr.eq_ignore_ascii_case("websocket") {
        return None;
    }

    let key = req.headers().get("sec-websocket-key")?.as_bytes().to_vec();
    let accept = derive_accept_key(&key);

    let on_upgrade = hyper::upgrade::on(req);

    let response = Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(CONNECTION, "Upgrade")
        .header(UPGRADE, "websocket")
        .header("Sec-WebSocket-Accept", accept)
        .body(full_body(Bytes::new()))
        .unwrap();

    let telnet_port = state.config.telnet_port;
    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                let io = TokioIo::new(upgraded);
                let ws = WebSocketStream::from_raw_socket(io, Role::Server, None).await;
                if let Err(e) = relay(ws, telnet_port).await {
                    log::debug!("ws bridge {addr} relay ended: {e}");
                }
            }
            Err(e) => log::warn!("ws upgrade failed for {addr}: {e}"),
        }
    });

    Some(response)
}

async fn relay(ws: WebSocketStream<TokioIo<hyper::upgrade::Upgraded>>, telnet_port: u16) -> anyhow::Result<()> {
    let tcp = TcpStream::connect(("127.0.0.1", telnet_port)).await?;
    let (mut tcp_read, mut tcp_write) = tcp.into_split();
    let (mut ws_write, mut ws_read) = ws.split();

    let to_ws = async {
        let mut filter = IacFilter::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = tcp_read.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            let filtered = filter.filter(&buf[..n]);
            if !filtered.is_empty() && ws_write.send(Message::Binary(filtered)).await.is_err() {
                break;
            }
        }
        let _ = ws_write.close().await;
        Ok::<(), anyhow::Error>(())
    };

    let to_tcp = async {
        while let Some(msg) = ws_read.next().await {
            let bytes = match msg {
                Ok(Message::Text(text)) => text.into_bytes(),
                Ok(Message::Binary(bytes)) => bytes,
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            };
            if tcp_write.write_all(&bytes).await.is_err() {
                break;
            }
        }
        let _ = tcp_write.shutdown().await;
        Ok::<(), anyhow::Error>(())
    };

    tokio::try_join!(to_ws, to_tcp)?;
    Ok(())
}
