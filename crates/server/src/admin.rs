//! Admin HTTP (C13): Basic-auth gated dashboard, kick endpoint, and a
//! supplemental `/stats` JSON endpoint.
//!
//! Bound to `ADMIN_BIND_ADDR` (loopback by default, per §4.13) and kept as a
//! second, smaller `hyper` server alongside the bridge in `bridge.rs` — same
//! request-handling shape, different routes and an auth gate in front.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use mud_core::world::Delivery;

use crate::state::AppState;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

fn full_body(bytes: impl Into<Bytes>) -> BoxBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed()
}

pub async fn run(state: Arc<AppState>, bind_addr: String) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("admin HTTP listening on {bind_addr}");

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("admin accept failed: {e}");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                log::debug!("admin connection {addr} ended: {e}");
            }
        });
    }
}

async fn handle(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, Infallible> {
    if !authorized(&req, &state) {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(WWW_AUTHENTICATE, r#"Basic realm="mud-admin""#)
            .body(full_body("authentication required"))
            .unwrap());
    }

    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    let response = match (req.method(), path.as_str()) {
        (&hyper::Method::GET, "/") => dashboard(&state).await,
        (&hyper::Method::GET, "/stats") => stats(&state).await,
        (&hyper::Method::GET, "/kick") => kick(&state, &query),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(full_body("not found"))
            .unwrap(),
    };

    Ok(response)
}

/// Basic-auth gate. Comparison against the configured credentials runs in
/// constant time so a timing side channel can't leak the admin password
/// byte-by-byte.
fn authorized(req: &Request<hyper::body::Incoming>, state: &AppState) -> bool {
    let header = match req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return false,
    };
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    use base64::Engine as _;
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, pass)) = decoded.split_once(':') else {
        return false;
    };

    constant_time_eq(user.as_bytes(), state.config.admin_user.as_bytes())
        && constant_time_eq(pass.as_bytes(), state.config.admin_pass.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Renders the connected-player table with a kick link per row.
async fn dashboard(state: &AppState) -> Response<BoxBody> {
    let names = state.connections.connected_names();
    let world = state.world.read().await;

    let mut rows = String::new();
    for name in &names {
        let (display, room, hp, max_hp) = match world.player(name) {
            Some(p) => (p.name.clone(), p.room_id.clone(), p.hp, p.max_hp),
            None => (name.clone(), "?".to_string(), 0, 0),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td><a href=\"/kick?name={}\">kick</a></td></tr>\n",
            html_escape(&display),
            html_escape(&room),
            hp,
            max_hp,
            html_escape(&display),
        ));
    }

    let body = format!(
        "<!doctype html><html><head><title>mud-server admin</title></head><body>\
         <h1>Connected players ({})</h1>\
         <table border=\"1\" cellpadding=\"4\">\
         <tr><th>Name</th><th>Room</th><th>HP</th><th>Action</th></tr>\n{}\
         </table></body></html>",
        names.len(),
        rows,
    );

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/html; charset=utf-8")
        .body(full_body(body))
        .unwrap()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn stats(state: &AppState) -> Response<BoxBody> {
    let player_count = state.connections.connected_names().len();
    let body = serde_json::json!({
        "players": player_count,
        "uptime_secs": state.uptime().as_secs(),
        "ticks": state.tick_count.load(std::sync::atomic::Ordering::Relaxed),
    });
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(full_body(body.to_string()))
        .unwrap()
}

/// `GET /kick?name=<player>`: ejects a connected player. 400 on a missing
/// `name` parameter, 404 if no matching connection is live.
fn kick(state: &AppState, query: &str) -> Response<BoxBody> {
    let name = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "name")
        .map(|(_, v)| v);

    let Some(name) = name else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(full_body("missing name parameter"))
            .unwrap();
    };

    if !state.connections.is_connected(name) {
        return Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(full_body("no such connected player"))
            .unwrap();
    }

    state.connections.send_deliveries(vec![Delivery::new(
        name,
        "\r\nYou have been disconnected by an administrator.\r\n".to_string(),
    )]);
    state.connections.kick(name);
    state.sessions.disconnect(name);

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/html; charset=utf-8")
        .body(full_body(format!("<p>{} kicked.</p>", html_escape(name))))
        .unwrap()
}
