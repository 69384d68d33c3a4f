//! TCP server (C11): native telnet listener, identification/auth flow, and
//! the per-connection input/dispatch loop.
//!
//! Per-connection task shape mirrors the teacher's `ClientConnection`
//! bookkeeping (`crates/game/src/net/connection.rs`): a live-ness timestamp
//! updated on every non-empty input, admission bounded by a capacity limit.
//! Outbound writes go through a single buffered channel drained by a writer
//! task, per §4.11 — the tick loop and other players' deliveries reach this
//! connection only through [`crate::state::ConnectionRegistry`], never by
//! touching the socket directly.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};

use mud_core::codec::{self, IacFilter};
use mud_core::world::Class;
use mud_core::{dispatch, DispatchServices};

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, bind_addr: String, shutdown: Arc<Notify>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("telnet listening on {bind_addr}");

    loop {
        let (stream, addr) = tokio::select! {
            res = listener.accept() => match res {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("accept failed: {e}");
                    continue;
                }
            },
            _ = shutdown.notified() => {
                log::info!("telnet accept loop stopping");
                break;
            }
        };

        let permit = match state.admission.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tokio::spawn(async move {
                    let mut stream = stream;
                    let _ = stream.write_all(b"Server full. Please try again later.\r\n").await;
                    let _ = stream.shutdown().await;
                });
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_connection(state, stream, addr).await {
                log::debug!("connection {addr} ended: {e}");
            }
        });
    }

    Ok(())
}

async fn handle_connection(
    state: Arc<AppState>,
    stream: TcpStream,
    addr: std::net::SocketAddr,
) -> anyhow::Result<()> {
    log::info!("connection from {addr}");
    let (mut reader, writer) = stream.into_split();

    let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let writer_task = tokio::spawn(run_writer(writer, rx));

    let identify = identify_and_auth(&state, &mut reader, &tx);
    let player_name = match tokio::time::timeout(state.identify_deadline(), identify).await {
        Ok(Ok(name)) => name,
        Ok(Err(e)) => {
            log::debug!("{addr} failed to identify: {e}");
            drop(tx);
            let _ = writer_task.await;
            return Ok(());
        }
        Err(_) => {
            let _ = tx.send(b"Timed out.\r\n".to_vec());
            drop(tx);
            let _ = writer_task.await;
            return Ok(());
        }
    };

    state.connections.register(&player_name, tx.clone());
    run_session(&state, reader, &player_name).await;

    state.connections.unregister(&player_name);
    state.sessions.disconnect(&player_name);
    {
        let mut world = state.world.write().await;
        if let Err(e) = world.save_player(&state.storage, &player_name) {
            log::warn!("failed to save {player_name} on disconnect: {e}");
        }
        world.remove_player(&player_name);
    }
    drop(tx);
    let _ = writer_task.await;
    log::info!("{player_name} ({addr}) disconnected");
    Ok(())
}

/// Drains the outbound channel to the socket. A single writer per connection
/// means every other task can enqueue bytes without racing on the socket.
async fn run_writer(
    mut writer: tokio::net::tcp::OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(bytes) = rx.recv().await {
        if writer.write_all(&bytes).await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn read_line(
    reader: &mut tokio::net::tcp::OwnedReadHalf,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
    echo: bool,
) -> anyhow::Result<String> {
    let history = mud_core::linereader::HistoryStore::new();
    let mut line_reader = mud_core::linereader::LineReader::new();
    line_reader.set_echo(echo);
    let mut iac_filter = IacFilter::new();
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            anyhow::bail!("connection closed during identification");
        }
        for filtered in iac_filter.filter(&byte[..n]) {
            let outcome = line_reader.feed_byte(filtered, &history, "_identify");
            if !outcome.echo.is_empty() {
                let _ = tx.send(outcome.echo);
            }
            if let Some(line) = outcome.line {
                return Ok(line);
            }
        }
    }
}

/// Runs §4.11's identification flow: name, auth (register or verify),
/// reconnect rehydration, and first-time class choice.
async fn identify_and_auth(
    state: &Arc<AppState>,
    reader: &mut tokio::net::tcp::OwnedReadHalf,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
) -> anyhow::Result<String> {
    let _ = tx.send(b"By what name do you wish to be known?\r\n".to_vec());
    let raw_name = read_line(reader, tx, true).await?;
    let name = mud_core::auth::sanitize_username(&raw_name);
    mud_core::auth::validate_username(&name)?;

    if !state.auth_limiter.allow(&name) {
        let _ = tx.send(b"Too many attempts. Try again later.\r\n".to_vec());
        anyhow::bail!("rate limited");
    }

    if state.auth.exists(&name)? {
        let _ = tx.send(codec::iac_will_echo().to_vec());
        let _ = tx.send(b"Password: ".to_vec());
        let password = read_line(reader, tx, false).await?;
        let _ = tx.send(codec::iac_wont_echo().to_vec());
        if !state.auth.verify(&name, &password)? {
            let _ = tx.send(b"\r\nIncorrect password.\r\n".to_vec());
            anyhow::bail!("bad password");
        }
    } else {
        let _ = tx.send(format!("Creating a new account for {name}.\r\n").into_bytes());
        let _ = tx.send(codec::iac_will_echo().to_vec());
        let _ = tx.send(b"Choose a password: ".to_vec());
        let password = read_line(reader, tx, false).await?;
        let _ = tx.send(codec::iac_wont_echo().to_vec());
        state.auth.register(&name, &password)?;
        let _ = tx.send(b"\r\nAccount created.\r\n".to_vec());
    }

    // The session registry only tells us whether to greet as a reconnect;
    // the authoritative player state always comes from the world/storage
    // (or an already-live entry, if the same process still holds one).
    let rehydrated = state.sessions.reconnect(&name).is_some();

    let needs_class = {
        let mut world = state.world.write().await;
        if world.player(&name).is_none() {
            let player = world.load_player(&state.storage, &name);
            world.insert_player(player);
        }
        world.player(&name).map(|p| p.class.is_none()).unwrap_or(false)
    };

    if !rehydrated {
        let (room_id, hp, mp) = {
            let world = state.world.read().await;
            let p = world.player(&name).expect("just inserted");
            (p.room_id.clone(), p.hp, p.mp)
        };
        state.sessions.create_session(&name, &room_id, hp, mp);
    }

    let _ = tx.send(if rehydrated {
        format!("Welcome back, {name}.\r\n").into_bytes()
    } else {
        format!("Welcome, {name}.\r\n").into_bytes()
    });

    if needs_class {
        let class = choose_class(reader, tx).await?;
        let mut world = state.world.write().await;
        apply_class(&mut world, &name, class);
        world.save_player(&state.storage, &name)?;
    }

    Ok(name)
}

async fn choose_class(
    reader: &mut tokio::net::tcp::OwnedReadHalf,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
) -> anyhow::Result<Class> {
    let prompt = format!(
        "Choose your path:\r\n  1) {}\r\n  2) {}\r\n  3) {}\r\n> ",
        Class::Hacker.name(),
        Class::Rebel.name(),
        Class::Operator.name(),
    )
    .into_bytes();
    loop {
        let _ = tx.send(prompt.clone());
        let choice = read_line(reader, tx, true).await?;
        if let Some(class) = Class::from_choice(choice.trim()) {
            return Ok(class);
        }
        let _ = tx.send(b"That's not one of the choices.\r\n".to_vec());
    }
}

/// Applies the class choice's HP bonus and grants its starting item, if the
/// item template exists (embedded defaults always include one per class).
fn apply_class(world: &mut mud_core::World, name: &str, class: Class) {
    let (hp_bonus, starting_item_id) = class.starting_kit();
    let item = world.item_templates.get(starting_item_id).map(|t| t.instantiate(name));

    if let Some(player) = world.player_mut(name) {
        player.class = Some(class);
        player.max_hp += hp_bonus;
        player.hp = player.max_hp;
        if let Some(item) = item {
            player.inventory.push(item);
        }
    }
}

/// Runs the main command loop for an authenticated connection until the
/// socket closes or the player quits.
async fn run_session(state: &Arc<AppState>, mut reader: tokio::net::tcp::OwnedReadHalf, name: &str) {
    let greeting = {
        let world = state.world.read().await;
        world.look(name).unwrap_or_default()
    };
    state.connections.send(name, greeting.into_bytes());

    let mut iac_filter = IacFilter::new();
    let mut byte = [0u8; 1];
    'outer: loop {
        let read = tokio::time::timeout(state.config.idle_timeout, reader.read(&mut byte)).await;
        let n = match read {
            Ok(Ok(n)) => n,
            Ok(Err(_)) | Err(_) => break,
        };
        if n == 0 {
            break;
        }

        for filtered in iac_filter.filter(&byte[..n]) {
            let outcome = state
                .line_readers
                .with_player(name, |r| r.feed_byte(filtered, &state.history, name));
            if !outcome.echo.is_empty() {
                state.connections.send(name, outcome.echo);
            }
            let Some(line) = outcome.line else { continue };

            state.sessions.touch(name);
            let deliveries = {
                let mut world = state.world.write().await;
                let services = DispatchServices {
                    cmd_limiter: &state.cmd_limiter,
                    sessions: &state.sessions,
                    storage: &state.storage,
                    adapters: &state.adapters,
                    max_inventory: state.config.max_inventory_size,
                };
                dispatch(&mut world, &services, name, &line)
            };

            for d in deliveries {
                state.connections.send(&d.to, d.text.into_bytes());
            }
            if !state.sessions.is_online(name) {
                break 'outer;
            }
        }
    }

    state.line_readers.remove(name);
}
