//! Process entry point: wires configuration, the tick scheduler, the three
//! network listeners, and the shutdown orchestrator (C14).
//!
//! Logging setup follows the teacher's `env_logger::Builder::from_env(...)`
//! idiom (`crates/server/src/main.rs`), extended to respect `LOG_LEVEL`/
//! `LOG_PRETTY` from [`mud_core::Config`] instead of a fixed filter string.

mod admin;
mod bridge;
mod state;
mod telnet;

use std::sync::Arc;

use tokio::sync::Notify;

use mud_core::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config);

    let telnet_addr = format!("0.0.0.0:{}", config.telnet_port);
    let web_addr = format!("0.0.0.0:{}", config.web_port);
    let admin_addr = config.admin_bind_addr.clone();

    let state = Arc::new(AppState::new(config));
    log::info!("mud-server starting up");

    let tick_sink = {
        let state = state.clone();
        move |deliveries: Vec<mud_core::world::Delivery>| {
            state.record_tick();
            state.connections.send_deliveries(deliveries);
        }
    };
    let tick_handle = mud_core::tick::spawn(state.world.clone(), state.config.default_npc_hp, tick_sink);

    let shutdown_notify = Arc::new(Notify::new());

    let telnet_task = tokio::spawn(telnet::run(state.clone(), telnet_addr, shutdown_notify.clone()));
    let bridge_task = tokio::spawn(bridge::run(state.clone(), web_addr));
    let admin_task = tokio::spawn(admin::run(state.clone(), admin_addr));
    let pruner_task = tokio::spawn(run_rate_limiter_pruner(state.clone()));
    let sweeper_task = tokio::spawn(run_session_sweeper(state.clone()));

    tokio::signal::ctrl_c().await?;
    log::info!("shutdown signal received");

    shutdown_notify.notify_waiters();
    tick_handle.cancel();

    if let Err(e) = telnet_task.await {
        log::warn!("telnet accept loop join error: {e}");
    }
    bridge_task.abort();
    admin_task.abort();
    pruner_task.abort();
    sweeper_task.abort();
    tick_handle.join().await;

    {
        let mut world = state.world.write().await;
        for name in state.sessions.online_names() {
            if let Err(e) = world.save_player(&state.storage, &name) {
                log::warn!("failed to save {name} during shutdown: {e}");
            }
        }
        if let Err(e) = world.save(&state.storage) {
            log::warn!("failed to save world during shutdown: {e}");
        }
    }

    log::info!("mud-server shut down cleanly");
    Ok(())
}

/// Hourly key-table pruner for both rate limiters (§4.3), so a name that
/// stops connecting eventually drops out of memory instead of lingering
/// forever in the sliding-window map.
async fn run_rate_limiter_pruner(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(3600));
    loop {
        ticker.tick().await;
        state.auth_limiter.prune();
        state.cmd_limiter.prune();
    }
}

/// Evicts sessions whose disconnect timestamp has aged out of the reconnect
/// window (§4.6), on a fixed interval independent of the tick cadence.
async fn run_session_sweeper(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        ticker.tick().await;
        let expired = state.sessions.sweep_expired();
        for name in expired {
            log::debug!("session for {name} expired out of the reconnect window");
        }
    }
}

fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.clone());
    let mut builder = env_logger::Builder::from_env(env);
    if !config.log_pretty {
        builder.format_timestamp_millis();
    }
    builder.init();
}
