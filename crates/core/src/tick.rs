//! Fixed-interval tick scheduler driving the combat/regen/AI sweep (§4.7).
//!
//! Generalized from the teacher's frame-driven `FixedTimestep`/`SimulationLoop`
//! (`crates/game/src/simulation/tick.rs`): there's no client-supplied frame
//! delta here, so the accumulator collapses to a plain `tokio::time::interval`,
//! but the shape — one tick function invoked at a fixed cadence, advancing
//! state and returning what changed — is the same.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::combat;
use crate::world::{Delivery, World};

pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to a running tick loop. Call [`TickHandle::cancel`] then
/// [`TickHandle::join`] for a clean shutdown (§4.14).
pub struct TickHandle {
    cancelled: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl TickHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Spawns the tick loop at the standard 500ms cadence (§4.7).
pub fn spawn(world: Arc<RwLock<World>>, default_npc_hp: i32, sink: impl Fn(Vec<Delivery>) + Send + Sync + 'static) -> TickHandle {
    spawn_with_interval(world, TICK_INTERVAL, default_npc_hp, sink)
}

/// Spawns the tick loop at an explicit interval, used directly by tests that
/// need a shorter cadence than production's 500ms.
pub fn spawn_with_interval(
    world: Arc<RwLock<World>>,
    interval: Duration,
    default_npc_hp: i32,
    sink: impl Fn(Vec<Delivery>) + Send + Sync + 'static,
) -> TickHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            let deliveries = {
                let mut w = world.write().await;
                combat::run_tick(&mut w, default_npc_hp)
            };
            sink(deliveries);
        }
    });

    TickHandle { cancelled, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Player, Storage};
    use std::sync::Mutex;

    fn world() -> World {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mud-core-tick-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        World::load(&Storage::new(dir))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn tick_loop_invokes_sink_and_cancels_cleanly() {
        let mut w = world();
        w.insert_player(Player::new_default("neo"));
        let world = Arc::new(RwLock::new(w));

        let ticks: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let ticks_clone = ticks.clone();

        // Force at least one non-empty delivery so the sink definitely fires:
        // insert an aggro NPC sharing the player's spawn room.
        {
            let mut w = world.write().await;
            let room_id = crate::world::SPAWN_ROOM.to_string();
            let mut npc = test_npc("drone", &room_id);
            npc.aggro = true;
            w.rooms.get_mut(&room_id).unwrap().npcs.insert("drone".to_string(), npc);
        }

        let handle = spawn_with_interval(world.clone(), Duration::from_millis(10), 50, move |_deliveries| {
            *ticks_clone.lock().unwrap() += 1;
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.cancel();
        handle.join().await;

        assert!(*ticks.lock().unwrap() >= 1);
    }

    fn test_npc(id: &str, room: &str) -> crate::world::Npc {
        crate::world::Npc {
            id: id.to_string(),
            name: "Training Drone".to_string(),
            description: String::new(),
            home_room: room.to_string(),
            current_room: room.to_string(),
            hp: 5,
            max_hp: 5,
            damage: 1,
            ac: 20,
            xp: 1,
            drop_money: 0,
            vendor: false,
            vendor_inventory: vec![],
            aggro: true,
            quest: None,
            agent: false,
            hunted_player: None,
            loot: vec![],
            state: crate::world::CombatState::Idle,
            dead: false,
            death_time: None,
        }
    }
}
