//! The per-tick combat, regeneration, and NPC-AI sweep (§4.9), driven by
//! the server's 500ms tick task. Each sweep step takes the world write
//! lock for its own pass rather than holding it for the whole tick, so a
//! slow player session never blocks the others for longer than one step.
//!
//! Grounded in the teacher's fixed-step `tick()` (`crates/game/src/simulation/tick.rs`):
//! the same "advance all live state by one step, collect outbound events"
//! shape, generalized from physics integration to combat/regen/AI resolution.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::world::{CombatState, Delivery, Npc, Player, World};

const MP_REGEN_CHANCE: f64 = 1.0 / 6.0;
const COMBAT_ROUND_INTERVAL: Duration = Duration::from_millis(1500);
#[allow(dead_code)] // defined per spec but intentionally unused in the observable path (§9)
const HEAT_PER_COMBAT: u8 = 5;
const HEAT_PER_KILL: u8 = 15;
const AGENT_HEAT_THRESHOLD: u8 = 50;
const AGENT_SPAWN_CHANCE: f64 = 0.20;

/// Runs one tick's worth of AI/regen/combat work and returns the messages
/// to deliver to affected players, in the §4.9 step order.
pub fn run_tick(world: &mut World, default_npc_hp: i32) -> Vec<Delivery> {
    let mut out = Vec::new();

    world.respawn_sweep();
    out.extend(acquire_aggro(world));
    regen_mp(world);
    out.extend(resolve_combat_rounds(world));
    decay_heat(world);
    out.extend(run_agent_ai(world));
    out.extend(spawn_agents_for_heat(world));
    let _ = default_npc_hp;

    out
}

/// §4.9 step 2: an idle player sharing a room with an idle, aggressive NPC
/// is pulled into combat, with `last_attack` backdated so the very next
/// tick resolves a round immediately.
fn acquire_aggro(world: &mut World) -> Vec<Delivery> {
    let mut out = Vec::new();
    let candidates: Vec<(String, String, String)> = world
        .players
        .iter()
        .filter(|(_, p)| p.combat_state == CombatState::Idle)
        .filter_map(|(key, p)| {
            let room = world.rooms.get(&p.room_id)?;
            let npc = room.npcs.values().find(|n| n.aggro && n.state == CombatState::Idle && !n.dead)?;
            Some((key.clone(), npc.id.clone(), npc.name.clone()))
        })
        .collect();

    for (key, npc_id, npc_name) in candidates {
        if let Some(player) = world.players.get_mut(&key) {
            player.combat_state = CombatState::Combat;
            player.combat_target = Some(npc_id);
            player.last_attack = Some(Instant::now() - Duration::from_secs(1));
            out.push(Delivery::new(&player.name, format!("{npc_name} attacks you!")));
        }
    }
    out
}

fn regen_mp(world: &mut World) {
    let mut rng = rand::thread_rng();
    for player in world.players.values_mut() {
        if player.mp < player.max_mp && rng.gen_bool(MP_REGEN_CHANCE) {
            player.mp += 1;
            player.clamp_mp();
        }
    }
}

fn decay_heat(world: &mut World) {
    for player in world.players.values_mut() {
        player.decay_heat();
    }
}

/// §4.9 step 4: every player in combat whose last round was at least
/// 1500ms ago gets a fresh round resolved.
fn resolve_combat_rounds(world: &mut World) -> Vec<Delivery> {
    let mut out = Vec::new();
    let due: Vec<String> = world
        .players
        .iter()
        .filter(|(_, p)| {
            p.combat_state != CombatState::Idle
                && p.combat_target.is_some()
                && p.last_attack.map(|t| t.elapsed() >= COMBAT_ROUND_INTERVAL).unwrap_or(true)
        })
        .map(|(k, _)| k.clone())
        .collect();

    for key in due {
        if let Some(player) = world.players.get_mut(&key) {
            player.last_attack = Some(Instant::now());
        }
        if let Some(result) = resolve_one_round(world, &key) {
            out.extend(result);
        }
    }
    out
}

/// One combat round, following §4.9's formulas verbatim:
/// - player damage = max(1, 1 + (STR-10)/2 + hand.damage), doubled once if
///   `Focused`;
/// - player hit iff `d20 >= npc.ac`;
/// - npc hit iff `d20 >= player.effective_ac()`, damage = uniform(1..=npc.damage).
fn resolve_one_round(world: &mut World, player_key: &str) -> Option<Vec<Delivery>> {
    let mut rng = rand::thread_rng();
    let mut deliveries = Vec::new();

    let room_id = world.players.get(player_key)?.room_id.clone();
    let target_id = world.players.get(player_key)?.combat_target.clone()?;
    let player_name = world.players.get(player_key)?.name.clone();

    if !world.rooms.get(&room_id).map(|r| r.npcs.contains_key(&target_id)).unwrap_or(false) {
        let player = world.players.get_mut(player_key)?;
        player.combat_state = CombatState::Idle;
        player.combat_target = None;
        deliveries.push(Delivery::new(&player_name, "Your target is gone.".to_string()));
        return Some(deliveries);
    }

    let (strength, weapon_dmg, focused) = {
        let p = world.players.get(player_key)?;
        (p.strength, p.weapon_damage(), p.combat_state == CombatState::Focused)
    };
    let mut damage = (1 + (strength - 10) / 2 + weapon_dmg).max(1);
    if focused {
        damage *= 2;
        world.players.get_mut(player_key)?.combat_state = CombatState::Combat;
    }

    let npc_ac = world.rooms.get(&room_id)?.npcs.get(&target_id)?.ac;
    let player_roll = rng.gen_range(1..=20);
    if player_roll >= npc_ac {
        let room = world.rooms.get_mut(&room_id)?;
        let npc = room.npcs.get_mut(&target_id)?;
        npc.hp -= damage;
        deliveries.push(Delivery::new(&player_name, format!("You hit {} for {damage} damage.", npc.name)));

        if npc.hp <= 0 {
            deliveries.extend(kill_npc(world, &room_id, &target_id, &player_name)?);
            return Some(deliveries);
        }
    } else {
        deliveries.push(Delivery::new(&player_name, "You miss.".to_string()));
    }

    // NPC retaliates if still alive.
    let player_ac = world.player(&player_name)?.effective_ac();
    let npc_damage_die = world.rooms.get(&room_id)?.npcs.get(&target_id)?.damage.max(1);
    let npc_roll = rng.gen_range(1..=20);
    if npc_roll >= player_ac {
        let dmg = rng.gen_range(1..=npc_damage_die);
        let npc_name = world.rooms.get(&room_id)?.npcs.get(&target_id)?.name.clone();
        let player = world.player_mut(&player_name)?;
        player.hp -= dmg;
        player.clamp_hp();
        deliveries.push(Delivery::new(&player_name, format!("{npc_name} hits you for {dmg} damage.")));

        if player.hp <= 0 {
            player.hp = player.max_hp;
            player.room_id = crate::world::SPAWN_ROOM.to_string();
            player.combat_state = CombatState::Idle;
            player.combat_target = None;
            deliveries.push(Delivery::new(&player_name, "You have been defeated and wake up back at the loading program.".to_string()));
        }
    }

    Some(deliveries)
}

/// Awards XP/money/loot, applies heat (awakened only), and queues the NPC
/// for respawn. Shared by basic combat rounds and class skills.
fn kill_npc(world: &mut World, room_id: &str, npc_id: &str, player_name: &str) -> Option<Vec<Delivery>> {
    let mut out = Vec::new();
    let room = world.rooms.get_mut(room_id)?;
    let mut npc = room.npcs.remove(npc_id)?;
    let npc_name = npc.name.clone();
    let xp = npc.xp;
    let money = npc.drop_money;
    let loot_ids = npc.loot.clone();
    npc.mark_dead();

    out.push(Delivery::new(player_name, format!("You have slain {npc_name}!")));
    for bystander in world.online_names_in_room(room_id) {
        if !bystander.eq_ignore_ascii_case(player_name) {
            out.push(Delivery::new(bystander, format!("{player_name} slays {npc_name}!")));
        }
    }

    for loot_id in &loot_ids {
        if let Some(item) = world.roll_loot(loot_id) {
            world.drop_into_room(room_id, item);
        }
    }

    let awakened = world.players.get(&player_name.to_ascii_lowercase())?.awakened;
    let player = world.player_mut(player_name)?;
    player.xp += xp;
    player.money += money;
    if awakened {
        player.add_heat(HEAT_PER_KILL);
    }
    player.level_up_if_ready();
    player.combat_state = CombatState::Idle;
    player.combat_target = None;

    world.enqueue_dead_npc(npc);
    Some(out)
}

/// §4.9 step 6: agent NPCs chase their hunted player — engaging in combat
/// once sharing a room, otherwise stepping one exit closer if a direct
/// exit leads to the target's room.
fn run_agent_ai(world: &mut World) -> Vec<Delivery> {
    let mut out = Vec::new();

    let movers: Vec<(String, String, String, String)> = world
        .rooms
        .iter()
        .flat_map(|(room_id, room)| {
            room.npcs
                .values()
                .filter(|n| n.agent && !n.dead)
                .filter_map(|n| {
                    let target_name = n.hunted_player.clone()?;
                    let target_room = world.player(&target_name)?.room_id.clone();
                    if target_room == *room_id {
                        return None;
                    }
                    let exit = room.exits.iter().find(|(_, dest)| **dest == target_room)?;
                    Some((room_id.clone(), n.id.clone(), exit.0.clone(), exit.1.clone()))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    for (from_room, npc_id, direction, to_room) in movers {
        let Some(mut npc) = world.rooms.get_mut(&from_room).and_then(|r| r.npcs.remove(&npc_id)) else { continue };
        let npc_name = npc.name.clone();
        npc.current_room = to_room.clone();

        for onlooker in world.online_names_in_room(&from_room) {
            out.push(Delivery::new(onlooker, format!("{npc_name} heads {direction}.")));
        }
        for onlooker in world.online_names_in_room(&to_room) {
            out.push(Delivery::new(onlooker, format!("{npc_name} arrives, hunting.")));
        }

        if let Some(room) = world.rooms.get_mut(&to_room) {
            room.npcs.insert(npc_id, npc);
        }
    }

    // Agents sharing a room with their target engage.
    let engage: Vec<(String, String)> = world
        .rooms
        .iter()
        .flat_map(|(room_id, room)| {
            room.npcs
                .values()
                .filter(|n| n.agent && !n.dead && n.state == CombatState::Idle)
                .filter_map(|n| {
                    let target = n.hunted_player.as_ref()?;
                    world.player(target).filter(|p| &p.room_id == room_id)?;
                    Some((room_id.clone(), n.id.clone()))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    for (room_id, npc_id) in engage {
        if let Some(room) = world.rooms.get_mut(&room_id) {
            if let Some(npc) = room.npcs.get_mut(&npc_id) {
                npc.state = CombatState::Combat;
            }
        }
    }

    out
}

/// §4.9.3: once an awakened player's heat reaches 50, each tick has a 20%
/// chance of spawning a hunting Agent in a room adjacent to the player
/// (not their own room), unless one is already present there.
fn spawn_agents_for_heat(world: &mut World) -> Vec<Delivery> {
    let mut out = Vec::new();
    let mut rng = rand::thread_rng();

    let targets: Vec<(String, String)> = world
        .players
        .values()
        .filter(|p| p.awakened && p.heat >= AGENT_HEAT_THRESHOLD)
        .map(|p| (p.room_id.clone(), p.name.clone()))
        .collect();

    for (room_id, player_name) in targets {
        if !rng.gen_bool(AGENT_SPAWN_CHANCE) {
            continue;
        }
        let already_present = world.rooms.get(&room_id).map(|r| r.npcs.values().any(|n| n.agent)).unwrap_or(false);
        if already_present {
            continue;
        }
        let Some(adjacent) = world.rooms.get(&room_id).and_then(|r| r.exits.values().next().cloned()) else { continue };

        let suffix = format!("{:x}", rng.gen::<u32>());
        let agent = Npc {
            id: format!("agent_{suffix}"),
            name: "Agent".to_string(),
            description: "A man in a dark suit, sunglasses, and an earpiece.".to_string(),
            home_room: adjacent.clone(),
            current_room: adjacent.clone(),
            hp: 100,
            max_hp: 100,
            damage: 15,
            ac: 15,
            xp: 200,
            drop_money: 50,
            vendor: false,
            vendor_inventory: vec![],
            aggro: true,
            quest: None,
            agent: true,
            hunted_player: Some(player_name.clone()),
            loot: vec![],
            state: CombatState::Idle,
            dead: false,
            death_time: None,
        };

        if let Some(room) = world.rooms.get_mut(&adjacent) {
            out.push(Delivery::new(&player_name, "You feel watched. An Agent is closing in.".to_string()));
            room.npcs.insert(agent.id.clone(), agent);
        }
    }
    out
}

/// Initiates combat between a player and an NPC, per the `attack` command.
pub fn initiate_combat(world: &mut World, player_name: &str, npc_id: &str) -> Result<String, crate::error::MudError> {
    let key = player_name.to_ascii_lowercase();
    let room_id = world
        .player(&key)
        .ok_or_else(|| crate::error::MudError::NotFound("player".to_string()))?
        .room_id
        .clone();
    let room = world.rooms.get(&room_id).ok_or_else(|| crate::error::MudError::Data("bad room".into()))?;
    let npc = room
        .npcs
        .get(npc_id)
        .filter(|n| n.is_attackable())
        .ok_or_else(|| crate::error::MudError::NotFound("no such target here".to_string()))?;
    let npc_name = npc.name.clone();

    let player = world.player_mut(&key).unwrap();
    player.combat_state = CombatState::Combat;
    player.combat_target = Some(npc_id.to_string());
    player.last_attack = Some(Instant::now() - COMBAT_ROUND_INTERVAL);
    Ok(format!("You attack {npc_name}!"))
}

/// Class skills (§4.9.2): each costs MP and, on a kill, runs the same
/// reward sequence as a basic combat round.
pub fn use_skill(world: &mut World, player_name: &str, skill: &str, target_npc: Option<&str>) -> Result<String, crate::error::MudError> {
    use crate::error::MudError;
    use crate::world::Class;

    let key = player_name.to_ascii_lowercase();
    let (class, mp, room_id) = {
        let p = world.player(&key).ok_or_else(|| MudError::NotFound("player".to_string()))?;
        (p.class, p.mp, p.room_id.clone())
    };
    let class = class.ok_or_else(|| MudError::Validation("you have no class".to_string()))?;

    let (cost, base_dmg_range, reply_verb): (i32, Option<(i32, i32)>, &str) = match (class, skill) {
        (Class::Hacker, "glitch") => (5, Some((5, 14)), "glitch"),
        (Class::Rebel, "smash") => (5, None, "smash"),
        (Class::Operator, "patch") => (5, None, "patch"),
        _ => return Err(MudError::Validation(format!("your class has no '{skill}' skill"))),
    };
    if mp < cost {
        return Err(MudError::Validation("not enough MP".to_string()));
    }

    if skill == "patch" {
        let player = world.player_mut(&key).unwrap();
        player.mp -= cost;
        let heal = 10.min(player.max_hp - player.hp);
        player.hp += heal.max(0);
        return Ok(format!("You patch your wounds. (+{} HP)", heal.max(0)));
    }

    let target_id = target_npc.ok_or_else(|| MudError::Validation("cast requires a target".to_string()))?;
    if !world.rooms.get(&room_id).map(|r| r.npcs.contains_key(target_id)).unwrap_or(false) {
        return Err(MudError::NotFound("no such target here".to_string()));
    }

    let mut rng = rand::thread_rng();
    let strength = world.player(&key).unwrap().strength;
    let dmg = match (class, base_dmg_range) {
        (Class::Hacker, Some((lo, hi))) => rng.gen_range(lo..=hi),
        (Class::Rebel, None) => rng.gen_range(strength..=strength + 7),
        _ => unreachable!(),
    };

    {
        let player = world.player_mut(&key).unwrap();
        player.mp -= cost;
        player.combat_state = CombatState::Combat;
        player.combat_target = Some(target_id.to_string());
    }

    let room = world.rooms.get_mut(&room_id).unwrap();
    let npc = room.npcs.get_mut(target_id).unwrap();
    npc.hp -= dmg;
    let npc_name = npc.name.clone();
    let lethal = npc.hp <= 0;

    if lethal {
        let player_name_owned = world.player(&key).unwrap().name.clone();
        kill_npc(world, &room_id, target_id, &player_name_owned);
        Ok(format!("You {reply_verb} {npc_name} for {dmg} damage, finishing it off!"))
    } else {
        Ok(format!("You {reply_verb} {npc_name} for {dmg} damage."))
    }
}

/// Consuming the red pill (§4.9.3 "awakening"): one-time permanent stat
/// bump, applied in addition to removing the item from wherever it was
/// found (handled by the caller in the dispatcher, matching the spec's
/// "from the current room or inventory").
pub fn awaken(player: &mut Player) -> Result<String, crate::error::MudError> {
    if player.awakened {
        return Err(crate::error::MudError::Validation("you are already awakened".to_string()));
    }
    player.awakened = true;
    player.max_hp += 10;
    player.hp = player.max_hp;
    player.strength += 2;
    Ok("Colors sharpen. The world resolves into falling code. You are awakened.".to_string())
}

/// The `focus` command (§4.10 awakening group): the player's next combat
/// round deals double damage.
pub fn focus(player: &mut Player) -> Result<String, crate::error::MudError> {
    if player.combat_state == CombatState::Idle {
        return Err(crate::error::MudError::Validation("you aren't in combat".to_string()));
    }
    player.combat_state = CombatState::Focused;
    Ok("You focus, steadying your next strike.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Storage;

    fn world() -> World {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mud-core-combat-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        World::load(&Storage::new(dir))
    }

    fn weak_npc(id: &str, room: &str) -> Npc {
        Npc {
            id: id.to_string(),
            name: "Training Drone".to_string(),
            description: String::new(),
            home_room: room.to_string(),
            current_room: room.to_string(),
            hp: 1,
            max_hp: 1,
            damage: 1,
            ac: 1,
            xp: 50,
            drop_money: 10,
            vendor: false,
            vendor_inventory: vec![],
            aggro: false,
            quest: None,
            agent: false,
            hunted_player: None,
            loot: vec![],
            state: CombatState::Idle,
            dead: false,
            death_time: None,
        }
    }

    #[test]
    fn initiate_combat_sets_state() {
        let mut w = world();
        w.insert_player(Player::new_default("neo"));
        w.rooms.get_mut(crate::world::SPAWN_ROOM).unwrap().npcs.insert("drone".into(), weak_npc("drone", crate::world::SPAWN_ROOM));
        initiate_combat(&mut w, "neo", "drone").unwrap();
        assert_eq!(w.player("neo").unwrap().combat_state, CombatState::Combat);
    }

    #[test]
    fn combat_round_can_kill_weak_npc_and_award_xp() {
        let mut w = world();
        let mut p = Player::new_default("neo");
        p.strength = 20;
        w.insert_player(p);
        w.rooms.get_mut(crate::world::SPAWN_ROOM).unwrap().npcs.insert("drone".into(), weak_npc("drone", crate::world::SPAWN_ROOM));
        initiate_combat(&mut w, "neo", "drone").unwrap();

        let mut killed = false;
        for _ in 0..50 {
            resolve_combat_rounds(&mut w);
            if w.player("neo").unwrap().xp >= 50 {
                killed = true;
                break;
            }
            if let Some(p) = w.player_mut("neo") {
                p.last_attack = Some(Instant::now() - COMBAT_ROUND_INTERVAL);
            }
        }
        assert!(killed, "expected the level-5-strength attacker to eventually down a 1hp/1ac drone");
    }

    #[test]
    fn aggro_acquisition_pulls_idle_player_into_combat() {
        let mut w = world();
        w.insert_player(Player::new_default("neo"));
        let mut npc = weak_npc("drone", crate::world::SPAWN_ROOM);
        npc.aggro = true;
        w.rooms.get_mut(crate::world::SPAWN_ROOM).unwrap().npcs.insert("drone".into(), npc);

        acquire_aggro(&mut w);
        assert_eq!(w.player("neo").unwrap().combat_state, CombatState::Combat);
        assert_eq!(w.player("neo").unwrap().combat_target, Some("drone".to_string()));
    }

    #[test]
    fn awaken_is_one_time_and_boosts_stats() {
        let mut p = Player::new_default("neo");
        let base_str = p.strength;
        assert!(awaken(&mut p).is_ok());
        assert_eq!(p.strength, base_str + 2);
        assert!(awaken(&mut p).is_err());
    }

    #[test]
    fn skill_requires_matching_class() {
        let mut w = world();
        let mut p = Player::new_default("neo");
        p.class = Some(crate::world::Class::Operator);
        p.mp = 10;
        w.insert_player(p);
        assert!(use_skill(&mut w, "neo", "glitch", None).is_err());
        assert!(use_skill(&mut w, "neo", "patch", None).is_ok());
    }

    #[test]
    fn focus_requires_being_in_combat() {
        let mut p = Player::new_default("neo");
        assert!(focus(&mut p).is_err());
        p.combat_state = CombatState::Combat;
        assert!(focus(&mut p).is_ok());
        assert_eq!(p.combat_state, CombatState::Focused);
    }
}
