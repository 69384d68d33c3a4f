mod builder;
mod item;
mod mapping;
mod npc;
mod persist;
mod player;
mod room;

pub use item::{apply_rarity, EquipSlot, Item, ItemKind};
pub use mapping::render_automap;
pub use npc::{CombatState, Npc, QuestOffer};
pub use persist::Storage;
pub use player::{Class, Player, MAX_HEAT, RECALL_ROOM, SPAWN_ROOM};
pub use room::{reverse_exit_name, Direction, Room};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::codec::Rarity;
use crate::error::{MudError, MudResult};

/// A message the dispatcher/tick produced for a specific connected player,
/// to be handed to that player's outbound writer. Kept message-passing
/// rather than reaching into a connection handle directly, since the world
/// must never touch transport state under its own lock (§9: adapters and
/// the core "may call back into the world only via documented operations",
/// and the inverse holds for outbound delivery too).
#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: String,
    pub text: String,
}

impl Delivery {
    pub fn new(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
        }
    }
}

/// A record of a dead NPC awaiting respawn, holding the full NPC value so
/// the respawn sweep can reinsert it unchanged into its home room.
struct DeadNpc {
    npc: Npc,
}

pub struct World {
    pub rooms: HashMap<String, Room>,
    pub players: HashMap<String, Player>,
    pub item_templates: HashMap<String, Item>,
    pub dialogue: HashMap<String, HashMap<String, String>>,
    pub motd: Vec<String>,
    dead_npcs: Vec<DeadNpc>,
    next_instance_suffix: u64,
}

const RESPAWN_DELAY: Duration = Duration::from_secs(30);
const HEAT_PER_KILL: u8 = 15;
#[allow(dead_code)] // defined per spec but intentionally unused in the observable path (§9)
const HEAT_PER_COMBAT: u8 = 5;

impl World {
    pub fn load(storage: &Storage) -> World {
        let rooms = storage.load_rooms();
        let item_templates = storage.load_item_templates();
        let dialogue = storage.load_dialogue();
        let motd = storage.load_motd();

        World {
            rooms,
            players: HashMap::new(),
            item_templates,
            dialogue,
            motd,
            dead_npcs: Vec::new(),
            next_instance_suffix: 0,
        }
    }

    pub fn save(&self, storage: &Storage) -> MudResult<()> {
        storage.save_rooms(&self.rooms)
    }

    fn fresh_instance_suffix(&mut self) -> String {
        self.next_instance_suffix += 1;
        let random: u32 = rand::thread_rng().gen();
        format!("{:x}{:x}", self.next_instance_suffix, random)
    }

    // ---- player lifecycle -------------------------------------------------

    pub fn load_player(&self, storage: &Storage, name: &str) -> Player {
        storage.load_player(name).unwrap_or_else(|| Player::new_default(name))
    }

    pub fn save_player(&self, storage: &Storage, name: &str) -> MudResult<()> {
        let player = self
            .players
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| MudError::NotFound(format!("player '{name}'")))?;
        storage.save_player(player)
    }

    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.name.to_ascii_lowercase(), player);
    }

    pub fn remove_player(&mut self, name: &str) -> Option<Player> {
        self.players.remove(&name.to_ascii_lowercase())
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(&name.to_ascii_lowercase())
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(&name.to_ascii_lowercase())
    }

    pub fn online_names_in_room(&self, room_id: &str) -> Vec<String> {
        self.players
            .values()
            .filter(|p| p.room_id == room_id)
            .map(|p| p.name.clone())
            .collect()
    }

    // ---- room queries -------------------------------------------------

    pub fn look(&self, player_name: &str) -> MudResult<String> {
        let player = self
            .player(player_name)
            .ok_or_else(|| MudError::NotFound("player".to_string()))?;
        let room = self.rooms.get(&player.room_id).ok_or_else(|| {
            MudError::Data(format!("player is in nonexistent room '{}'", player.room_id))
        })?;

        let desc = if player.brief {
            room.brief_description()
        } else {
            room.description.clone()
        };

        let mut out = format!("{}\n{}\n", room.id, desc);

        let exits: Vec<&str> = room.exits.keys().map(|s| s.as_str()).collect();
        out.push_str(&format!("Exits: {}\n", exits.join(", ")));

        for item in room.items.values() {
            out.push_str(&format!("A {} lies here.\n", item.name));
        }
        for npc in room.npcs.values().filter(|n| !n.dead) {
            out.push_str(&format!("{} is here.\n", npc.name));
        }
        for other in self.online_names_in_room(&player.room_id) {
            if other.to_ascii_lowercase() != player_name.to_ascii_lowercase() {
                out.push_str(&format!("{} is here.\n", other));
            }
        }

        Ok(out)
    }

    /// Moves a player through an exit, canceling combat. Returns the
    /// destination room id along with departure/arrival messages for
    /// onlookers.
    pub fn move_player(&mut self, player_name: &str, direction: &str) -> MudResult<Vec<Delivery>> {
        let key = player_name.to_ascii_lowercase();
        let (from_room, to_room) = {
            let player = self
                .players
                .get(&key)
                .ok_or_else(|| MudError::NotFound("player".to_string()))?;
            let room = self
                .rooms
                .get(&player.room_id)
                .ok_or_else(|| MudError::Data(format!("unknown room '{}'", player.room_id)))?;
            let dest = room
                .exits
                .get(direction)
                .ok_or_else(|| MudError::Validation(format!("you can't go {direction}")))?
                .clone();
            (player.room_id.clone(), dest)
        };

        if !self.rooms.contains_key(&to_room) {
            return Err(MudError::Data(format!("exit leads to unknown room '{to_room}'")));
        }

        let mut deliveries = Vec::new();
        for onlooker in self.online_names_in_room(&from_room) {
            if onlooker.to_ascii_lowercase() != key {
                deliveries.push(Delivery::new(&onlooker, format!("{player_name} leaves {direction}.")));
            }
        }

        if let Some(player) = self.players.get_mut(&key) {
            player.room_id = to_room.clone();
            player.combat_state = CombatState::Idle;
            player.combat_target = None;
        }

        for onlooker in self.online_names_in_room(&to_room) {
            if onlooker.to_ascii_lowercase() != key {
                deliveries.push(Delivery::new(&onlooker, format!("{player_name} arrives.")));
            }
        }

        Ok(deliveries)
    }

    pub fn get_item(&mut self, player_name: &str, item_name: &str, max_inventory: usize) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let room_id = self.players.get(&key).ok_or_else(|| MudError::NotFound("player".into()))?.room_id.clone();

        if self.players.get(&key).unwrap().inventory.len() >= max_inventory {
            return Err(MudError::ResourceLimit("your inventory is full".to_string()));
        }

        let room = self.rooms.get_mut(&room_id).ok_or_else(|| MudError::Data("bad room".into()))?;
        let pairs: Vec<(&str, &str)> = room.items.iter().map(|(id, i)| (id.as_str(), i.name.as_str())).collect();
        let item_id = find_paired_by_name_or_prefix(&pairs, item_name)
            .ok_or_else(|| MudError::NotFound(format!("there is no '{item_name}' here")))?;
        let item = room.items.remove(&item_id).unwrap();
        let name = item.name.clone();
        self.players.get_mut(&key).unwrap().inventory.push(item);
        Ok(format!("You pick up the {name}."))
    }

    pub fn drop_item(&mut self, player_name: &str, item_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        let idx = find_index_by_name_or_prefix(&player.inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;
        let item = player.inventory.remove(idx);
        let name = item.name.clone();
        let room_id = player.room_id.clone();
        self.rooms.get_mut(&room_id).ok_or_else(|| MudError::Data("bad room".into()))?.items.insert(item.id.clone(), item);
        Ok(format!("You drop the {name}."))
    }

    pub fn wear_item(&mut self, player_name: &str, item_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        let idx = find_index_by_name_or_prefix(&player.inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;
        let slot = player.inventory[idx]
            .slot
            .ok_or_else(|| MudError::Validation("that isn't wearable".to_string()))?;
        let item = player.inventory.remove(idx);
        let name = item.name.clone();
        if let Some(previous) = player.equipment.insert(slot, item) {
            player.inventory.push(previous);
        }
        Ok(format!("You wear the {name}."))
    }

    pub fn remove_item(&mut self, player_name: &str, slot_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        let slot = EquipSlot::parse(slot_name).ok_or_else(|| MudError::Validation("no such slot".to_string()))?;
        let item = player
            .equipment
            .remove(&slot)
            .ok_or_else(|| MudError::NotFound("you aren't wearing anything there".to_string()))?;
        let name = item.name.clone();
        player.inventory.push(item);
        Ok(format!("You remove the {name}."))
    }

    /// Takes the named pill (§4.9.3) from inventory or the current room,
    /// wherever it's found first; the pill is consumed either way.
    pub fn take_pill(&mut self, player_name: &str, pill_id_prefix: &str) -> MudResult<Option<Item>> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        if let Some(idx) = player.inventory.iter().position(|i| i.id.starts_with(pill_id_prefix)) {
            return Ok(Some(player.inventory.remove(idx)));
        }

        let room_id = player.room_id.clone();
        let room = self.rooms.get_mut(&room_id).ok_or_else(|| MudError::Data("bad room".into()))?;
        let found_id = room.items.values().find(|i| i.id.starts_with(pill_id_prefix)).map(|i| i.id.clone());
        match found_id {
            Some(id) => Ok(room.items.remove(&id)),
            None => Ok(None),
        }
    }

    pub fn use_item(&mut self, player_name: &str, item_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        let idx = find_index_by_name_or_prefix(&player.inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;

        if player.inventory[idx].kind != Some(ItemKind::Consumable) {
            return Err(MudError::Validation("that isn't usable".to_string()));
        }

        let item = player.inventory.remove(idx);
        let msg = if let Some((effect, magnitude)) = &item.effect {
            match effect.as_str() {
                "heal" => {
                    player.hp = (player.hp + magnitude).min(player.max_hp);
                    format!("You feel restored. (+{magnitude} HP)")
                }
                "strength" => {
                    player.strength += magnitude;
                    format!("You feel stronger. (+{magnitude} STR)")
                }
                _ => format!("You use the {}.", item.name),
            }
        } else {
            format!("You use the {}.", item.name)
        };
        Ok(msg)
    }

    pub fn buy_item(&mut self, player_name: &str, npc_id: &str, item_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let room_id = self.players.get(&key).ok_or_else(|| MudError::NotFound("player".into()))?.room_id.clone();
        let room = self.rooms.get(&room_id).ok_or_else(|| MudError::Data("bad room".into()))?;
        let npc = room.npcs.get(npc_id).filter(|n| n.vendor).ok_or_else(|| MudError::NotFound("no such vendor".to_string()))?;

        let offered: Vec<(&str, &str)> = npc
            .vendor_inventory
            .iter()
            .filter_map(|id| self.item_templates.get(id).map(|t| (id.as_str(), t.name.as_str())))
            .collect();
        let template_id = find_paired_by_name_or_prefix(&offered, item_name)
            .ok_or_else(|| MudError::NotFound(format!("the vendor doesn't sell '{item_name}'")))?;

        let template = self
            .item_templates
            .get(&template_id)
            .ok_or_else(|| MudError::Data(format!("missing item template '{template_id}'")))?
            .clone();

        let player = self.players.get_mut(&key).unwrap();
        if player.money < template.price {
            return Err(MudError::Validation("you can't afford that".to_string()));
        }
        if player.inventory.len() >= 20 {
            return Err(MudError::ResourceLimit("your inventory is full".to_string()));
        }
        player.money -= template.price;
        let name = template.name.clone();
        player.inventory.push(template);
        Ok(format!("You buy the {name}."))
    }

    pub fn sell_item(&mut self, player_name: &str, item_name: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).ok_or_else(|| MudError::NotFound("player".into()))?;
        let idx = find_index_by_name_or_prefix(&player.inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;
        let item = player.inventory.remove(idx);
        let price = (item.price / 2).max(1);
        player.money += price;
        Ok(format!("You sell the {} for {price} fragments.", item.name))
    }

    pub fn deposit_item(&mut self, player_name: &str, item_name: &str) -> MudResult<String> {
        self.require_archive(player_name)?;
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).unwrap();
        let idx = find_index_by_name_or_prefix(&player.inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;
        let item = player.inventory.remove(idx);
        let name = item.name.clone();
        player.bank.push(item);
        Ok(format!("You deposit the {name}."))
    }

    pub fn withdraw_item(&mut self, player_name: &str, item_name: &str, max_inventory: usize) -> MudResult<String> {
        self.require_archive(player_name)?;
        let key = player_name.to_ascii_lowercase();
        let player = self.players.get_mut(&key).unwrap();
        if player.inventory.len() >= max_inventory {
            return Err(MudError::ResourceLimit("your inventory is full".to_string()));
        }
        let idx = find_index_by_name_or_prefix(&player.bank, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}' in storage")))?;
        let item = player.bank.remove(idx);
        let name = item.name.clone();
        player.inventory.push(item);
        Ok(format!("You withdraw the {name}."))
    }

    pub fn show_storage(&self, player_name: &str) -> MudResult<String> {
        self.require_archive(player_name)?;
        let player = self.player(player_name).unwrap();
        if player.bank.is_empty() {
            return Ok("Your storage locker is empty.".to_string());
        }
        let mut out = String::from("Storage:\n");
        for item in &player.bank {
            out.push_str(&format!("  {}\n", item.name));
        }
        Ok(out)
    }

    fn require_archive(&self, player_name: &str) -> MudResult<()> {
        let player = self.player(player_name).ok_or_else(|| MudError::NotFound("player".into()))?;
        if player.room_id != "construct_archive" {
            return Err(MudError::Forbidden("you must be in the Construct Archive".to_string()));
        }
        Ok(())
    }

    pub fn give_item(&mut self, player_name: &str, item_name: &str, npc_id: &str) -> MudResult<String> {
        let key = player_name.to_ascii_lowercase();
        let room_id = self.players.get(&key).ok_or_else(|| MudError::NotFound("player".into()))?.room_id.clone();

        let idx = find_index_by_name_or_prefix(&self.players.get(&key).unwrap().inventory, item_name)
            .ok_or_else(|| MudError::NotFound(format!("you don't have '{item_name}'")))?;
        let item_id = self.players.get(&key).unwrap().inventory[idx].id.clone();

        let room = self.rooms.get_mut(&room_id).ok_or_else(|| MudError::Data("bad room".into()))?;
        let npc = room.npcs.get_mut(npc_id).ok_or_else(|| MudError::NotFound("no such NPC here".to_string()))?;

        let completes_quest = npc
            .quest
            .as_ref()
            .map(|q| item_id == q.wanted_item || item_id.starts_with(&q.wanted_item))
            .unwrap_or(false);

        let player = self.players.get_mut(&key).unwrap();
        let item = player.inventory.remove(idx);

        if completes_quest {
            let quest = npc.quest.take().unwrap();
            player.xp += quest.xp_reward;
            player.level_up_if_ready();
            Ok(format!("{} {}", npc.name, quest.reward_message))
        } else {
            let room = self.rooms.get_mut(&room_id).unwrap();
            room.items.insert(item.id.clone(), item);
            Ok("They don't seem interested in that.".to_string())
        }
    }

    // ---- chat ---------------------------------------------------------

    pub fn broadcast(&self, room_id: &str, text: &str, exclude: Option<&str>) -> Vec<Delivery> {
        self.online_names_in_room(room_id)
            .into_iter()
            .filter(|n| exclude.map(|e| !n.eq_ignore_ascii_case(e)).unwrap_or(true))
            .map(|n| Delivery::new(n, text.to_string()))
            .collect()
    }

    pub fn gossip(&self, text: &str) -> Vec<Delivery> {
        self.players.values().map(|p| Delivery::new(p.name.clone(), text.to_string())).collect()
    }

    pub fn tell(&self, from: &str, to: &str, body: &str) -> MudResult<(Delivery, Delivery)> {
        let recipient = self
            .players
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(to))
            .ok_or_else(|| MudError::NotFound(format!("'{to}' is not online")))?;
        let to_msg = Delivery::new(recipient.name.clone(), format!("{from} tells you: {body}"));
        let confirm = Delivery::new(from, format!("You tell {}: {body}", recipient.name));
        Ok((to_msg, confirm))
    }

    /// `say <text>` also scans NPC dialogue triggers for keyword matches,
    /// per §4.10.
    pub fn say(&self, player_name: &str, text: &str) -> MudResult<Vec<Delivery>> {
        let room_id = self.player(player_name).ok_or_else(|| MudError::NotFound("player".into()))?.room_id.clone();
        let mut deliveries = self.broadcast(&room_id, &format!("{player_name} says: {text}"), None);

        let lowered = text.to_ascii_lowercase();
        if let Some(room) = self.rooms.get(&room_id) {
            for npc in room.npcs.values() {
                if let Some(triggers) = self.dialogue.get(&npc.id) {
                    for (keyword, reply) in triggers {
                        if lowered.contains(&keyword.to_ascii_lowercase()) {
                            deliveries.extend(self.broadcast(&room_id, &format!("{}: {reply}", npc.name), None));
                        }
                    }
                }
            }
        }
        Ok(deliveries)
    }

    // ---- respawn / NPC death --------------------------------------------

    pub(crate) fn enqueue_dead_npc(&mut self, npc: Npc) {
        self.dead_npcs.push(DeadNpc { npc });
    }

    /// Respawn sweep (§4.9 step 1): clears death state on NPCs dead for
    /// longer than 30s and reinserts them into their home room.
    pub fn respawn_sweep(&mut self) {
        let now = Instant::now();
        let mut still_pending = Vec::new();
        for dead in self.dead_npcs.drain(..) {
            let ready = dead
                .npc
                .death_time
                .map(|t| now.duration_since(t) >= RESPAWN_DELAY)
                .unwrap_or(true);
            if ready {
                let mut npc = dead.npc;
                npc.respawn();
                let home = npc.home_room.clone();
                if let Some(room) = self.rooms.get_mut(&home) {
                    room.npcs.insert(npc.id.clone(), npc);
                } else {
                    log::warn!("NPC '{}' has no valid home room '{home}'", npc.id);
                }
            } else {
                still_pending.push(dead);
            }
        }
        self.dead_npcs = still_pending;
    }

    /// Rolls a fresh loot instance from a template id, applying the rarity
    /// table (§4.9.1). Merchants never roll rarity; this is only used for
    /// combat drops.
    pub fn roll_loot(&mut self, template_id: &str) -> Option<Item> {
        let template = self.item_templates.get(template_id)?.clone();
        let roll = rand::thread_rng().gen_range(0..100u8);
        let rarity = match roll {
            0..=75 => Rarity::Common,
            76..=90 => Rarity::Uncommon,
            91..=98 => Rarity::Rare,
            _ => Rarity::Legendary,
        };
        let suffix = self.fresh_instance_suffix();
        let instance = template.instantiate(&suffix);
        Some(apply_rarity(instance, rarity))
    }

    pub fn drop_into_room(&mut self, room_id: &str, item: Item) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.items.insert(item.id.clone(), item);
        }
    }
}

fn find_paired_by_name_or_prefix(pairs: &[(&str, &str)], query: &str) -> Option<String> {
    let query_lower = query.to_ascii_lowercase();

    // Exact id match first, then first insertion-order substring match on
    // name — deterministic resolution of the ambiguity the spec notes as a
    // possibly-buggy but preserved source behavior (§9).
    for (id, _) in pairs {
        if id.eq_ignore_ascii_case(&query_lower) {
            return Some(id.to_string());
        }
    }
    for (id, name) in pairs {
        if name.to_ascii_lowercase().contains(&query_lower) {
            return Some(id.to_string());
        }
    }
    None
}

fn find_index_by_name_or_prefix(items: &[Item], query: &str) -> Option<usize> {
    let query_lower = query.to_ascii_lowercase();
    if let Some(idx) = items.iter().position(|i| i.id.eq_ignore_ascii_case(&query_lower)) {
        return Some(idx);
    }
    items.iter().position(|i| i.name.to_ascii_lowercase().contains(&query_lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn storage(name: &str) -> Storage {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mud-core-world-test-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        Storage::new(dir)
    }

    fn with_world(name: &str) -> World {
        World::load(&storage(name))
    }

    #[test]
    fn inventory_cap_enforced() {
        let mut world = with_world("inv-cap");
        world.insert_player(Player::new_default("neo"));
        world.rooms.get_mut(SPAWN_ROOM).unwrap().items.insert(
            "phone".to_string(),
            Item {
                id: "phone".into(),
                name: "Phone".into(),
                description: String::new(),
                slot: None,
                kind: None,
                effect: None,
                damage: 0,
                armor: 0,
                price: 5,
                rarity: 0,
                durability: None,
            },
        );
        for i in 0..20 {
            world.player_mut("neo").unwrap().inventory.push(Item {
                id: format!("filler{i}"),
                name: format!("Filler {i}"),
                description: String::new(),
                slot: None,
                kind: None,
                effect: None,
                damage: 0,
                armor: 0,
                price: 1,
                rarity: 0,
                durability: None,
            });
        }
        let err = world.get_item("neo", "phone", 20).unwrap_err();
        assert!(matches!(err, MudError::ResourceLimit(_)));
        assert_eq!(world.player("neo").unwrap().inventory.len(), 20);

        world.drop_item("neo", "filler0").unwrap();
        assert!(world.get_item("neo", "phone", 20).is_ok());
    }

    #[test]
    fn recall_from_void_resets_room() {
        let mut world = with_world("recall-void");
        let mut player = Player::new_default("neo");
        player.room_id = "nonexistent_room".to_string();
        world.insert_player(player);

        let err = world.look("neo").unwrap_err();
        assert!(matches!(err, MudError::Data(_)));

        let player = world.player_mut("neo").unwrap();
        player.room_id = RECALL_ROOM.to_string();
        player.combat_state = CombatState::Idle;
        player.combat_target = None;
        assert_eq!(world.player("neo").unwrap().room_id, "dojo");
    }

    #[test]
    fn give_item_completes_quest_on_wanted_item_prefix() {
        let mut world = with_world("quest");
        let mut player = Player::new_default("neo");
        player.inventory.push(Item {
            id: "phone#abc123".into(),
            name: "Phone".into(),
            description: String::new(),
            slot: None,
            kind: None,
            effect: None,
            damage: 0,
            armor: 0,
            price: 5,
            rarity: 0,
            durability: None,
        });
        world.insert_player(player);

        let room = world.rooms.get_mut(SPAWN_ROOM).unwrap();
        room.npcs.insert(
            "fixer".to_string(),
            Npc {
                id: "fixer".into(),
                name: "The Fixer".into(),
                description: String::new(),
                home_room: SPAWN_ROOM.into(),
                current_room: SPAWN_ROOM.into(),
                hp: 10,
                max_hp: 10,
                damage: 0,
                ac: 0,
                xp: 0,
                drop_money: 0,
                vendor: false,
                vendor_inventory: vec![],
                aggro: false,
                quest: Some(QuestOffer {
                    wanted_item: "phone".into(),
                    xp_reward: 50,
                    reward_message: "hands you fragments.".into(),
                }),
                agent: false,
                hunted_player: None,
                loot: vec![],
                state: CombatState::Idle,
                dead: false,
                death_time: None,
            },
        );

        let msg = world.give_item("neo", "phone", "fixer").unwrap();
        assert!(msg.contains("fragments"));
        assert_eq!(world.player("neo").unwrap().xp, 50);
    }
}
