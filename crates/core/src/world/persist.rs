//! File-backed persistence for the world, players, dialogue triggers, and
//! the message of the day. All writes use mode 0600 and (for the world and
//! player files) a direct write — per spec these are "per-file writes, no
//! cross-file transactionality claimed" — while the auth store (§4.5) is the
//! only file that additionally gets an atomic rename.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MudError, MudResult};

use super::item::Item;
use super::player::{Player, PlayerRecord};
use super::room::{Room, RoomRecord};

pub struct Storage {
    data_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct WorldFile {
    #[serde(rename = "Rooms")]
    rooms: HashMap<String, RoomRecord>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct DialogueFile(HashMap<String, HashMap<String, String>>);

#[derive(Debug, Serialize, Deserialize, Default)]
struct MotdFile {
    motd: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct ItemsFile {
    items: HashMap<String, Item>,
}

impl Storage {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn world_path(&self) -> PathBuf {
        self.data_dir.join("world.json")
    }

    fn players_dir(&self) -> PathBuf {
        self.data_dir.join("players")
    }

    fn player_path(&self, name: &str) -> PathBuf {
        self.players_dir().join(format!("{}.json", name.to_ascii_lowercase()))
    }

    fn dialogue_path(&self) -> PathBuf {
        self.data_dir.join("dialogue.json")
    }

    fn motd_path(&self) -> PathBuf {
        self.data_dir.join("motd.json")
    }

    fn items_path(&self) -> PathBuf {
        self.data_dir.join("items.json")
    }

    /// Loads the room table. On corrupt or missing JSON, logs a warning and
    /// falls back to a single-room world rather than failing startup.
    pub fn load_rooms(&self) -> HashMap<String, Room> {
        match fs::read_to_string(self.world_path()) {
            Ok(text) => match serde_json::from_str::<WorldFile>(&text) {
                Ok(file) => file
                    .rooms
                    .into_iter()
                    .map(|(id, record)| {
                        let room = record.into_room(id.clone());
                        (id, room)
                    })
                    .collect(),
                Err(e) => {
                    log::warn!("corrupt data/world.json ({e}); falling back to default world");
                    default_rooms()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("data/world.json not found; starting with the default world");
                default_rooms()
            }
            Err(e) => {
                log::warn!("failed to read data/world.json ({e}); falling back to default world");
                default_rooms()
            }
        }
    }

    pub fn save_rooms(&self, rooms: &HashMap<String, Room>) -> MudResult<()> {
        let file = WorldFile {
            rooms: rooms
                .iter()
                .map(|(id, room)| (id.clone(), RoomRecord::from(room)))
                .collect(),
        };
        write_json_0600(&self.world_path(), &file)
    }

    pub fn load_player(&self, name: &str) -> Option<Player> {
        let text = fs::read_to_string(self.player_path(name)).ok()?;
        match serde_json::from_str::<PlayerRecord>(&text) {
            Ok(record) => Some(record.into()),
            Err(e) => {
                log::warn!("corrupt player file for '{name}' ({e}); treating as new player");
                None
            }
        }
    }

    pub fn save_player(&self, player: &Player) -> MudResult<()> {
        fs::create_dir_all(self.players_dir())?;
        let record = PlayerRecord::from(player);
        write_json_0600(&self.player_path(&player.name), &record)
    }

    pub fn load_dialogue(&self) -> HashMap<String, HashMap<String, String>> {
        match fs::read_to_string(self.dialogue_path()) {
            Ok(text) => serde_json::from_str::<DialogueFile>(&text)
                .map(|f| f.0)
                .unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    pub fn load_motd(&self) -> Vec<String> {
        match fs::read_to_string(self.motd_path()) {
            Ok(text) => serde_json::from_str::<MotdFile>(&text)
                .map(|f| f.motd)
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Loads item templates, falling back to a small set of embedded
    /// defaults when `data/items.json` is absent (spec: optional file).
    pub fn load_item_templates(&self) -> HashMap<String, Item> {
        match fs::read_to_string(self.items_path()) {
            Ok(text) => match serde_json::from_str::<ItemsFile>(&text) {
                Ok(f) => f.items,
                Err(e) => {
                    log::warn!("corrupt data/items.json ({e}); using embedded defaults");
                    embedded_default_items()
                }
            },
            Err(_) => embedded_default_items(),
        }
    }
}

fn write_json_0600<T: Serialize>(path: &Path, value: &T) -> MudResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| MudError::Data(format!("failed to serialize {}: {e}", path.display())))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    f.write_all(json.as_bytes())?;
    set_owner_only(path)?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> MudResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> MudResult<()> {
    Ok(())
}

fn default_rooms() -> HashMap<String, Room> {
    let mut rooms = HashMap::new();
    for (id, desc) in [
        ("loading_program", "A featureless white void. You are still loading in."),
        ("dojo", "A sparring dojo with mirrored walls."),
        ("construct_archive", "Racks of humming storage drives: the Construct Archive."),
    ] {
        rooms.insert(
            id.to_string(),
            Room {
                id: id.to_string(),
                description: desc.to_string(),
                exits: HashMap::new(),
                symbol: '.',
                color: "white".to_string(),
                items: HashMap::new(),
                npcs: HashMap::new(),
                has_phone: id == "dojo",
            },
        );
    }
    rooms
}

fn embedded_default_items() -> HashMap<String, Item> {
    let mut items = HashMap::new();
    items.insert(
        "phone".to_string(),
        Item {
            id: "phone".to_string(),
            name: "Old Phone".to_string(),
            description: "A cracked analog phone. The hardline out.".to_string(),
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
    items.insert(
        "red_pill".to_string(),
        Item {
            id: "red_pill".to_string(),
            name: "Red Pill".to_string(),
            description: "A small red capsule.".to_string(),
            slot: None,
            kind: Some(super::item::ItemKind::Consumable),
            effect: Some(("awaken".to_string(), 0)),
            damage: 0,
            armor: 0,
            price: 0,
            rarity: 0,
            durability: None,
        },
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("mud-core-persist-{name}-{}", std::process::id()));
        p
    }

    #[test]
    fn missing_world_file_falls_back_to_defaults() {
        let dir = temp_dir("missing-world");
        let _ = fs::remove_dir_all(&dir);
        let storage = Storage::new(&dir);
        let rooms = storage.load_rooms();
        assert!(rooms.contains_key("dojo"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn player_round_trips() {
        let dir = temp_dir("player-roundtrip");
        let _ = fs::remove_dir_all(&dir);
        let storage = Storage::new(&dir);
        let mut player = Player::new_default("neo");
        player.xp = 42;
        storage.save_player(&player).unwrap();
        let loaded = storage.load_player("NEO").unwrap();
        assert_eq!(loaded.xp, 42);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_items_file_uses_embedded_defaults() {
        let dir = temp_dir("missing-items");
        let _ = fs::remove_dir_all(&dir);
        let storage = Storage::new(&dir);
        let items = storage.load_item_templates();
        assert!(items.contains_key("phone"));
        let _ = fs::remove_dir_all(&dir);
    }
}
