use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::Item;
use super::npc::{Npc, NpcRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

// `Direction` is the small, finite key set the reverse-direction rule is
// keyed on (§9: "a small enum-keyed lookup, not a string computation"). The
// room exit table itself stays a `HashMap<String, String>` since builder-
// created exits can carry an arbitrary custom name (e.g. `back`); only the
// six cardinal directions participate in the N<->S/E<->W/U<->D reversal.
impl Direction {
    pub fn parse(s: &str) -> Option<Direction> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            "up" | "u" => Some(Direction::Up),
            "down" | "dn" | "d" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn reverse(self) -> &'static str {
        match self {
            Direction::North => "south",
            Direction::South => "north",
            Direction::East => "west",
            Direction::West => "east",
            Direction::Up => "down",
            Direction::Down => "up",
        }
    }
}

/// N<->S, E<->W, U<->D; any direction name outside that set reverses to the
/// generic `back` exit, per spec.
pub fn reverse_exit_name(dir: &str) -> &'static str {
    match Direction::parse(dir) {
        Some(d) => d.reverse(),
        None => "back",
    }
}

pub struct Room {
    pub id: String,
    pub description: String,
    pub exits: HashMap<String, String>,
    pub symbol: char,
    pub color: String,
    pub items: HashMap<String, Item>,
    pub npcs: HashMap<String, Npc>,
    pub has_phone: bool,
}

impl Room {
    pub fn brief_description(&self) -> String {
        let truncated = match self.description.find(['.', '!', '?']) {
            Some(idx) => &self.description[..=idx],
            None => &self.description,
        };
        if truncated.chars().count() > 50 {
            truncated.chars().take(50).collect::<String>() + "..."
        } else {
            truncated.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub description: String,
    pub exits: HashMap<String, String>,
    #[serde(default = "default_symbol")]
    pub symbol: char,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub npcs: Vec<NpcRecord>,
    #[serde(default)]
    pub has_phone: bool,
}

fn default_symbol() -> char {
    '.'
}

fn default_color() -> String {
    "white".to_string()
}

impl RoomRecord {
    pub fn into_room(self, id: String) -> Room {
        let items = self
            .items
            .into_iter()
            .map(|i| (i.id.clone(), i))
            .collect();
        let npcs = self
            .npcs
            .into_iter()
            .map(Npc::from)
            .map(|n| (n.id.clone(), n))
            .collect();
        Room {
            id,
            description: self.description,
            exits: self.exits,
            symbol: self.symbol,
            color: self.color,
            items,
            npcs,
            has_phone: self.has_phone,
        }
    }
}

impl From<&Room> for RoomRecord {
    fn from(r: &Room) -> Self {
        RoomRecord {
            description: r.description.clone(),
            exits: r.exits.clone(),
            symbol: r.symbol,
            color: r.color.clone(),
            items: r.items.values().cloned().collect(),
            npcs: r.npcs.values().map(NpcRecord::from).collect(),
            has_phone: r.has_phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_direction_table() {
        assert_eq!(Direction::North.reverse(), "south");
        assert_eq!(Direction::Up.reverse(), "down");
        assert_eq!(reverse_exit_name("crawlspace"), "back");
    }

    #[test]
    fn brief_description_truncates_at_sentence() {
        let room = Room {
            id: "r".into(),
            description: "A long hallway. It smells of ozone and old circuitry beyond measure."
                .into(),
            exits: HashMap::new(),
            symbol: '.',
            color: "white".into(),
            items: HashMap::new(),
            npcs: HashMap::new(),
            has_phone: false,
        };
        assert_eq!(room.brief_description(), "A long hallway.");
    }
}
