use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::codec::Theme;

use super::item::{EquipSlot, Item};
use super::npc::CombatState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Class {
    Hacker,
    Rebel,
    Operator,
}

impl Class {
    pub fn from_choice(choice: &str) -> Option<Class> {
        match choice {
            "1" => Some(Class::Hacker),
            "2" => Some(Class::Rebel),
            "3" => Some(Class::Operator),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Class::Hacker => "Hacker",
            Class::Rebel => "Rebel",
            Class::Operator => "Operator",
        }
    }

    /// Starting HP and a starting body-slot item id, used at class choice.
    pub fn starting_kit(self) -> (i32, &'static str) {
        match self {
            Class::Hacker => (25, "hacker_jacket"),
            Class::Rebel => (30, "rebel_vest"),
            Class::Operator => (28, "operator_coat"),
        }
    }
}

pub struct Player {
    pub name: String,
    pub room_id: String,
    pub inventory: Vec<Item>,
    pub equipment: std::collections::HashMap<EquipSlot, Item>,
    pub bank: Vec<Item>,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub base_ac: i32,
    pub combat_state: CombatState,
    pub combat_target: Option<String>,
    pub last_attack: Option<Instant>,
    pub xp: i32,
    pub level: i32,
    pub class: Option<Class>,
    pub money: i32,
    pub crafting_skill: i32,
    pub awakened: bool,
    pub heat: u8,
    pub discovered_phones: Vec<String>,
    pub brief: bool,
    pub theme: Theme,
}

pub const SPAWN_ROOM: &str = "loading_program";
pub const RECALL_ROOM: &str = "dojo";
pub const MAX_HEAT: u8 = 100;

impl Player {
    pub fn new_default(name: &str) -> Self {
        Self {
            name: name.to_string(),
            room_id: SPAWN_ROOM.to_string(),
            inventory: Vec::new(),
            equipment: std::collections::HashMap::new(),
            bank: Vec::new(),
            hp: 20,
            max_hp: 20,
            mp: 10,
            max_mp: 10,
            strength: 10,
            base_ac: 10,
            combat_state: CombatState::Idle,
            combat_target: None,
            last_attack: None,
            xp: 0,
            level: 1,
            class: None,
            money: 0,
            crafting_skill: 0,
            awakened: false,
            heat: 0,
            discovered_phones: Vec::new(),
            brief: false,
            theme: Theme::Green,
        }
    }

    pub fn effective_ac(&self) -> i32 {
        let body = self.equipment.get(&EquipSlot::Body).map(|i| i.armor).unwrap_or(0);
        let head = self.equipment.get(&EquipSlot::Head).map(|i| i.armor).unwrap_or(0);
        self.base_ac + body + head + if self.awakened { 3 } else { 0 }
    }

    pub fn weapon_damage(&self) -> i32 {
        self.equipment.get(&EquipSlot::Hand).map(|i| i.damage).unwrap_or(0)
    }

    pub fn add_heat(&mut self, amount: u8) {
        self.heat = self.heat.saturating_add(amount).min(MAX_HEAT);
    }

    pub fn decay_heat(&mut self) {
        self.heat = self.heat.saturating_sub(1);
    }

    pub fn level_up_if_ready(&mut self) {
        while self.xp >= self.level * 1000 {
            self.level += 1;
            self.max_hp += 10;
            self.max_mp += 5;
            self.hp = self.max_hp;
            self.mp = self.max_mp;
            self.strength += 1;
        }
    }

    pub fn clamp_hp(&mut self) {
        self.hp = self.hp.clamp(0, self.max_hp);
    }

    pub fn clamp_mp(&mut self) {
        self.mp = self.mp.clamp(0, self.max_mp);
    }
}

/// On-disk representation (§6). Ephemeral fields (equipment indexing,
/// combat state, connection handle) are re-initialized on load, per spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub room_id: String,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default)]
    pub equipment: Vec<Item>,
    #[serde(default)]
    pub bank: Vec<Item>,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub base_ac: i32,
    pub xp: i32,
    pub level: i32,
    pub class: Option<Class>,
    #[serde(default)]
    pub money: i32,
    #[serde(default)]
    pub crafting_skill: i32,
    #[serde(default)]
    pub awakened: bool,
    #[serde(default)]
    pub heat: u8,
    #[serde(default)]
    pub discovered_phones: Vec<String>,
    #[serde(default)]
    pub brief: bool,
    #[serde(default = "default_theme_name")]
    pub theme: String,
}

fn default_theme_name() -> String {
    "green".to_string()
}

impl From<PlayerRecord> for Player {
    fn from(r: PlayerRecord) -> Self {
        let mut equipment = std::collections::HashMap::new();
        for item in r.equipment {
            if let Some(slot) = item.slot {
                equipment.insert(slot, item);
            }
        }
        Player {
            name: r.name,
            room_id: r.room_id,
            inventory: r.inventory,
            equipment,
            bank: r.bank,
            hp: r.hp,
            max_hp: r.max_hp,
            mp: r.mp,
            max_mp: r.max_mp,
            strength: r.strength,
            base_ac: r.base_ac,
            combat_state: CombatState::Idle,
            combat_target: None,
            last_attack: None,
            xp: r.xp,
            level: r.level,
            class: r.class,
            money: r.money,
            crafting_skill: r.crafting_skill,
            awakened: r.awakened,
            heat: r.heat,
            discovered_phones: r.discovered_phones,
            brief: r.brief,
            theme: Theme::parse(&r.theme).unwrap_or(Theme::Green),
        }
    }
}

impl From<&Player> for PlayerRecord {
    fn from(p: &Player) -> Self {
        PlayerRecord {
            name: p.name.clone(),
            room_id: p.room_id.clone(),
            inventory: p.inventory.clone(),
            equipment: p.equipment.values().cloned().collect(),
            bank: p.bank.clone(),
            hp: p.hp,
            max_hp: p.max_hp,
            mp: p.mp,
            max_mp: p.max_mp,
            strength: p.strength,
            base_ac: p.base_ac,
            xp: p.xp,
            level: p.level,
            class: p.class,
            money: p.money,
            crafting_skill: p.crafting_skill,
            awakened: p.awakened,
            heat: p.heat,
            discovered_phones: p.discovered_phones.clone(),
            brief: p.brief,
            theme: match p.theme {
                Theme::Green => "green",
                Theme::Amber => "amber",
                Theme::White => "white",
                Theme::None => "none",
            }
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_up_applies_stat_gains() {
        let mut p = Player::new_default("neo");
        p.xp = 1010;
        p.level_up_if_ready();
        assert_eq!(p.level, 2);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn effective_ac_includes_awakened_bonus() {
        let mut p = Player::new_default("neo");
        let base = p.effective_ac();
        p.awakened = true;
        assert_eq!(p.effective_ac(), base + 3);
    }
}
