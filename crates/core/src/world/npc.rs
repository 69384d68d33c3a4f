use std::time::Instant;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatState {
    Idle,
    Combat,
    /// Player-only: the next combat round deals double damage, then the
    /// state reverts to `Combat` (§4.9, the `focus` command).
    Focused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestOffer {
    pub wanted_item: String,
    pub xp_reward: i32,
    pub reward_message: String,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub description: String,
    pub home_room: String,
    pub current_room: String,
    pub hp: i32,
    pub max_hp: i32,
    /// Maximum roll of the NPC's attack dice (damage is `uniform(1..=damage)`).
    pub damage: i32,
    pub ac: i32,
    pub xp: i32,
    pub drop_money: i32,
    pub vendor: bool,
    pub vendor_inventory: Vec<String>,
    pub aggro: bool,
    pub quest: Option<QuestOffer>,
    pub agent: bool,
    pub hunted_player: Option<String>,
    pub loot: Vec<String>,
    pub state: CombatState,
    pub dead: bool,
    pub death_time: Option<Instant>,
}

impl Npc {
    pub fn is_attackable(&self) -> bool {
        !self.vendor && !self.dead
    }

    /// On load, NPCs with an inconsistent HP are silently repaired.
    pub fn repair_hp_defaults(&mut self, default_hp: i32) {
        if self.max_hp < self.hp || self.hp <= 0 {
            log::warn!(
                "repairing NPC '{}' with inconsistent HP ({}/{}) to defaults",
                self.id,
                self.hp,
                self.max_hp
            );
            self.max_hp = self.max_hp.max(default_hp);
            self.hp = self.max_hp;
        }
    }

    pub fn mark_dead(&mut self) {
        self.dead = true;
        self.death_time = Some(Instant::now());
        self.state = CombatState::Idle;
    }

    pub fn respawn(&mut self) {
        self.dead = false;
        self.death_time = None;
        self.hp = self.max_hp;
        self.state = CombatState::Idle;
        self.current_room = self.home_room.clone();
    }
}

/// On-disk representation of an NPC, used only by the world persistence
/// layer (§6); the runtime `Npc` holds non-serializable fields like
/// `death_time` and is rehydrated from this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub home_room: String,
    pub current_room: String,
    pub hp: i32,
    pub max_hp: i32,
    pub damage: i32,
    pub ac: i32,
    pub xp: i32,
    pub drop_money: i32,
    #[serde(default)]
    pub vendor: bool,
    #[serde(default)]
    pub vendor_inventory: Vec<String>,
    #[serde(default)]
    pub aggro: bool,
    #[serde(default)]
    pub quest: Option<QuestOffer>,
    #[serde(default)]
    pub agent: bool,
    #[serde(default)]
    pub loot: Vec<String>,
}

impl From<NpcRecord> for Npc {
    fn from(r: NpcRecord) -> Self {
        let mut npc = Npc {
            id: r.id,
            name: r.name,
            description: r.description,
            home_room: r.home_room.clone(),
            current_room: r.current_room,
            hp: r.hp,
            max_hp: r.max_hp,
            damage: r.damage,
            ac: r.ac,
            xp: r.xp,
            drop_money: r.drop_money,
            vendor: r.vendor,
            vendor_inventory: r.vendor_inventory,
            aggro: r.aggro,
            quest: r.quest,
            agent: r.agent,
            hunted_player: None,
            loot: r.loot,
            state: CombatState::Idle,
            dead: false,
            death_time: None,
        };
        npc.repair_hp_defaults(50);
        npc
    }
}

impl From<&Npc> for NpcRecord {
    fn from(n: &Npc) -> Self {
        NpcRecord {
            id: n.id.clone(),
            name: n.name.clone(),
            description: n.description.clone(),
            home_room: n.home_room.clone(),
            current_room: n.current_room.clone(),
            hp: n.hp,
            max_hp: n.max_hp,
            damage: n.damage,
            ac: n.ac,
            xp: n.xp,
            drop_money: n.drop_money,
            vendor: n.vendor,
            vendor_inventory: n.vendor_inventory.clone(),
            aggro: n.aggro,
            quest: n.quest.clone(),
            agent: n.agent,
            loot: n.loot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_repairs_inconsistent_hp() {
        let record = NpcRecord {
            id: "rat".into(),
            name: "Rat".into(),
            description: "A rat.".into(),
            home_room: "r1".into(),
            current_room: "r1".into(),
            hp: -5,
            max_hp: 10,
            damage: 2,
            ac: 5,
            xp: 1,
            drop_money: 0,
            vendor: false,
            vendor_inventory: vec![],
            aggro: false,
            quest: None,
            agent: false,
            loot: vec![],
        };
        let npc: Npc = record.into();
        assert_eq!(npc.hp, npc.max_hp);
        assert!(npc.hp > 0);
    }

    #[test]
    fn merchant_is_not_attackable() {
        let record = NpcRecord {
            id: "vendor".into(),
            name: "Vendor".into(),
            description: "".into(),
            home_room: "r1".into(),
            current_room: "r1".into(),
            hp: 10,
            max_hp: 10,
            damage: 0,
            ac: 0,
            xp: 0,
            drop_money: 0,
            vendor: true,
            vendor_inventory: vec![],
            aggro: false,
            quest: None,
            agent: false,
            loot: vec![],
        };
        let npc: Npc = record.into();
        assert!(!npc.is_attackable());
    }
}
