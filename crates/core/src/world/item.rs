use serde::{Deserialize, Serialize};

use crate::codec::Rarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Hand,
    Body,
    Head,
}

impl EquipSlot {
    pub fn parse(s: &str) -> Option<EquipSlot> {
        match s.to_ascii_lowercase().as_str() {
            "hand" => Some(EquipSlot::Hand),
            "body" => Some(EquipSlot::Body),
            "head" => Some(EquipSlot::Head),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Consumable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub slot: Option<EquipSlot>,
    pub kind: Option<ItemKind>,
    /// (effect tag, magnitude) for consumables, e.g. ("heal", 20).
    pub effect: Option<(String, i32)>,
    pub damage: i32,
    pub armor: i32,
    pub price: i32,
    pub rarity: u8,
    pub durability: Option<(i32, i32)>,
}

impl Item {
    /// Stamps a fresh unique instance id onto a template clone, per the
    /// invariant that instances get per-instance identity while templates
    /// stay immutable.
    pub fn instantiate(&self, unique_suffix: &str) -> Item {
        let mut inst = self.clone();
        inst.id = format!("{}#{}", self.id, unique_suffix);
        inst
    }

    pub fn rarity(&self) -> Rarity {
        Rarity::from_u8(self.rarity)
    }
}

/// Applies a rarity roll to a template clone: prefixes the name, bumps
/// damage/armor, and multiplies price, per §4.9.1.
pub fn apply_rarity(mut item: Item, rarity: Rarity) -> Item {
    let (prefix, dmg, armor, price_mul) = match rarity {
        Rarity::Common => ("", 0, 0, 1),
        Rarity::Uncommon => ("Uncommon ", 1, 1, 2),
        Rarity::Rare => ("Rare ", 2, 2, 5),
        Rarity::Legendary => ("Legendary ", 4, 4, 10),
    };
    if !prefix.is_empty() {
        item.name = format!("{prefix}{}", item.name);
    }
    item.damage += dmg;
    item.armor += armor;
    item.price *= price_mul;
    item.rarity = rarity as u8;
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Item {
        Item {
            id: "phone".to_string(),
            name: "Phone".to_string(),
            description: "A phone.".to_string(),
            slot: None,
            kind: None,
            effect: None,
            damage: 0,
            armor: 0,
            price: 10,
            rarity: 0,
            durability: None,
        }
    }

    #[test]
    fn instantiate_gets_unique_id_but_keeps_template_intact() {
        let template = base();
        let inst = template.instantiate("abc123");
        assert_ne!(inst.id, template.id);
        assert!(inst.id.starts_with("phone"));
        assert_eq!(template.id, "phone");
    }

    #[test]
    fn rarity_application_scales_stats_and_price() {
        let item = apply_rarity(base(), Rarity::Rare);
        assert_eq!(item.name, "Rare Phone");
        assert_eq!(item.damage, 2);
        assert_eq!(item.armor, 2);
        assert_eq!(item.price, 50);
    }
}
