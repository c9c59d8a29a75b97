//! Static equipment catalog.
//!
//! Weapons, armor, shields, adventuring gear and mounts that inventory
//! strings are resolved against. Lookups are case-insensitive exact name
//! matches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weapon damage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
        }
    }
}

/// Weapon property tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponProperty {
    Light,
    OneHanded,
    TwoHanded,
    Thrown,
    Ranged,
    Reach,
    Finesse,
    Double,
    Ammunition,
}

impl WeaponProperty {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponProperty::Light => "Light",
            WeaponProperty::OneHanded => "One-Handed",
            WeaponProperty::TwoHanded => "Two-Handed",
            WeaponProperty::Thrown => "Thrown",
            WeaponProperty::Ranged => "Ranged",
            WeaponProperty::Reach => "Reach",
            WeaponProperty::Finesse => "Finesse",
            WeaponProperty::Double => "Double",
            WeaponProperty::Ammunition => "Ammunition",
        }
    }
}

impl fmt::Display for WeaponProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Damage dice expression for a Medium wielder.
    pub damage: String,
    pub critical: String,
    pub damage_type: DamageType,
    pub range_increment_ft: Option<u32>,
    pub properties: Vec<WeaponProperty>,
}

impl WeaponStats {
    pub fn has(&self, property: WeaponProperty) -> bool {
        self.properties.contains(&property)
    }
}

/// Shared by armor and shields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorStats {
    pub armor_bonus: i32,
    /// `None` means the piece never limits Dexterity.
    pub max_dex: Option<i32>,
    /// Zero or negative.
    pub check_penalty: i32,
    pub spell_failure_pct: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountStats {
    pub speed_ft: u32,
}

/// Category-specific part of a catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum ItemKind {
    Weapon(WeaponStats),
    Armor(ArmorStats),
    Shield(ArmorStats),
    Gear,
    Mount(MountStats),
}

impl ItemKind {
    pub fn category(&self) -> &'static str {
        match self {
            ItemKind::Weapon(_) => "Weapon",
            ItemKind::Armor(_) => "Armor",
            ItemKind::Shield(_) => "Shield",
            ItemKind::Gear => "Gear",
            ItemKind::Mount(_) => "Mount",
        }
    }
}

/// A static catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub subcategory: String,
    pub price_gp: f64,
    pub weight_lb: f64,
    pub description: String,
    pub kind: ItemKind,
}

impl CatalogItem {
    pub fn gear(name: &str, subcategory: &str, price_gp: f64, weight_lb: f64) -> Self {
        Self {
            name: name.to_string(),
            subcategory: subcategory.to_string(),
            price_gp,
            weight_lb,
            description: String::new(),
            kind: ItemKind::Gear,
        }
    }

    pub fn weapon(
        name: &str,
        subcategory: &str,
        price_gp: f64,
        weight_lb: f64,
        damage: &str,
        critical: &str,
        damage_type: DamageType,
    ) -> Self {
        Self {
            kind: ItemKind::Weapon(WeaponStats {
                damage: damage.to_string(),
                critical: critical.to_string(),
                damage_type,
                range_increment_ft: None,
                properties: Vec::new(),
            }),
            ..Self::gear(name, subcategory, price_gp, weight_lb)
        }
    }

    pub fn armor(
        name: &str,
        subcategory: &str,
        price_gp: f64,
        weight_lb: f64,
        armor_bonus: i32,
        max_dex: Option<i32>,
        check_penalty: i32,
        spell_failure_pct: u32,
    ) -> Self {
        let stats = ArmorStats {
            armor_bonus,
            max_dex,
            check_penalty,
            spell_failure_pct,
        };
        Self {
            kind: if subcategory == "Shield" {
                ItemKind::Shield(stats)
            } else {
                ItemKind::Armor(stats)
            },
            ..Self::gear(name, subcategory, price_gp, weight_lb)
        }
    }

    pub fn mount(name: &str, price_gp: f64, speed_ft: u32) -> Self {
        Self {
            kind: ItemKind::Mount(MountStats { speed_ft }),
            ..Self::gear(name, "Mount", price_gp, 0.0)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_properties(mut self, properties: &[WeaponProperty]) -> Self {
        if let ItemKind::Weapon(stats) = &mut self.kind {
            stats.properties = properties.to_vec();
        }
        self
    }

    pub fn with_range(mut self, increment_ft: u32) -> Self {
        if let ItemKind::Weapon(stats) = &mut self.kind {
            stats.range_increment_ft = Some(increment_ft);
        }
        self
    }

    pub fn category(&self) -> &'static str {
        self.kind.category()
    }
}

/// A name-indexed collection of catalog records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// The built-in equipment tables.
    pub fn standard() -> &'static Catalog {
        &*STANDARD_CATALOG
    }

    /// Case-insensitive exact name match.
    pub fn find(&self, name: &str) -> Option<&CatalogItem> {
        let name = name.trim();
        self.items.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Every record of one category, in table order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CatalogItem> + 'a {
        self.items
            .iter()
            .filter(move |i| i.category().eq_ignore_ascii_case(category))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

use DamageType::{Bludgeoning, Piercing, Slashing};
use WeaponProperty::*;

lazy_static::lazy_static! {
    static ref STANDARD_CATALOG: Catalog = Catalog::new(standard_items());
}

fn standard_items() -> Vec<CatalogItem> {
    let mut items = Vec::new();
    items.extend(weapons());
    items.extend(armor());
    items.extend(gear());
    items.extend(mounts());
    items
}

fn weapons() -> Vec<CatalogItem> {
    vec![
        // Simple
        CatalogItem::weapon("Dagger", "Simple Light", 2.0, 1.0, "1d4", "19-20/x2", Piercing)
            .with_properties(&[Light, Thrown, Finesse])
            .with_range(10),
        CatalogItem::weapon("Sickle", "Simple Light", 6.0, 2.0, "1d6", "x2", Slashing)
            .with_properties(&[Light]),
        CatalogItem::weapon("Light Mace", "Simple Light", 5.0, 4.0, "1d6", "x2", Bludgeoning)
            .with_properties(&[Light]),
        CatalogItem::weapon("Club", "Simple One-Handed", 0.0, 3.0, "1d6", "x2", Bludgeoning)
            .with_properties(&[OneHanded, Thrown])
            .with_range(10),
        CatalogItem::weapon("Heavy Mace", "Simple One-Handed", 12.0, 8.0, "1d8", "x2", Bludgeoning)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Morningstar", "Simple One-Handed", 8.0, 6.0, "1d8", "x2", Bludgeoning)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Shortspear", "Simple One-Handed", 1.0, 3.0, "1d6", "x2", Piercing)
            .with_properties(&[OneHanded, Thrown])
            .with_range(20),
        CatalogItem::weapon("Quarterstaff", "Simple Two-Handed", 0.0, 4.0, "1d6", "x2", Bludgeoning)
            .with_properties(&[TwoHanded, Double]),
        CatalogItem::weapon("Spear", "Simple Two-Handed", 2.0, 6.0, "1d8", "x3", Piercing)
            .with_properties(&[TwoHanded, Thrown])
            .with_range(20),
        CatalogItem::weapon("Light Crossbow", "Simple Ranged", 35.0, 4.0, "1d8", "19-20/x2", Piercing)
            .with_properties(&[Ranged, Ammunition])
            .with_range(80),
        CatalogItem::weapon("Heavy Crossbow", "Simple Ranged", 50.0, 8.0, "1d10", "19-20/x2", Piercing)
            .with_properties(&[Ranged, Ammunition, TwoHanded])
            .with_range(120),
        CatalogItem::weapon("Javelin", "Simple Ranged", 1.0, 2.0, "1d6", "x2", Piercing)
            .with_properties(&[Ranged, Thrown])
            .with_range(30),
        CatalogItem::weapon("Sling", "Simple Ranged", 0.0, 0.0, "1d4", "x2", Bludgeoning)
            .with_properties(&[Ranged, Ammunition])
            .with_range(50),
        // Martial
        CatalogItem::weapon("Handaxe", "Martial Light", 6.0, 3.0, "1d6", "x3", Slashing)
            .with_properties(&[Light]),
        CatalogItem::weapon("Short Sword", "Martial Light", 10.0, 2.0, "1d6", "19-20/x2", Piercing)
            .with_properties(&[Light]),
        CatalogItem::weapon("Battleaxe", "Martial One-Handed", 10.0, 6.0, "1d8", "x3", Slashing)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Longsword", "Martial One-Handed", 15.0, 4.0, "1d8", "19-20/x2", Slashing)
            .with_properties(&[OneHanded])
            .with_description("A straight double-edged blade, the classic knightly sword."),
        CatalogItem::weapon("Rapier", "Martial One-Handed", 20.0, 2.0, "1d6", "18-20/x2", Piercing)
            .with_properties(&[OneHanded, Finesse]),
        CatalogItem::weapon("Scimitar", "Martial One-Handed", 15.0, 4.0, "1d6", "18-20/x2", Slashing)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Warhammer", "Martial One-Handed", 12.0, 5.0, "1d8", "x3", Bludgeoning)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Flail", "Martial One-Handed", 8.0, 5.0, "1d8", "x2", Bludgeoning)
            .with_properties(&[OneHanded]),
        CatalogItem::weapon("Falchion", "Martial Two-Handed", 75.0, 8.0, "2d4", "18-20/x2", Slashing)
            .with_properties(&[TwoHanded]),
        CatalogItem::weapon("Greataxe", "Martial Two-Handed", 20.0, 12.0, "1d12", "x3", Slashing)
            .with_properties(&[TwoHanded]),
        CatalogItem::weapon("Greatsword", "Martial Two-Handed", 50.0, 8.0, "2d6", "19-20/x2", Slashing)
            .with_properties(&[TwoHanded]),
        CatalogItem::weapon("Glaive", "Martial Two-Handed", 8.0, 10.0, "1d10", "x3", Slashing)
            .with_properties(&[TwoHanded, Reach]),
        CatalogItem::weapon("Halberd", "Martial Two-Handed", 10.0, 12.0, "1d10", "x3", Slashing)
            .with_properties(&[TwoHanded]),
        CatalogItem::weapon("Longspear", "Martial Two-Handed", 5.0, 9.0, "1d8", "x3", Piercing)
            .with_properties(&[TwoHanded, Reach]),
        CatalogItem::weapon("Shortbow", "Martial Ranged", 30.0, 2.0, "1d6", "x3", Piercing)
            .with_properties(&[Ranged, Ammunition, TwoHanded])
            .with_range(60),
        CatalogItem::weapon("Longbow", "Martial Ranged", 75.0, 3.0, "1d8", "x3", Piercing)
            .with_properties(&[Ranged, Ammunition, TwoHanded])
            .with_range(100),
        CatalogItem::weapon("Composite Longbow", "Martial Ranged", 100.0, 3.0, "1d8", "x3", Piercing)
            .with_properties(&[Ranged, Ammunition, TwoHanded])
            .with_range(110),
    ]
}

fn armor() -> Vec<CatalogItem> {
    vec![
        CatalogItem::armor("Padded Armor", "Light Armor", 5.0, 10.0, 1, Some(8), 0, 5),
        CatalogItem::armor("Leather Armor", "Light Armor", 10.0, 15.0, 2, Some(6), 0, 10),
        CatalogItem::armor("Studded Leather", "Light Armor", 25.0, 20.0, 3, Some(5), -1, 15),
        CatalogItem::armor("Chain Shirt", "Light Armor", 100.0, 25.0, 4, Some(4), -2, 20),
        CatalogItem::armor("Hide Armor", "Medium Armor", 15.0, 25.0, 3, Some(4), -3, 20),
        CatalogItem::armor("Scale Mail", "Medium Armor", 50.0, 30.0, 4, Some(3), -4, 25),
        CatalogItem::armor("Chainmail", "Medium Armor", 150.0, 40.0, 5, Some(2), -5, 30),
        CatalogItem::armor("Breastplate", "Medium Armor", 200.0, 30.0, 5, Some(3), -4, 25),
        CatalogItem::armor("Splint Mail", "Heavy Armor", 200.0, 45.0, 6, Some(0), -7, 40),
        CatalogItem::armor("Banded Mail", "Heavy Armor", 250.0, 35.0, 6, Some(1), -6, 35),
        CatalogItem::armor("Half-Plate", "Heavy Armor", 600.0, 50.0, 7, Some(0), -7, 40),
        CatalogItem::armor("Full Plate", "Heavy Armor", 1500.0, 50.0, 8, Some(1), -6, 35),
        CatalogItem::armor("Buckler", "Shield", 15.0, 5.0, 1, None, -1, 5),
        CatalogItem::armor("Light Wooden Shield", "Shield", 3.0, 5.0, 1, None, -1, 5),
        CatalogItem::armor("Light Steel Shield", "Shield", 9.0, 6.0, 1, None, -1, 5),
        CatalogItem::armor("Heavy Wooden Shield", "Shield", 7.0, 10.0, 2, None, -2, 15),
        CatalogItem::armor("Heavy Steel Shield", "Shield", 20.0, 15.0, 2, None, -2, 15),
        CatalogItem::armor("Tower Shield", "Shield", 30.0, 45.0, 4, Some(2), -10, 50),
    ]
}

fn gear() -> Vec<CatalogItem> {
    vec![
        CatalogItem::gear("Backpack", "Adventuring Gear", 2.0, 2.0)
            .with_description("A leather pack carried on the back."),
        CatalogItem::gear("Bedroll", "Adventuring Gear", 0.1, 5.0),
        CatalogItem::gear("Blanket, Winter", "Adventuring Gear", 0.5, 3.0),
        CatalogItem::gear("Candle", "Adventuring Gear", 0.01, 0.0),
        CatalogItem::gear("Crowbar", "Adventuring Gear", 2.0, 5.0)
            .with_description("Grants a +2 circumstance bonus on Strength checks to force things open."),
        CatalogItem::gear("Flint and Steel", "Adventuring Gear", 1.0, 0.0),
        CatalogItem::gear("Grappling Hook", "Adventuring Gear", 1.0, 4.0),
        CatalogItem::gear("Hooded Lantern", "Adventuring Gear", 7.0, 2.0)
            .with_description("Sheds bright light in a 30-foot radius."),
        CatalogItem::gear("Oil Flask", "Adventuring Gear", 0.1, 1.0),
        CatalogItem::gear("Hemp Rope (50 ft.)", "Adventuring Gear", 1.0, 10.0),
        CatalogItem::gear("Silk Rope (50 ft.)", "Adventuring Gear", 10.0, 5.0),
        CatalogItem::gear("Tent", "Adventuring Gear", 10.0, 20.0),
        CatalogItem::gear("Torch", "Adventuring Gear", 0.01, 1.0)
            .with_description("Burns for 1 hour, shedding light in a 20-foot radius."),
        CatalogItem::gear("Trail Rations", "Adventuring Gear", 0.5, 1.0)
            .with_description("Food for one day."),
        CatalogItem::gear("Waterskin", "Adventuring Gear", 1.0, 4.0),
        CatalogItem::gear("Arrows (20)", "Ammunition", 1.0, 3.0)
            .with_description("A quiver of twenty arrows."),
        CatalogItem::gear("Bolts (10)", "Ammunition", 1.0, 1.0),
        CatalogItem::gear("Sling Bullets (10)", "Ammunition", 0.1, 5.0),
        CatalogItem::gear("Thieves' Tools", "Tools", 30.0, 1.0)
            .with_description("Needed to pick locks and disable devices without penalty."),
        CatalogItem::gear("Healer's Kit", "Tools", 50.0, 1.0),
        CatalogItem::gear("Spell Component Pouch", "Tools", 5.0, 2.0),
        CatalogItem::gear("Spellbook", "Tools", 15.0, 3.0),
        CatalogItem::gear("Wooden Holy Symbol", "Tools", 1.0, 0.0),
        CatalogItem::gear("Silver Holy Symbol", "Tools", 25.0, 1.0),
        CatalogItem::gear("Potion of Cure Light Wounds", "Potion", 50.0, 0.0)
            .with_description("Heals 1d8+1 hit points."),
        CatalogItem::gear("Cloak of Resistance +1", "Wondrous Item", 1000.0, 1.0)
            .with_description("+1 resistance bonus on all saving throws."),
        CatalogItem::gear("Cloak of Resistance +2", "Wondrous Item", 4000.0, 1.0)
            .with_description("+2 resistance bonus on all saving throws."),
        CatalogItem::gear("Stone of Good Luck", "Wondrous Item", 20000.0, 0.0)
            .with_description("+1 luck bonus on saving throws, ability checks and skill checks."),
    ]
}

fn mounts() -> Vec<CatalogItem> {
    vec![
        CatalogItem::mount("Mule", 8.0, 30),
        CatalogItem::mount("Pony", 30.0, 40),
        CatalogItem::mount("Light Horse", 75.0, 60),
        CatalogItem::mount("Heavy Horse", 200.0, 50),
        CatalogItem::mount("Light Warhorse", 150.0, 60),
        CatalogItem::mount("Riding Dog", 150.0, 40),
    ]
}
