//! Inventory string resolution.
//!
//! The narrative service hands back inventory as free text: `"Longsword"`,
//! `"Arrows (20) (2)"`, `"50 gp"`. Each entry resolves against the catalog
//! into a [`ParsedInventoryItem`]. Entries that match nothing still resolve,
//! to a zero-valued `Misc` item, so invented loot always renders.

use crate::catalog::{ArmorStats, Catalog, CatalogItem, ItemKind, WeaponProperty, WeaponStats};
use crate::economy::CoinUnit;
use serde::{Deserialize, Serialize};

/// Coins weigh 0.02 lb each (50 to the pound).
pub const COIN_WEIGHT_LB: f64 = 0.02;

/// What an inventory entry resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemDetails {
    Catalog(ItemKind),
    Currency { amount: f64, unit: CoinUnit },
    Unknown,
}

/// One raw inventory entry resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInventoryItem {
    pub raw: String,
    pub name: String,
    pub quantity: u32,
    pub subcategory: String,
    pub description: String,
    pub unit_price_gp: f64,
    pub unit_weight_lb: f64,
    pub total_price_gp: f64,
    pub total_weight_lb: f64,
    pub details: ItemDetails,
}

impl ParsedInventoryItem {
    /// `Weapon`, `Armor`, `Shield`, `Gear`, `Mount`, `Wealth` or `Misc`.
    pub fn category(&self) -> &'static str {
        match &self.details {
            ItemDetails::Catalog(kind) => kind.category(),
            ItemDetails::Currency { .. } => "Wealth",
            ItemDetails::Unknown => "Misc",
        }
    }

    pub fn is_currency(&self) -> bool {
        matches!(self.details, ItemDetails::Currency { .. })
    }

    pub fn weapon(&self) -> Option<&WeaponStats> {
        match &self.details {
            ItemDetails::Catalog(ItemKind::Weapon(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn armor(&self) -> Option<&ArmorStats> {
        match &self.details {
            ItemDetails::Catalog(ItemKind::Armor(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn shield(&self) -> Option<&ArmorStats> {
        match &self.details {
            ItemDetails::Catalog(ItemKind::Shield(stats)) => Some(stats),
            _ => None,
        }
    }

    /// Weapon property tags; empty for anything that isn't a weapon.
    pub fn properties(&self) -> &[WeaponProperty] {
        self.weapon().map(|w| w.properties.as_slice()).unwrap_or(&[])
    }

    pub fn is_two_handed_weapon(&self) -> bool {
        self.properties().contains(&WeaponProperty::TwoHanded)
    }

    fn from_catalog(raw: &str, item: &CatalogItem, quantity: u32) -> Self {
        let mut kind = item.kind.clone();
        // Upstream data has tagged the longsword as two-handed before.
        if item.name == "Longsword" {
            if let ItemKind::Weapon(stats) = &mut kind {
                stats.properties.retain(|p| *p != WeaponProperty::TwoHanded);
            }
        }

        let qty = f64::from(quantity);
        Self {
            raw: raw.to_string(),
            name: item.name.clone(),
            quantity,
            subcategory: item.subcategory.clone(),
            description: item.description.clone(),
            unit_price_gp: item.price_gp,
            unit_weight_lb: item.weight_lb,
            total_price_gp: item.price_gp * qty,
            total_weight_lb: item.weight_lb * qty,
            details: ItemDetails::Catalog(kind),
        }
    }

    fn unknown(raw: &str, name: &str, quantity: u32) -> Self {
        Self {
            raw: raw.to_string(),
            name: name.to_string(),
            quantity,
            subcategory: String::new(),
            description: String::new(),
            unit_price_gp: 0.0,
            unit_weight_lb: 0.0,
            total_price_gp: 0.0,
            total_weight_lb: 0.0,
            details: ItemDetails::Unknown,
        }
    }

    fn currency(raw: &str, amount: f64, unit: CoinUnit) -> Self {
        let value = amount * unit.gp_value();
        let weight = amount * COIN_WEIGHT_LB;
        Self {
            raw: raw.to_string(),
            name: raw.trim().to_string(),
            quantity: 1,
            subcategory: "Coins".to_string(),
            description: String::new(),
            unit_price_gp: value,
            unit_weight_lb: weight,
            total_price_gp: value,
            total_weight_lb: weight,
            details: ItemDetails::Currency { amount, unit },
        }
    }
}

/// Resolve every entry against the standard catalog.
pub fn parse_inventory<S: AsRef<str>>(items: &[S]) -> Vec<ParsedInventoryItem> {
    parse_inventory_with(Catalog::standard(), items)
}

/// Resolve every entry against `catalog`.
pub fn parse_inventory_with<S: AsRef<str>>(
    catalog: &Catalog,
    items: &[S],
) -> Vec<ParsedInventoryItem> {
    items
        .iter()
        .map(|raw| parse_inventory_item(catalog, raw.as_ref()))
        .collect()
}

/// Resolve a single entry. Never fails.
pub fn parse_inventory_item(catalog: &Catalog, raw: &str) -> ParsedInventoryItem {
    if let Some((amount, unit)) = parse_currency(raw) {
        return ParsedInventoryItem::currency(raw, amount, unit);
    }

    // Names like "Arrows (20)" are whole catalog entries, not a quantity.
    if let Some(item) = catalog.find(raw) {
        return ParsedInventoryItem::from_catalog(raw, item, 1);
    }

    let (name, quantity) = split_quantity(raw);
    match catalog.find(name) {
        Some(item) => ParsedInventoryItem::from_catalog(raw, item, quantity),
        None => {
            tracing::trace!(item = raw, "inventory entry not in catalog");
            ParsedInventoryItem::unknown(raw, name, quantity)
        }
    }
}

/// Sum of total weights.
pub fn total_weight(items: &[ParsedInventoryItem]) -> f64 {
    items.iter().map(|i| i.total_weight_lb).sum()
}

/// Split `"Name (qty)"` into its parts; quantity defaults to 1.
pub fn split_quantity(raw: &str) -> (&str, u32) {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_suffix(')') else {
        return (trimmed, 1);
    };
    let Some(open) = inner.rfind('(') else {
        return (trimmed, 1);
    };

    let digits = &inner[open + 1..];
    let name = inner[..open].trim_end();
    if name.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (trimmed, 1);
    }

    match digits.parse::<u32>() {
        Ok(quantity) => (name, quantity),
        Err(_) => (trimmed, 1),
    }
}

/// Recognise `"<amount> gp|sp|cp"`. The suffix must stand apart from any
/// word before it, so "Worship" is not silver.
fn parse_currency(raw: &str) -> Option<(f64, CoinUnit)> {
    let lower = raw.trim().to_ascii_lowercase();
    let unit = [CoinUnit::Gold, CoinUnit::Silver, CoinUnit::Copper]
        .into_iter()
        .find(|u| lower.ends_with(u.abbreviation()))?;

    let head = &lower[..lower.len() - unit.abbreviation().len()];
    match head.chars().last() {
        None => {}
        Some(c) if c.is_whitespace() || c.is_ascii_digit() => {}
        Some(_) => return None,
    }

    let number: String = head
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    let amount = number.parse::<f64>().unwrap_or(0.0);
    Some((amount, unit))
}
