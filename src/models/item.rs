// ============================================================================
// Structures : ItemId, ItemRecord, TrackedItem
// ============================================================================
// Identifiant canonique d'un item du Grand Exchange et ligne de la table
// paginée renvoyée par /api/items.
//
// CONCEPT RUST : Newtype pattern
// - ItemId(u32) n'est pas interchangeable avec un u32 quelconque
// - Le compilateur empêche de passer une page ou un prix à la place d'un id
// ============================================================================

use std::fmt;

/// Identifiant numérique d'un item (toujours > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Crée un identifiant, None pour 0
    pub fn new(raw: u32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Nom affiché quand le vrai nom est inconnu ou introuvable
    pub fn fallback_name(self) -> String {
        format!("Item {}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Une ligne de la table des items (snapshot d'un fetch)
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    /// Prix d'achat (low)
    pub buy: f64,
    /// Prix de vente (high)
    pub sell: f64,
    /// sell - buy, calculé par le backend
    pub margin: f64,
}

impl ItemRecord {
    pub fn new(id: ItemId, name: impl Into<String>, buy: f64, sell: f64, margin: f64) -> Self {
        Self {
            id,
            name: name.into(),
            buy,
            sell,
            margin,
        }
    }
}

/// Item suivi par le backend (liste /items), sert à préremplir le cache de noms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    pub id: ItemId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_rejects_zero() {
        assert!(ItemId::new(0).is_none());
        assert_eq!(ItemId::new(560).map(ItemId::get), Some(560));
    }

    #[test]
    fn test_fallback_name() {
        let id = ItemId::new(2).unwrap();
        assert_eq!(id.fallback_name(), "Item 2");
        assert_eq!(id.to_string(), "2");
    }
}
