// ============================================================================
// Structures : FlipItem, FlipCategory, FlipFeed
// ============================================================================
// Opportunités de flip (acheter bas / revendre haut) calculées par le backend
// à partir des moyennes mobiles SMA5. Le client ne recalcule rien, il
// affiche et classe.
// ============================================================================

use std::collections::HashMap;

use super::ItemId;

/// Une opportunité de flip
#[derive(Debug, Clone, PartialEq)]
pub struct FlipItem {
    pub item_id: ItemId,
    /// Prix d'achat moyen (SMA5)
    pub sma5_buy: f64,
    /// Prix de vente moyen (SMA5)
    pub sma5_sell: f64,
    /// sma5_sell - sma5_buy
    pub profit: f64,
    /// Présent uniquement dans la catégorie "High Margin Items"
    pub margin_percentage: Option<f64>,
}

impl FlipItem {
    pub fn tier(&self) -> ProfitTier {
        ProfitTier::of(self.profit)
    }
}

/// Niveau de profit, utilisé pour colorer les cartes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitTier {
    High,
    Medium,
    Low,
}

impl ProfitTier {
    /// > 100K : High, > 50K : Medium, sinon Low
    pub fn of(profit: f64) -> Self {
        if profit > 100_000.0 {
            Self::High
        } else if profit > 50_000.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Une catégorie de flips (High Value, Budget, Quick Flips, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct FlipCategory {
    pub name: String,
    pub description: String,
    pub count: usize,
    pub items: Vec<FlipItem>,
}

/// Flux de suggestions avec les noms déjà résolus
///
/// Les noms sont résolus AVANT la mise à jour de l'état : le consommateur
/// ne voit jamais une liste de flips sans ses noms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlipFeed {
    pub flips: Vec<FlipItem>,
    pub names: HashMap<ItemId, String>,
}

impl FlipFeed {
    pub fn name_of(&self, id: ItemId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.fallback_name())
    }

    pub fn len(&self) -> usize {
        self.flips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }
}

/// Formatte un montant en GP : 1.5M, 12.3K, 950
pub fn format_gp(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value.round() as i64)
    }
}
