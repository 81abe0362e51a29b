// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données manipulées par la
// couche d'orchestration : items, flips, historique.
//
// Ce sont des snapshots immuables d'un fetch : rien n'est fusionné d'un
// fetch à l'autre.
// ============================================================================

pub mod flip;    // Suggestions et catégories de flips
pub mod history; // Historique de prix d'un item
pub mod item;    // Identifiant et ligne de la table des items

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazyflip::models::item::ItemId;
// On peut faire : use lazyflip::models::ItemId;
pub use flip::{format_gp, FlipCategory, FlipFeed, FlipItem, ProfitTier};
pub use history::{HistoryPoint, HistoryView};
pub use item::{ItemId, ItemRecord, TrackedItem};
