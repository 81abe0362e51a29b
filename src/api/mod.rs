// ============================================================================
// Module : api
// ============================================================================
// Client du backend FlipAssistant (prix, marges, flips, historique).
//
// Tout le calcul (SMA5, RSI, MACD, classement des flips) est fait côté
// backend : ce module se contente de requêter et de décoder, en traitant
// chaque réponse comme non fiable.
//
// CONCEPT RUST : Trait comme point de couture
// - FlipApi décrit le contrat HTTP
// - HttpFlipApi l'implémente avec reqwest
// - Les tests utilisent un MockApi (pas de réseau)
// ============================================================================

pub mod backend; // Trait FlipApi + client HTTP
mod wire;        // Structures JSON brutes (désérialisation tolérante)

#[cfg(test)]
pub(crate) mod mock;

// Re-export des types principaux
pub use backend::{FlipApi, HttpFlipApi, SharedApi};
