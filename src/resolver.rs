// ============================================================================
// Module : resolver
// ============================================================================
// Transforme une saisie libre ("560", "Cannonball") en identifiant d'item.
//
// Règles :
// 1. Saisie numérique => utilisée telle quelle, sans vérifier l'existence
//    (le fetch de l'historique la validera)
// 2. Une saisie qui RESSEMBLE à un nombre n'est jamais envoyée en recherche
//    par nom, même si un item porte un nom numérique
// 3. Sinon : nom déjà connu du cache, puis GET /search-item
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api::SharedApi;
use crate::cache::ItemNameCache;
use crate::error::{FlipError, FlipResult};
use crate::models::ItemId;

/// Forme de la saisie utilisateur
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input<'a> {
    /// Entier strictement positif
    Id(ItemId),
    /// Ressemble à un nombre mais n'est pas un id valide (0, -3, 99999999999)
    InvalidNumber,
    Name(&'a str),
    Blank,
}

fn classify(input: &str) -> Input<'_> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Input::Blank;
    }

    let digits = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);
    let numeric = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    if !numeric {
        // "1.5", "1e3" : un nombre, mais pas un id. "inf" ou "nan" restent
        // des noms (aucun chiffre)
        let float_like = trimmed.chars().any(|c| c.is_ascii_digit()) && trimmed.parse::<f64>().is_ok();
        return if float_like {
            Input::InvalidNumber
        } else {
            Input::Name(trimmed)
        };
    }

    if trimmed.starts_with('-') {
        return Input::InvalidNumber;
    }
    match digits.parse::<u32>().ok().and_then(ItemId::new) {
        Some(id) => Input::Id(id),
        None => Input::InvalidNumber,
    }
}

/// Résolution saisie libre -> ItemId
pub struct IdentifierResolver {
    api: SharedApi,
    names: Arc<ItemNameCache>,
}

impl IdentifierResolver {
    pub fn new(api: SharedApi, names: Arc<ItemNameCache>) -> Self {
        Self { api, names }
    }

    /// Résout la saisie
    ///
    /// # Retourne
    /// * `Ok(ItemId)` - identifiant canonique
    /// * `Err(FlipError::NotFound)` - rien ne correspond (ou recherche en échec)
    #[instrument(skip(self))]
    pub async fn resolve(&self, input: &str) -> FlipResult<ItemId> {
        let name = match classify(input) {
            Input::Id(id) => {
                debug!(item_id = %id, "Numeric input used as item id");
                return Ok(id);
            }
            Input::InvalidNumber => {
                return Err(FlipError::NotFound(format!("l'identifiant « {} »", input.trim())));
            }
            Input::Blank => return Err(FlipError::NotFound("une saisie vide".to_string())),
            Input::Name(name) => name,
        };

        if let Some(id) = self.names.find_id(name) {
            debug!(item_id = %id, "Name already known by cache");
            return Ok(id);
        }

        match self.api.search_item(name).await {
            Ok(Some(id)) => {
                info!(item_id = %id, "Resolved item name through search");
                Ok(id)
            }
            Ok(None) => Err(FlipError::NotFound(format!("« {} »", name))),
            Err(e) => {
                warn!(error = %e, "Item search failed");
                Err(FlipError::NotFound(format!("« {} »", name)))
            }
        }
    }
}
