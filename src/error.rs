// ============================================================================
// Module : error
// ============================================================================
// Taxonomie des erreurs de la couche d'orchestration
//
// CONCEPTS RUST :
// 1. thiserror : dérive Display + std::error::Error à partir d'attributs
// 2. Clone : une même erreur est partagée entre plusieurs appelants
//    (requêtes coalescées du cache de noms, snapshots du fetcher)
//
// Une réponse vide bien formée n'est PAS une erreur : c'est un état valide
// (FetchStatus::Empty dans le module fetcher).
// ============================================================================

use thiserror::Error;

/// Erreurs remontées par le client du backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlipError {
    /// La requête n'a pas abouti (connexion refusée, timeout, ...)
    #[error("erreur réseau : {0}")]
    Network(String),

    /// Le backend a répondu avec un statut HTTP d'erreur (hors 404)
    #[error("{endpoint} a retourné HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// L'identifiant ou la recherche ne donne rien
    #[error("introuvable : {0}")]
    NotFound(String),

    /// Le corps de la réponse n'est pas le JSON attendu
    #[error("réponse illisible : {0}")]
    Decode(String),
}

impl FlipError {
    /// Message affichable à l'utilisateur
    ///
    /// Toutes les erreurs sont locales à la requête qui les a causées :
    /// le message invite à réessayer, jamais à relancer l'application.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::Status { .. } => {
                "Impossible de joindre le serveur. Vérifiez que le backend tourne puis réessayez."
                    .to_string()
            }
            Self::NotFound(what) => {
                format!("Aucun résultat pour {}. Vérifiez la saisie puis réessayez.", what)
            }
            Self::Decode(_) => "Réponse inattendue du serveur. Réessayez plus tard.".to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Conversion depuis reqwest
///
/// CONCEPT RUST : From trait
/// - Permet d'utiliser ? directement sur un reqwest::Result
/// - Les erreurs de décodage JSON sont séparées des erreurs de transport
impl From<reqwest::Error> for FlipError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                endpoint: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Alias pratique pour les résultats de la bibliothèque
pub type FlipResult<T> = Result<T, FlipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_invites_retry() {
        let err = FlipError::NotFound("« Cannonball »".to_string());
        assert!(err.is_not_found());
        assert!(err.user_message().contains("Cannonball"));
        assert!(err.user_message().contains("réessayez"));
    }

    #[test]
    fn test_network_message_invites_retry() {
        let err = FlipError::Network("connection refused".to_string());
        assert!(!err.is_not_found());
        assert!(err.user_message().contains("réessayez"));
    }
}
