// ============================================================================
// LazyFlip - Library
// ============================================================================
// Client du backend FlipAssistant : flips suggérés, table des items,
// historique des prix. Expose les modules publics pour le binaire et les
// tests.
// ============================================================================

pub mod api;        // Client HTTP du backend
pub mod app;        // Orchestration des flux de données
pub mod cache;      // Cache des noms d'items
pub mod config;     // Configuration (variables d'environnement)
pub mod error;      // Erreurs typées
pub mod fetcher;    // Polling + annulation des requêtes dépassées
pub mod models;     // Structures de données
pub mod projector;  // Tri local de la table
pub mod query;      // Filtres, pagination, query string
pub mod resolver;   // Saisie libre -> identifiant d'item
