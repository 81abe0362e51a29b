// ============================================================================
// API Client : backend FlipAssistant
// ============================================================================
// Endpoints consommés (tous en GET) :
//   /api/items           -> table paginée et filtrée
//   /suggest-flips       -> meilleures opportunités
//   /categorized-flips   -> opportunités par catégorie
//   /item-info/{id}      -> nom d'un item
//   /search-item?name=   -> id d'un item à partir de son nom
//   /item-history/{id}   -> historique (plus récent d'abord)
//   /items               -> items suivis (id + nom)
//
// CONCEPTS RUST :
// 1. async_trait : méthodes async dans un trait (objet dyn FlipApi)
// 2. Un seul reqwest::Client réutilisé (pool de connexions)
// 3. #[instrument] : chaque appel HTTP a son span tracing
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::wire::{
    CategorizedFlipsResponse, ItemHistoryResponse, ItemInfoResponse, SearchItemResponse,
    SuggestFlipsResponse, TrackedItemsResponse, WireFlip, WireItemRecord, WireTrackedItem,
};
use crate::error::{FlipError, FlipResult};
use crate::models::{FlipCategory, FlipItem, HistoryPoint, ItemId, ItemRecord, TrackedItem};
use crate::query::QueryDescriptor;

/// Contrat HTTP du backend
///
/// Chaque méthode peut être lente ou échouer : les appelants ne doivent
/// jamais bloquer dessus depuis le thread d'interaction.
#[async_trait]
pub trait FlipApi: Send + Sync {
    /// Page de la table des items
    async fn items(&self, query: &QueryDescriptor) -> FlipResult<Vec<ItemRecord>>;

    /// Top des flips suggérés
    async fn suggested_flips(&self) -> FlipResult<Vec<FlipItem>>;

    async fn categorized_flips(&self) -> FlipResult<Vec<FlipCategory>>;

    /// Nom d'affichage d'un item
    async fn item_name(&self, id: ItemId) -> FlipResult<String>;

    /// Recherche par nom ; Ok(None) si rien ne correspond
    async fn search_item(&self, name: &str) -> FlipResult<Option<ItemId>>;

    /// Historique tel que livré (plus récent d'abord)
    async fn item_history(&self, id: ItemId) -> FlipResult<Vec<HistoryPoint>>;

    async fn tracked_items(&self) -> FlipResult<Vec<TrackedItem>>;
}

/// Client partagé entre le cache, le resolver et les fetchers
pub type SharedApi = Arc<dyn FlipApi>;

/// Implémentation HTTP avec reqwest
#[derive(Debug, Clone)]
pub struct HttpFlipApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlipApi {
    /// Crée le client HTTP
    ///
    /// # Arguments
    /// * `base_url` - URL du backend (ex: "http://localhost:8080")
    /// * `timeout` - timeout par requête
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        debug!(base_url, ?timeout, "Creating HTTP client");
        let client = reqwest::Client::builder()
            .user_agent(concat!("lazyflip/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET + vérification du statut + décodage JSON
    ///
    /// - 404 => FlipError::NotFound
    /// - autre statut d'erreur => FlipError::Status
    /// - JSON invalide => FlipError::Decode
    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> FlipResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(url = %url, "Sending HTTP request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                FlipError::from(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FlipError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            error!(status = %status, path, "Backend returned error status");
            return Err(FlipError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| {
            warn!(path, error = %e, "Failed to decode JSON response");
            FlipError::Decode(e.to_string())
        })
    }
}

/// Pas de paramètres de requête
const NO_QUERY: &[(&str, &str)] = &[];

/// Convertit les flips bruts et compte ceux sans identifiant
fn convert_flips(wire: Vec<WireFlip>, endpoint: &str) -> Vec<FlipItem> {
    let total = wire.len();
    let flips: Vec<FlipItem> = wire.into_iter().filter_map(WireFlip::into_model).collect();
    if flips.len() < total {
        warn!(endpoint, dropped = total - flips.len(), "Skipped flips without item id");
    }
    flips
}

#[async_trait]
impl FlipApi for HttpFlipApi {
    #[instrument(skip(self, query), fields(query = %query))]
    async fn items(&self, query: &QueryDescriptor) -> FlipResult<Vec<ItemRecord>> {
        let wire: Option<Vec<WireItemRecord>> = self.get_json("/api/items", query.pairs()).await?;
        let wire = wire.unwrap_or_default();

        let total = wire.len();
        let items: Vec<ItemRecord> = wire.into_iter().filter_map(WireItemRecord::into_model).collect();
        if items.len() < total {
            warn!(dropped = total - items.len(), "Skipped items without valid id");
        }

        info!(items = items.len(), "Fetched item page");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn suggested_flips(&self) -> FlipResult<Vec<FlipItem>> {
        let response: SuggestFlipsResponse = self.get_json("/suggest-flips", NO_QUERY).await?;
        let flips = convert_flips(response.suggested_flips, "/suggest-flips");

        info!(flips = flips.len(), "Fetched suggested flips");
        Ok(flips)
    }

    #[instrument(skip(self))]
    async fn categorized_flips(&self) -> FlipResult<Vec<FlipCategory>> {
        let response: CategorizedFlipsResponse =
            self.get_json("/categorized-flips", NO_QUERY).await?;

        let mut categories = Vec::with_capacity(response.categories.len());
        for wire in response.categories {
            let (category, dropped) = wire.into_model();
            if dropped > 0 {
                warn!(category = %category.name, dropped, "Skipped flips without item id");
            }
            categories.push(category);
        }

        info!(categories = categories.len(), "Fetched categorized flips");
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn item_name(&self, id: ItemId) -> FlipResult<String> {
        let path = format!("/item-info/{}", id);
        let response: ItemInfoResponse = self.get_json(&path, NO_QUERY).await?;

        match response.name.map(|n| n.trim().to_string()) {
            Some(name) if !name.is_empty() => {
                debug!(name = %name, "Resolved item name");
                Ok(name)
            }
            _ => Err(FlipError::NotFound(format!("nom de l'item {}", id))),
        }
    }

    #[instrument(skip(self))]
    async fn search_item(&self, name: &str) -> FlipResult<Option<ItemId>> {
        let response: SearchItemResponse =
            self.get_json("/search-item", &[("name", name)]).await?;

        debug!(found = ?response.id, "Search finished");
        Ok(response.id)
    }

    #[instrument(skip(self))]
    async fn item_history(&self, id: ItemId) -> FlipResult<Vec<HistoryPoint>> {
        let path = format!("/item-history/{}", id);
        let response: ItemHistoryResponse = self.get_json(&path, NO_QUERY).await?;
        let points: Vec<HistoryPoint> = response.history.into_iter().map(HistoryPoint::from).collect();

        info!(points = points.len(), "Fetched item history");
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn tracked_items(&self) -> FlipResult<Vec<TrackedItem>> {
        let response: TrackedItemsResponse = self.get_json("/items", NO_QUERY).await?;
        let items: Vec<TrackedItem> = response
            .items
            .into_iter()
            .filter_map(WireTrackedItem::into_model)
            .collect();

        info!(items = items.len(), "Fetched tracked items");
        Ok(items)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    /// Serveur HTTP d'une seule réponse ; renvoie l'URL de base et la
    /// requête brute reçue
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}", addr), rx)
    }

    fn client(base_url: &str) -> HttpFlipApi {
        HttpFlipApi::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = client("http://localhost:8080/");
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(api.url("/suggest-flips"), "http://localhost:8080/suggest-flips");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port libéré juste avant : connexion refusée
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{}", addr)).suggested_flips().await;
        assert!(matches!(result, Err(FlipError::Network(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_suggested_flips_decoded() {
        let body = r#"{"suggested_flips":[{"item_id":2,"sma5_buy":150,"sma5_sell":"162.5","profit":12.5},{"sma5_buy":1}]}"#;
        let (url, request) = serve_once("200 OK", body).await;

        let flips = client(&url).suggested_flips().await.unwrap();

        // L'entrée sans item_id est écartée
        assert_eq!(flips.len(), 1);
        assert_eq!(flips[0].item_id.get(), 2);
        assert_eq!(flips[0].sma5_sell, 162.5);
        let request = request.await.unwrap();
        assert!(request.starts_with("GET /suggest-flips HTTP/1.1"));
        assert!(request.to_lowercase().contains("user-agent: lazyflip/"));
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let (url, _request) = serve_once("404 Not Found", "{}").await;
        let id = ItemId::new(99).unwrap();

        let result = client(&url).item_name(id).await;
        assert_eq!(result, Err(FlipError::NotFound("/item-info/99".to_string())));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let (url, _request) = serve_once("500 Internal Server Error", "{}").await;

        let result = client(&url).suggested_flips().await;
        assert_eq!(
            result,
            Err(FlipError::Status {
                endpoint: "/suggest-flips".to_string(),
                status: 500,
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_body_is_decode_error() {
        let (url, _request) = serve_once("200 OK", "<html>oops</html>").await;

        let result = client(&url).categorized_flips().await;
        assert!(matches!(result, Err(FlipError::Decode(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_blank_name_is_not_found() {
        let (url, _request) = serve_once("200 OK", r#"{"name":"  "}"#).await;

        let result = client(&url).item_name(ItemId::new(7).unwrap()).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_search_encodes_name() {
        let (url, request) = serve_once("200 OK", r#"{"id":"1319"}"#).await;

        let found = client(&url).search_item("Rune 2h sword").await.unwrap();

        assert_eq!(found, ItemId::new(1319));
        let request = request.await.unwrap();
        assert!(request.starts_with("GET /search-item?name=Rune+2h+sword HTTP/1.1"), "{}", request);
    }

    #[tokio::test]
    async fn test_items_query_and_null_body() {
        let (url, request) = serve_once("200 OK", "null").await;
        let query = QueryDescriptor::build(
            &crate::query::FilterCriteria::new().with(crate::query::FilterField::MinMargin, 100.0),
            &crate::query::PageSpec::default(),
        );

        let items = client(&url).items(&query).await.unwrap();

        assert!(items.is_empty());
        let request = request.await.unwrap();
        assert!(request.starts_with("GET /api/items?page=1&pageSize=10&minMargin=100 HTTP/1.1"), "{}", request);
    }
}
