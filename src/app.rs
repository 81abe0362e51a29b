// ============================================================================
// Structure : App
// ============================================================================
// Orchestre les quatre flux de données du tableau de bord :
//
//   suggestions  : /suggest-flips, polling, noms résolus avant publication
//   categories   : /categorized-flips, une fois + refresh manuel
//   items        : /api/items, clé = QueryDescriptor (filtres + page)
//   history      : /item-history/{id} + nom, clé = item sélectionné
//
// L'état de la table (filtres, page, tri) vit ici ; le tri ne touche
// jamais au réseau, les filtres et la pagination changent la clé du
// fetcher de la table.
//
// CONCEPTS RUST :
// 1. Encapsulation : état privé, modifications via &mut self
// 2. Arc : cache et client partagés par toutes les tâches
// 3. RAII : détruire App détruit les fetchers (timers et requêtes arrêtés)
// ============================================================================

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::api::SharedApi;
use crate::cache::ItemNameCache;
use crate::config::Config;
use crate::error::FlipResult;
use crate::fetcher::{FetchSnapshot, FetchStatus, FetcherOptions, PollingFetcher, StalePolicy};
use crate::models::{FlipCategory, FlipFeed, HistoryView, ItemId, ItemRecord};
use crate::projector::{project, SortKey, SortSpec};
use crate::query::{FilterCriteria, FilterField, PageSize, PageSpec, QueryDescriptor};
use crate::resolver::IdentifierResolver;

pub type SuggestionsSnapshot = FetchSnapshot<(), FlipFeed>;
pub type CategoriesSnapshot = FetchSnapshot<(), Vec<FlipCategory>>;
pub type ItemsSnapshot = FetchSnapshot<QueryDescriptor, Vec<ItemRecord>>;
pub type HistorySnapshot = FetchSnapshot<ItemId, HistoryView>;

/// Table des items prête à afficher
#[derive(Debug, Clone)]
pub struct TableView {
    pub status: FetchStatus,
    /// Lignes triées selon `sort`
    pub rows: Vec<ItemRecord>,
    pub page: u32,
    pub page_size: PageSize,
    pub sort: SortSpec,
    pub has_next: bool,
    pub has_previous: bool,
    /// Vrai si les lignes viennent d'une autre requête que la courante
    pub stale: bool,
    pub message: Option<String>,
}

/// État principal de l'application
pub struct App {
    api: SharedApi,
    names: Arc<ItemNameCache>,
    resolver: IdentifierResolver,

    suggestions: PollingFetcher<(), FlipFeed>,
    categories: PollingFetcher<(), Vec<FlipCategory>>,
    items: PollingFetcher<QueryDescriptor, Vec<ItemRecord>>,
    history: PollingFetcher<ItemId, HistoryView>,

    filters: FilterCriteria,
    page: PageSpec,
    sort: SortSpec,
}

impl App {
    /// Crée l'application et lance les fetchers
    ///
    /// Doit être appelé dans un runtime tokio.
    pub fn new(api: SharedApi, config: &Config) -> Self {
        let names = Arc::new(ItemNameCache::new(Arc::clone(&api), config.name_cache_capacity));
        let resolver = IdentifierResolver::new(Arc::clone(&api), Arc::clone(&names));

        let filters = FilterCriteria::new();
        let page = PageSpec::default();
        let polling = FetcherOptions::polling(config.poll_interval);

        let suggestions = {
            let (api, names) = (Arc::clone(&api), Arc::clone(&names));
            PollingFetcher::spawn("suggestions", polling, Some(()), move |_: ()| {
                let (api, names) = (Arc::clone(&api), Arc::clone(&names));
                async move {
                    let flips = api.suggested_flips().await?;
                    let names = names.resolve_names(flips.iter().map(|f| f.item_id)).await;
                    Ok(FlipFeed { flips, names })
                }
            })
        };

        let categories = {
            let (api, names) = (Arc::clone(&api), Arc::clone(&names));
            PollingFetcher::spawn("categories", FetcherOptions::once(), Some(()), move |_: ()| {
                let (api, names) = (Arc::clone(&api), Arc::clone(&names));
                async move {
                    let categories = api.categorized_flips().await?;
                    // Les noms sont en cache avant que la liste soit visible
                    let ids = categories
                        .iter()
                        .flat_map(|c| c.items.iter().map(|f| f.item_id))
                        .collect::<Vec<_>>();
                    names.resolve_names(ids).await;
                    Ok(categories)
                }
            })
        };

        let items = {
            let api = Arc::clone(&api);
            let initial = QueryDescriptor::build(&filters, &page);
            PollingFetcher::spawn("items", polling, Some(initial), move |query: QueryDescriptor| {
                let api = Arc::clone(&api);
                async move { api.items(&query).await }
            })
        };

        let history = {
            let (api, names) = (Arc::clone(&api), Arc::clone(&names));
            let options = FetcherOptions::once().with_policy(StalePolicy::ClearOnKeyChange);
            PollingFetcher::spawn("history", options, None, move |id: ItemId| {
                let (api, names) = (Arc::clone(&api), Arc::clone(&names));
                async move {
                    let (points, name) = tokio::join!(api.item_history(id), names.resolve_name(id));
                    Ok(HistoryView::from_newest_first(id, name, points?))
                }
            })
        };

        info!(poll_interval = ?config.poll_interval, "App started");

        Self {
            api,
            names,
            resolver,
            suggestions,
            categories,
            items,
            history,
            filters,
            page,
            sort: SortSpec::default(),
        }
    }

    pub fn names(&self) -> &Arc<ItemNameCache> {
        &self.names
    }

    /// Précharge le cache de noms avec les items suivis (/items)
    ///
    /// # Retourne
    /// Nombre de noms ajoutés
    #[instrument(skip(self))]
    pub async fn warm_names(&self) -> FlipResult<usize> {
        let tracked = self.api.tracked_items().await?;
        let count = tracked.len();
        self.names.prime(tracked);
        info!(count, "Name cache warmed");
        Ok(count)
    }

    // ========================================================================
    // Suggestions et catégories
    // ========================================================================

    pub fn suggestions(&self) -> SuggestionsSnapshot {
        self.suggestions.snapshot()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<SuggestionsSnapshot> {
        self.suggestions.subscribe()
    }

    pub fn refresh_suggestions(&self) {
        self.suggestions.refresh();
    }

    pub fn categories(&self) -> CategoriesSnapshot {
        self.categories.snapshot()
    }

    pub fn subscribe_categories(&self) -> watch::Receiver<CategoriesSnapshot> {
        self.categories.subscribe()
    }

    pub fn refresh_categories(&self) {
        self.categories.refresh();
    }

    // ========================================================================
    // Table des items
    // ========================================================================

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn page(&self) -> &PageSpec {
        &self.page
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Requête correspondant à l'état courant de la table
    pub fn query(&self) -> QueryDescriptor {
        QueryDescriptor::build(&self.filters, &self.page)
    }

    /// Propage l'état de la table au fetcher (aucun effet si inchangé)
    fn sync_query(&self) {
        let query = self.query();
        debug!(query = %query, "Table query updated");
        self.items.set_key(query);
    }

    /// Modifie un filtre depuis la saisie et revient en page 1
    ///
    /// # Retourne
    /// La borne retenue (None si la saisie est vide ou invalide)
    pub fn set_filter(&mut self, field: FilterField, input: &str) -> Option<f64> {
        let value = self.filters.set_from_input(field, input);
        self.page.reset();
        self.sync_query();
        value
    }

    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.page.reset();
        self.sync_query();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page.set_page_size(page_size);
        self.sync_query();
    }

    /// Page suivante, si la page affichée est pleine
    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.page.next();
        self.sync_query();
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page.page() <= 1 {
            return false;
        }
        self.page.previous();
        self.sync_query();
        true
    }

    /// Tri local : aucune requête
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
        debug!(sort = ?self.sort, "Sort toggled");
    }

    /// Vrai seulement si la page COURANTE est arrivée et qu'elle est pleine
    pub fn has_next_page(&self) -> bool {
        self.next_page_known(&self.items.snapshot())
    }

    /// Des lignes d'une autre requête (ou en cours de rechargement) ne
    /// disent rien de la page courante
    fn next_page_known(&self, snapshot: &ItemsSnapshot) -> bool {
        if snapshot.is_loading() || snapshot.key.as_ref() != Some(&self.query()) {
            return false;
        }
        snapshot
            .data()
            .is_some_and(|rows| self.page.has_next(rows.len()))
    }

    pub fn items(&self) -> ItemsSnapshot {
        self.items.snapshot()
    }

    pub fn subscribe_items(&self) -> watch::Receiver<ItemsSnapshot> {
        self.items.subscribe()
    }

    pub fn refresh_items(&self) {
        self.items.refresh();
    }

    /// Vue triée de la dernière page reçue
    pub fn table(&self) -> TableView {
        let snapshot = self.items.snapshot();
        let rows = snapshot
            .data()
            .map(|rows| project(rows, self.sort))
            .unwrap_or_default();
        let stale = snapshot
            .key
            .as_ref()
            .is_some_and(|key| *key != self.query());

        TableView {
            status: snapshot.status,
            has_next: self.next_page_known(&snapshot),
            has_previous: self.page.page() > 1,
            rows,
            page: self.page.page(),
            page_size: self.page.page_size(),
            sort: self.sort,
            stale,
            message: snapshot.message(),
        }
    }

    // ========================================================================
    // Historique
    // ========================================================================

    /// Sélectionne un item à partir d'une saisie libre (id ou nom)
    ///
    /// Une saisie introuvable laisse la sélection courante intacte.
    #[instrument(skip(self))]
    pub async fn select_item(&self, input: &str) -> FlipResult<ItemId> {
        let id = self.resolver.resolve(input).await?;
        self.select_item_id(id);
        Ok(id)
    }

    pub fn select_item_id(&self, id: ItemId) {
        info!(item_id = %id, "Item selected");
        self.history.set_key(id);
    }

    pub fn selected_item(&self) -> Option<ItemId> {
        self.history.key()
    }

    pub fn history(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<HistorySnapshot> {
        self.history.subscribe()
    }

    pub fn refresh_history(&self) {
        self.history.refresh();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
