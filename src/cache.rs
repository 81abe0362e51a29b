// ============================================================================
// Module : cache
// ============================================================================
// Cache des noms d'items (id -> nom d'affichage) avec coalescing des
// requêtes concurrentes.
//
// Garanties :
// - un id déjà en cache est servi sans appel réseau
// - au plus UNE requête /item-info/{id} en vol par id : un second appelant
//   rejoint la requête existante au lieu d'en lancer une autre
// - un échec met en cache "Item {id}" : pas de nouvel essai pendant la session
// - taille bornée (LRU) si une capacité est configurée
//
// CONCEPTS RUST :
// 1. futures::future::Shared : une future clonable dont le résultat est
//    partagé par tous les clones (la requête ne part qu'une fois)
// 2. Mutex jamais tenu pendant un .await (on clone la Shared puis on relâche)
// ============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tracing::{debug, trace, warn};

use crate::api::SharedApi;
use crate::models::{ItemId, TrackedItem};

/// Requête de nom en vol, partagée entre tous les appelants
type PendingName = Shared<BoxFuture<'static, String>>;

// ============================================================================
// Stockage LRU
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    /// Vrai si le nom est "Item {id}" suite à un échec
    fallback: bool,
    /// Horodatage logique du dernier accès
    tick: u64,
}

/// Map bornée : l'entrée la moins récemment utilisée est évincée
#[derive(Debug)]
struct LruNames {
    capacity: Option<usize>,
    entries: HashMap<ItemId, Entry>,
    /// tick -> id, du plus ancien au plus récent
    order: BTreeMap<u64, ItemId>,
    clock: u64,
}

impl LruNames {
    fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity: capacity.filter(|c| *c > 0),
            entries: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Lecture avec mise à jour de la récence
    fn get(&mut self, id: ItemId) -> Option<String> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(&id)?;
        self.order.remove(&entry.tick);
        entry.tick = tick;
        self.order.insert(tick, id);
        Some(entry.name.clone())
    }

    fn insert(&mut self, id: ItemId, name: String, fallback: bool) {
        let tick = self.next_tick();
        if let Some(old) = self.entries.insert(id, Entry { name, fallback, tick }) {
            self.order.remove(&old.tick);
        }
        self.order.insert(tick, id);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let Some((_, evicted)) = self.order.pop_first() else {
                    break;
                };
                self.entries.remove(&evicted);
                trace!(item_id = %evicted, "Evicted name from cache");
            }
        }
    }

    /// Recherche inverse exacte (insensible à la casse), hors noms de repli
    fn find_id(&self, name: &str) -> Option<ItemId> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.fallback)
            .find(|(_, entry)| entry.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }
}

// ============================================================================
// ItemNameCache
// ============================================================================

struct CacheState {
    names: LruNames,
    pending: HashMap<ItemId, PendingName>,
}

/// Cache id -> nom partagé par toute l'application
pub struct ItemNameCache {
    api: SharedApi,
    state: Mutex<CacheState>,
}

impl ItemNameCache {
    /// Crée un cache vide
    ///
    /// * `capacity` - nombre maximum d'entrées (None ou 0 = non borné)
    pub fn new(api: SharedApi, capacity: Option<usize>) -> Self {
        Self {
            api,
            state: Mutex::new(CacheState {
                names: LruNames::new(capacity),
                pending: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Résout un ensemble d'ids en noms
    ///
    /// Les ids en cache sont servis immédiatement ; les autres sont
    /// récupérés en parallèle, en rejoignant les requêtes déjà en vol.
    /// Ne retourne jamais d'erreur : un échec donne "Item {id}".
    pub async fn resolve_names<I>(&self, ids: I) -> HashMap<ItemId, String>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut resolved = HashMap::new();
        let mut waiting: Vec<(ItemId, PendingName)> = Vec::new();

        // Le verrou est relâché avant tout .await
        {
            let mut state = self.state();
            let mut seen = HashSet::new();

            for id in ids {
                if !seen.insert(id) {
                    continue;
                }
                if let Some(name) = state.names.get(id) {
                    resolved.insert(id, name);
                    continue;
                }

                let joined = state.pending.contains_key(&id);
                let pending = state
                    .pending
                    .entry(id)
                    .or_insert_with(|| self.lookup(id))
                    .clone();
                debug!(item_id = %id, joined, "Waiting for item name");
                waiting.push((id, pending));
            }
        }

        if waiting.is_empty() {
            return resolved;
        }

        let names = join_all(waiting.iter().map(|(_, pending)| pending.clone())).await;

        let mut state = self.state();
        for ((id, _), name) in waiting.into_iter().zip(names) {
            state.pending.remove(&id);
            let fallback = name == id.fallback_name();
            state.names.insert(id, name.clone(), fallback);
            resolved.insert(id, name);
        }

        resolved
    }

    /// Résout un seul id
    pub async fn resolve_name(&self, id: ItemId) -> String {
        self.resolve_names([id])
            .await
            .remove(&id)
            .unwrap_or_else(|| id.fallback_name())
    }

    /// Construit la requête partagée pour un id absent du cache
    fn lookup(&self, id: ItemId) -> PendingName {
        let api = Arc::clone(&self.api);
        async move {
            match api.item_name(id).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(item_id = %id, error = %e, "Item name lookup failed, caching fallback");
                    id.fallback_name()
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Lecture synchrone, sans appel réseau
    pub fn cached(&self, id: ItemId) -> Option<String> {
        self.state().names.get(id)
    }

    /// Nom en cache ou "Item {id}"
    pub fn display_name(&self, id: ItemId) -> String {
        self.cached(id).unwrap_or_else(|| id.fallback_name())
    }

    /// Id d'un nom déjà résolu pendant la session
    pub fn find_id(&self, name: &str) -> Option<ItemId> {
        self.state().names.find_id(name.trim())
    }

    /// Préremplit le cache (liste des items suivis)
    pub fn prime<I>(&self, items: I)
    where
        I: IntoIterator<Item = TrackedItem>,
    {
        let mut state = self.state();
        let mut count = 0usize;
        for item in items {
            state.names.insert(item.id, item.name, false);
            count += 1;
        }
        debug!(count, "Primed item name cache");
    }

    pub fn len(&self) -> usize {
        self.state().names.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nombre de requêtes de nom en vol
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
