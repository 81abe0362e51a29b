// ============================================================================
// MockApi : backend en mémoire pour les tests
// ============================================================================
// Compte les appels par endpoint, permet d'injecter des réponses, des
// erreurs et une latence artificielle (tokio::time::sleep, compatible avec
// l'horloge virtuelle des tests).
// ============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::FlipApi;
use crate::error::{FlipError, FlipResult};
use crate::models::{FlipCategory, FlipItem, HistoryPoint, ItemId, ItemRecord, TrackedItem};
use crate::query::QueryDescriptor;

#[derive(Default)]
pub(crate) struct MockApi {
    pub names: Mutex<HashMap<ItemId, String>>,
    pub search: Mutex<HashMap<String, ItemId>>,
    pub flips: Mutex<Vec<FlipItem>>,
    pub categories: Mutex<Vec<FlipCategory>>,
    pub items: Mutex<Vec<ItemRecord>>,
    pub history: Mutex<HashMap<ItemId, Vec<HistoryPoint>>>,
    pub tracked: Mutex<Vec<TrackedItem>>,
    /// Si vrai, tous les endpoints échouent avec une erreur réseau
    pub offline: Mutex<bool>,
    pub latency: Duration,

    pub name_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub flips_calls: AtomicUsize,
    pub categories_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub tracked_calls: AtomicUsize,
    /// Query strings reçues par /api/items, dans l'ordre
    pub item_queries: Mutex<Vec<String>>,
}

pub(crate) fn id(raw: u32) -> ItemId {
    ItemId::new(raw).expect("id de test non nul")
}

pub(crate) fn flip(raw: u32, profit: f64) -> FlipItem {
    FlipItem {
        item_id: id(raw),
        sma5_buy: 100.0,
        sma5_sell: 100.0 + profit,
        profit,
        margin_percentage: None,
    }
}

pub(crate) fn point(timestamp: &str, buy: f64, sell: f64) -> HistoryPoint {
    HistoryPoint {
        timestamp: timestamp.to_string(),
        buy_price: buy,
        sell_price: sell,
        rsi: None,
        macd_line: None,
        macd_signal: None,
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_name(self, raw: u32, name: &str) -> Self {
        self.names.lock().unwrap().insert(id(raw), name.to_string());
        self
    }

    pub fn with_search(self, name: &str, raw: u32) -> Self {
        self.search.lock().unwrap().insert(name.to_string(), id(raw));
        self
    }

    pub fn with_flips(self, flips: Vec<FlipItem>) -> Self {
        *self.flips.lock().unwrap() = flips;
        self
    }

    pub fn with_items(self, items: Vec<ItemRecord>) -> Self {
        *self.items.lock().unwrap() = items;
        self
    }

    pub fn with_history(self, raw: u32, points: Vec<HistoryPoint>) -> Self {
        self.history.lock().unwrap().insert(id(raw), points);
        self
    }

    pub fn with_tracked(self, tracked: Vec<TrackedItem>) -> Self {
        *self.tracked.lock().unwrap() = tracked;
        self
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn respond(&self, counter: &AtomicUsize) -> FlipResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if *self.offline.lock().unwrap() {
            return Err(FlipError::Network("backend hors ligne".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FlipApi for MockApi {
    async fn items(&self, query: &QueryDescriptor) -> FlipResult<Vec<ItemRecord>> {
        self.item_queries.lock().unwrap().push(query.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if *self.offline.lock().unwrap() {
            return Err(FlipError::Network("backend hors ligne".to_string()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn suggested_flips(&self) -> FlipResult<Vec<FlipItem>> {
        self.respond(&self.flips_calls).await?;
        Ok(self.flips.lock().unwrap().clone())
    }

    async fn categorized_flips(&self) -> FlipResult<Vec<FlipCategory>> {
        self.respond(&self.categories_calls).await?;
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn item_name(&self, item: ItemId) -> FlipResult<String> {
        self.respond(&self.name_calls).await?;
        self.names
            .lock()
            .unwrap()
            .get(&item)
            .cloned()
            .ok_or_else(|| FlipError::NotFound(format!("item {}", item)))
    }

    async fn search_item(&self, name: &str) -> FlipResult<Option<ItemId>> {
        self.respond(&self.search_calls).await?;
        Ok(self.search.lock().unwrap().get(name).copied())
    }

    async fn item_history(&self, item: ItemId) -> FlipResult<Vec<HistoryPoint>> {
        self.respond(&self.history_calls).await?;
        self.history
            .lock()
            .unwrap()
            .get(&item)
            .cloned()
            .ok_or_else(|| FlipError::NotFound(format!("historique {}", item)))
    }

    async fn tracked_items(&self) -> FlipResult<Vec<TrackedItem>> {
        self.respond(&self.tracked_calls).await?;
        Ok(self.tracked.lock().unwrap().clone())
    }
}
