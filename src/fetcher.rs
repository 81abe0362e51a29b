// ============================================================================
// Module : fetcher
// ============================================================================
// PollingFetcher : requête périodique + requête à chaque changement de clé
// de dépendance, avec annulation des requêtes dépassées.
//
// Machine à états :
//
//   Idle ──> Loading ──> Ready | Empty | Failed
//               ^                   │
//               └── tick / nouvelle clé / refresh manuel
//
// Propriété centrale : un résultat n'est appliqué que s'il provient de la
// requête COURANTE (même ticket). L'ordre d'arrivée réseau n'a aucune
// importance : dernière clé gagnante, pas dernière réponse arrivée.
//
// CONCEPTS RUST :
// 1. tokio::spawn + AbortHandle : la requête dépassée est annulée
// 2. tokio::sync::watch : flux observable du dernier état (abonnement)
// 3. tokio::select! : une seule boucle gère timer, clé, refresh, résultats
// 4. Drop : détruire le fetcher arrête la tâche et son timer
// ============================================================================

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{FlipError, FlipResult};
use crate::models::{FlipFeed, HistoryView};

// ============================================================================
// Payload : distinguer "vide" de "erreur"
// ============================================================================

/// Résultat d'un fetch dont on sait dire s'il est vide
///
/// Une réponse vide bien formée est un état valide (FetchStatus::Empty),
/// pas une erreur.
pub trait Payload {
    fn is_empty(&self) -> bool;
}

impl<T> Payload for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl Payload for FlipFeed {
    fn is_empty(&self) -> bool {
        FlipFeed::is_empty(self)
    }
}

impl Payload for HistoryView {
    fn is_empty(&self) -> bool {
        HistoryView::is_empty(self)
    }
}

// ============================================================================
// État observable
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Pas de clé : rien à charger
    Idle,
    Loading,
    /// Dernier fetch réussi, données non vides
    Ready,
    /// Dernier fetch réussi, réponse vide
    Empty,
    /// Dernier fetch en échec (les données précédentes peuvent rester)
    Failed,
}

/// Que faire des données affichées quand la clé change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Les anciennes données restent visibles pendant le chargement et
    /// après un échec
    #[default]
    KeepStale,
    /// Page blanche dès que la clé change ; un refresh de la même clé
    /// garde les données
    ClearOnKeyChange,
}

/// Options d'un fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetcherOptions {
    /// None = pas de polling (un fetch par clé + refresh manuel)
    pub interval: Option<Duration>,
    pub stale_policy: StalePolicy,
}

impl FetcherOptions {
    pub fn polling(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            stale_policy: StalePolicy::KeepStale,
        }
    }

    pub fn once() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }
}

/// Snapshot de l'état d'un fetcher
#[derive(Debug)]
pub struct FetchSnapshot<K, T> {
    pub status: FetchStatus,
    /// Clé dont proviennent `data` (None si aucune donnée)
    pub key: Option<K>,
    pub data: Option<Arc<T>>,
    pub error: Option<FlipError>,
    /// Instant du dernier résultat appliqué
    pub updated_at: Option<DateTime<Utc>>,
    /// Nombre de résultats appliqués (succès ou échec)
    pub revision: u64,
}

// Clone manuel : les données sont derrière un Arc, T n'a pas à être Clone
impl<K: Clone, T> Clone for FetchSnapshot<K, T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            key: self.key.clone(),
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            revision: self.revision,
        }
    }
}

impl<K, T> FetchSnapshot<K, T> {
    fn idle() -> Self {
        Self {
            status: FetchStatus::Idle,
            key: None,
            data: None,
            error: None,
            updated_at: None,
            revision: 0,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Message d'erreur à afficher, si le dernier fetch a échoué
    pub fn message(&self) -> Option<String> {
        match self.status {
            FetchStatus::Failed => self.error.as_ref().map(FlipError::user_message),
            _ => None,
        }
    }
}

// ============================================================================
// Tickets : quelle requête est la requête courante ?
// ============================================================================

/// Étiquette d'une requête : clé d'origine + numéro de séquence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    seq: u64,
    key: K,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Suit la requête courante ; toute autre est dépassée
#[derive(Debug)]
pub struct RequestTracker<K> {
    current: Option<Ticket<K>>,
    next_seq: u64,
}

impl<K: Clone + PartialEq> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            current: None,
            next_seq: 0,
        }
    }

    /// Démarre une requête : elle devient la seule applicable
    pub fn begin(&mut self, key: K) -> Ticket<K> {
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            key,
        };
        self.current = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.current.as_ref() == Some(ticket)
    }

    /// Consomme le ticket courant ; false si `ticket` est dépassé
    pub fn settle(&mut self, ticket: &Ticket<K>) -> bool {
        if self.is_current(ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Plus aucune requête en cours n'est applicable
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

impl<K: Clone + PartialEq> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PollingFetcher
// ============================================================================

type FetchFn<K, T> = Arc<dyn Fn(K) -> BoxFuture<'static, FlipResult<T>> + Send + Sync>;

/// Fetcher générique piloté par une clé de dépendance
///
/// Doit être créé dans un runtime tokio. Détruire le fetcher annule la
/// requête en cours et arrête le timer.
pub struct PollingFetcher<K, T> {
    name: &'static str,
    key_tx: watch::Sender<Option<K>>,
    refresh_tx: mpsc::UnboundedSender<()>,
    state_rx: watch::Receiver<FetchSnapshot<K, T>>,
    task: JoinHandle<()>,
}

impl<K, T> PollingFetcher<K, T>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Payload + Send + Sync + 'static,
{
    /// Lance la tâche du fetcher
    ///
    /// # Arguments
    /// * `name` - nom utilisé dans les logs
    /// * `options` - intervalle de polling et politique de données périmées
    /// * `initial` - clé initiale (None = Idle jusqu'au premier set_key)
    /// * `fetch` - construit la requête pour une clé
    pub fn spawn<F, Fut>(name: &'static str, options: FetcherOptions, initial: Option<K>, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FlipResult<T>> + Send + 'static,
    {
        let fetch: FetchFn<K, T> = Arc::new(move |key| fetch(key).boxed());
        let (key_tx, key_rx) = watch::channel(initial);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(FetchSnapshot::idle());
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            name,
            fetch,
            policy: options.stale_policy,
            state_tx,
            tracker: RequestTracker::new(),
            in_flight: None,
            results_tx,
        };
        let task = tokio::spawn(worker.run(options.interval, key_rx, refresh_rx, results_rx));
        debug!(fetcher = name, interval = ?options.interval, "Spawned fetcher");

        Self {
            name,
            key_tx,
            refresh_tx,
            state_rx,
            task,
        }
    }

    /// Change la clé de dépendance (aucun effet si elle est identique)
    pub fn set_key(&self, key: K) {
        let changed = self.key_tx.send_if_modified(|current| {
            if current.as_ref() == Some(&key) {
                false
            } else {
                *current = Some(key);
                true
            }
        });
        debug!(fetcher = self.name, changed, "Dependency key set");
    }

    /// Retire la clé : le fetcher repasse Idle
    pub fn clear_key(&self) {
        self.key_tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn key(&self) -> Option<K> {
        self.key_tx.borrow().clone()
    }

    /// Nouvel essai manuel (ignoré si une requête est déjà en vol)
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Dernier état connu
    pub fn snapshot(&self) -> FetchSnapshot<K, T> {
        self.state_rx.borrow().clone()
    }

    /// Flux des états successifs
    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<K, T>> {
        self.state_rx.clone()
    }
}

impl<K, T> Drop for PollingFetcher<K, T> {
    fn drop(&mut self) {
        self.task.abort();
        debug!(fetcher = self.name, "Fetcher torn down");
    }
}

/// Partie du fetcher qui vit dans la tâche tokio
struct Worker<K, T> {
    name: &'static str,
    fetch: FetchFn<K, T>,
    policy: StalePolicy,
    state_tx: watch::Sender<FetchSnapshot<K, T>>,
    tracker: RequestTracker<K>,
    in_flight: Option<(Ticket<K>, AbortHandle)>,
    results_tx: mpsc::UnboundedSender<(Ticket<K>, FlipResult<T>)>,
}

/// Attend le prochain tick, ou jamais s'il n'y a pas de timer
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl<K, T> Worker<K, T>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Payload + Send + Sync + 'static,
{
    async fn run(
        mut self,
        interval: Option<Duration>,
        mut key_rx: watch::Receiver<Option<K>>,
        mut refresh_rx: mpsc::UnboundedReceiver<()>,
        mut results_rx: mpsc::UnboundedReceiver<(Ticket<K>, FlipResult<T>)>,
    ) {
        let mut ticker = interval.map(|period| {
            let mut ticker = tokio::time::interval(period);
            // Un fetch plus long que l'intervalle fait sauter les ticks
            // au lieu de les empiler
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        let mut current = key_rx.borrow_and_update().clone();

        // Sans timer, le premier fetch part tout de suite ; avec timer, le
        // premier tick (immédiat) s'en charge
        if ticker.is_none() {
            if let Some(key) = current.clone() {
                self.start(key);
            }
        }

        loop {
            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    if let Some(key) = current.clone() {
                        if self.in_flight.is_none() {
                            self.start(key);
                        } else {
                            debug!(fetcher = self.name, "Tick skipped, request still in flight");
                        }
                    }
                }

                changed = key_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = key_rx.borrow_and_update().clone();
                    if next == current {
                        continue;
                    }
                    current = next;
                    self.cancel_in_flight();

                    match current.clone() {
                        Some(key) => {
                            if self.policy == StalePolicy::ClearOnKeyChange {
                                self.state_tx.send_modify(|s| {
                                    s.data = None;
                                    s.key = None;
                                    s.error = None;
                                });
                            }
                            self.start(key);
                            if let Some(ticker) = ticker.as_mut() {
                                ticker.reset();
                            }
                        }
                        None => self.go_idle(),
                    }
                }

                Some(()) = refresh_rx.recv() => {
                    match (current.clone(), self.in_flight.is_some()) {
                        (Some(key), false) => self.start(key),
                        (Some(_), true) => debug!(fetcher = self.name, "Refresh merged with in-flight request"),
                        (None, _) => {}
                    }
                }

                Some((ticket, result)) = results_rx.recv() => {
                    self.finish(ticket, result);
                }
            }
        }

        self.cancel_in_flight();
        debug!(fetcher = self.name, "Fetcher loop stopped");
    }

    /// Lance la requête pour `key` dans sa propre tâche
    fn start(&mut self, key: K) {
        let ticket = self.tracker.begin(key);
        debug!(fetcher = self.name, key = ?ticket.key, "Starting request");

        self.state_tx.send_modify(|s| s.status = FetchStatus::Loading);

        let fetch = Arc::clone(&self.fetch);
        let results_tx = self.results_tx.clone();
        let sent = ticket.clone();
        let handle = tokio::spawn(async move {
            let result = fetch(sent.key.clone()).await;
            let _ = results_tx.send((sent, result));
        });

        self.in_flight = Some((ticket, handle.abort_handle()));
    }

    /// Applique un résultat s'il provient de la requête courante
    fn finish(&mut self, ticket: Ticket<K>, result: FlipResult<T>) {
        if !self.tracker.settle(&ticket) {
            debug!(fetcher = self.name, key = ?ticket.key, "Discarding superseded result");
            return;
        }
        if self
            .in_flight
            .as_ref()
            .is_some_and(|(in_flight, _)| *in_flight == ticket)
        {
            self.in_flight = None;
        }

        let name = self.name;
        self.state_tx.send_modify(|s| {
            s.revision += 1;
            s.updated_at = Some(Utc::now());
            match result {
                Ok(data) => {
                    s.status = if data.is_empty() {
                        FetchStatus::Empty
                    } else {
                        FetchStatus::Ready
                    };
                    info!(fetcher = name, key = ?ticket.key, status = ?s.status, "Request settled");
                    s.data = Some(Arc::new(data));
                    s.key = Some(ticket.key);
                    s.error = None;
                }
                Err(e) => {
                    warn!(fetcher = name, key = ?ticket.key, error = %e, "Request failed");
                    s.status = FetchStatus::Failed;
                    s.error = Some(e);
                }
            }
        });
    }

    fn cancel_in_flight(&mut self) {
        self.tracker.invalidate();
        if let Some((ticket, handle)) = self.in_flight.take() {
            handle.abort();
            debug!(fetcher = self.name, key = ?ticket.key, "Aborted superseded request");
        }
    }

    fn go_idle(&mut self) {
        self.state_tx.send_modify(|s| {
            s.status = FetchStatus::Idle;
            s.data = None;
            s.key = None;
            s.error = None;
        });
    }
}

// La tâche du worker peut être annulée au milieu d'un .await (Drop du
// fetcher) : la requête en vol doit mourir avec elle
impl<K, T> Drop for Worker<K, T> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
            debug!(fetcher = self.name, "Aborted in-flight request on teardown");
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
