// ============================================================================
// LazyFlip - Consommateur en ligne de commande
// ============================================================================
// Lance l'application, sélectionne éventuellement un item passé en
// argument, puis affiche en texte brut chaque nouvel état des suggestions
// et de l'historique jusqu'à Ctrl-C.
//
// Usage :
//   lazyflip               # suggestions seulement
//   lazyflip 560           # + historique de l'item 560
//   lazyflip "Cannonball"  # + historique, recherche par nom
//
// CONCEPTS RUST :
// 1. Runtime tokio créé à la main puis block_on (main reste synchrone)
// 2. tokio::select! : attendre plusieurs flux watch et le signal d'arrêt
// 3. RAII : sortir de la boucle détruit App, donc tous les fetchers
// ============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use lazyflip::api::HttpFlipApi;
use lazyflip::app::{App, HistorySnapshot, SuggestionsSnapshot};
use lazyflip::config::Config;
use lazyflip::fetcher::FetchStatus;
use lazyflip::models::{format_gp, ProfitTier};

// ============================================================================
// Initialisation du logging
// ============================================================================
// stdout sert à l'affichage : les logs partent dans un fichier avec
// rotation quotidienne.
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans `config.log_dir` (LAZYFLIP_LOG_DIR, sinon
/// ~/.local/share/lazyflip/logs sous Linux).
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/lazyflip/logs/lazyflip.log.*
/// RUST_LOG=lazyflip=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir.clone();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazyflip.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // RUST_LOG prioritaire ; sinon debug pour lazyflip, info ailleurs
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazyflip=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du logging")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Affichage texte
// ============================================================================

fn tier_marker(tier: ProfitTier) -> &'static str {
    match tier {
        ProfitTier::High => "+++",
        ProfitTier::Medium => "++ ",
        ProfitTier::Low => "+  ",
    }
}

fn print_suggestions(snapshot: &SuggestionsSnapshot) {
    match snapshot.status {
        FetchStatus::Idle | FetchStatus::Loading => {}
        FetchStatus::Empty => println!("\n📭 Aucun flip suggéré pour le moment"),
        FetchStatus::Failed => {
            let message = snapshot.message().unwrap_or_default();
            if snapshot.data.is_some() {
                println!("\n⚠️  {} (données précédentes conservées)", message);
            } else {
                println!("\n❌ {}", message);
            }
        }
        FetchStatus::Ready => {
            let Some(feed) = snapshot.data() else {
                return;
            };
            let at = snapshot
                .updated_at
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default();
            println!("\n💰 Flips suggérés ({}) - {}", feed.len(), at);
            for flip in &feed.flips {
                println!(
                    "  {} {:<32} achat {:>8}  vente {:>8}  profit {:>8}",
                    tier_marker(flip.tier()),
                    feed.name_of(flip.item_id),
                    format_gp(flip.sma5_buy),
                    format_gp(flip.sma5_sell),
                    format_gp(flip.profit),
                );
            }
        }
    }
}

fn print_history(snapshot: &HistorySnapshot) {
    match snapshot.status {
        FetchStatus::Idle | FetchStatus::Loading => {}
        FetchStatus::Failed => println!("\n❌ Historique : {}", snapshot.message().unwrap_or_default()),
        FetchStatus::Empty | FetchStatus::Ready => {
            let Some(view) = snapshot.data() else {
                return;
            };
            println!("\n📈 {} (#{}) - {} points", view.name, view.item_id, view.points.len());
            for point in view.recent(10) {
                println!(
                    "  {}  achat {:>8}  vente {:>8}  écart {:>8}",
                    point.timestamp,
                    format_gp(point.buy_price),
                    format_gp(point.sell_price),
                    format_gp(point.spread()),
                );
            }
        }
    }
}

// ============================================================================
// Boucle principale
// ============================================================================

async fn run(config: Config, selection: Option<String>) -> Result<()> {
    let api = HttpFlipApi::new(&config.api_base_url, config.request_timeout)?;
    println!("🔌 Backend : {}", api.base_url());

    let app = App::new(Arc::new(api), &config);

    if let Err(e) = app.warm_names().await {
        warn!(error = %e, "Could not warm name cache");
    }

    if let Some(input) = selection {
        match app.select_item(&input).await {
            Ok(id) => println!("🔎 Item sélectionné : {}", id),
            Err(e) => println!("❌ {}", e.user_message()),
        }
    }

    let mut suggestions = app.subscribe_suggestions();
    let mut history = app.subscribe_history();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
            changed = suggestions.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = suggestions.borrow_and_update().clone();
                print_suggestions(&snapshot);
            }
            changed = history.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = history.borrow_and_update().clone();
                print_history(&snapshot);
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // .env optionnel : les variables déjà définies restent prioritaires
    dotenv::dotenv().ok();
    let config = Config::from_env();

    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "LazyFlip starting up");
    println!("LazyFlip starting up (Ctrl-C pour quitter)");

    let selection = std::env::args().nth(1);

    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    runtime.block_on(run(config, selection))?;

    println!("👋 Au revoir !");
    Ok(())
}
