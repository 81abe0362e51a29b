// ============================================================================
// Structures : HistoryPoint, HistoryView
// ============================================================================
// Série historique d'un item avec les indicateurs techniques (RSI, MACD)
// précalculés par le backend. Le client les consomme comme des nombres
// opaques.
//
// Le backend livre la série du plus récent au plus ancien ; HistoryView la
// stocke du plus ancien au plus récent (ordre naturel d'un graphique).
// ============================================================================

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::ItemId;

/// Un point de l'historique
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    /// Timestamp brut tel que livré par le backend
    pub timestamp: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
}

impl HistoryPoint {
    /// Parse le timestamp (RFC 3339 ou "YYYY-MM-DD HH:MM:SS")
    ///
    /// CONCEPT RUST : Option chaining avec or_else
    /// - Essaie un format, puis l'autre si le premier échoue
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
    }

    /// Profit brut si on achète au buy et revend au sell
    pub fn spread(&self) -> f64 {
        self.sell_price - self.buy_price
    }
}

/// Historique complet d'un item, prêt à afficher
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub item_id: ItemId,
    pub name: String,
    /// Du plus ancien au plus récent
    pub points: Vec<HistoryPoint>,
}

impl HistoryView {
    /// Construit la vue à partir de la série du backend (plus récent d'abord)
    pub fn from_newest_first(item_id: ItemId, name: String, mut points: Vec<HistoryPoint>) -> Self {
        points.reverse();
        Self {
            item_id,
            name,
            points,
        }
    }

    /// Les `n` derniers points (statistiques récentes)
    pub fn recent(&self, n: usize) -> &[HistoryPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
