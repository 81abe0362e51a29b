// ============================================================================
// Structures pour parser les réponses JSON du backend
// ============================================================================
// Le backend est écrit en Go : une slice vide peut arriver comme `null`, les
// ids de /api/items arrivent comme chaînes, et n'importe quel champ peut
// manquer. Ces structures acceptent tout cela sans échouer ; la conversion
// vers les modèles écarte ensuite les entrées sans identifiant.
//
// CONCEPT RUST : #[serde(deserialize_with = "...")]
// - Fonction de désérialisation personnalisée pour un champ
// - On passe par serde_json::Value pour accepter plusieurs types JSON
// ============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{FlipCategory, FlipItem, HistoryPoint, ItemId, ItemRecord, TrackedItem};

// ============================================================================
// Désérialiseurs tolérants
// ============================================================================

/// Accepte un id numérique (560) ou textuel ("560") ; tout le reste => None
fn de_item_id<'de, D>(deserializer: D) -> Result<Option<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    let raw = match value {
        Value::Number(num) => num.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(raw.and_then(ItemId::new))
}

/// Nombre, chaîne numérique ou null ; les valeurs non finies sont rejetées
fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    let number = match value {
        Value::Number(num) => num.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

/// Comme de_opt_number mais 0.0 par défaut
fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_number(deserializer)?.unwrap_or_default())
}

/// Chaîne, nombre converti en texte, ou None
fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    })
}

fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_string(deserializer)?.unwrap_or_default())
}

/// `null` => valeur par défaut (slice Go nil)
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// GET /api/items
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireItemRecord {
    #[serde(default, deserialize_with = "de_item_id")]
    id: Option<ItemId>,
    #[serde(default, deserialize_with = "de_string")]
    name: String,
    #[serde(default, deserialize_with = "de_number")]
    buy: f64,
    #[serde(default, deserialize_with = "de_number")]
    sell: f64,
    #[serde(default, deserialize_with = "de_number")]
    margin: f64,
}

impl WireItemRecord {
    pub(crate) fn into_model(self) -> Option<ItemRecord> {
        let id = self.id?;
        Some(ItemRecord::new(id, self.name, self.buy, self.sell, self.margin))
    }
}

// ============================================================================
// GET /suggest-flips et /categorized-flips
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireFlip {
    #[serde(default, deserialize_with = "de_item_id")]
    item_id: Option<ItemId>,
    #[serde(default, deserialize_with = "de_number")]
    sma5_buy: f64,
    #[serde(default, deserialize_with = "de_number")]
    sma5_sell: f64,
    #[serde(default, deserialize_with = "de_number")]
    profit: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    margin_percentage: Option<f64>,
}

impl WireFlip {
    pub(crate) fn into_model(self) -> Option<FlipItem> {
        Some(FlipItem {
            item_id: self.item_id?,
            sma5_buy: self.sma5_buy,
            sma5_sell: self.sma5_sell,
            profit: self.profit,
            margin_percentage: self.margin_percentage,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestFlipsResponse {
    #[serde(default, deserialize_with = "de_null_default")]
    pub suggested_flips: Vec<WireFlip>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCategory {
    #[serde(default, deserialize_with = "de_string")]
    name: String,
    #[serde(default, deserialize_with = "de_string")]
    description: String,
    #[serde(default, deserialize_with = "de_opt_number")]
    count: Option<f64>,
    #[serde(default, deserialize_with = "de_null_default")]
    items: Vec<WireFlip>,
}

impl WireCategory {
    /// Convertit la catégorie ; retourne aussi le nombre d'entrées écartées
    pub(crate) fn into_model(self) -> (FlipCategory, usize) {
        let total = self.items.len();
        let items: Vec<FlipItem> = self.items.into_iter().filter_map(WireFlip::into_model).collect();
        let dropped = total - items.len();
        let count = self
            .count
            .filter(|c| *c >= 0.0)
            .map(|c| c as usize)
            .unwrap_or(items.len());

        let category = FlipCategory {
            name: self.name,
            description: self.description,
            count,
            items,
        };
        (category, dropped)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategorizedFlipsResponse {
    #[serde(default, deserialize_with = "de_null_default")]
    pub categories: Vec<WireCategory>,
}

// ============================================================================
// GET /item-info/{id}, /search-item, /items
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ItemInfoResponse {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItemResponse {
    #[serde(default, deserialize_with = "de_item_id")]
    pub id: Option<ItemId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTrackedItem {
    #[serde(default, deserialize_with = "de_item_id")]
    id: Option<ItemId>,
    #[serde(default, deserialize_with = "de_string")]
    name: String,
}

impl WireTrackedItem {
    pub(crate) fn into_model(self) -> Option<TrackedItem> {
        let id = self.id?;
        let name = self.name.trim().to_string();
        (!name.is_empty()).then_some(TrackedItem { id, name })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackedItemsResponse {
    #[serde(default, deserialize_with = "de_null_default")]
    pub items: Vec<WireTrackedItem>,
}

// ============================================================================
// GET /item-history/{id}
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireHistoryPoint {
    #[serde(default, deserialize_with = "de_string")]
    timestamp: String,
    #[serde(default, deserialize_with = "de_number")]
    buy_price: f64,
    #[serde(default, deserialize_with = "de_number")]
    sell_price: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    rsi: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    macd_line: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    macd_signal: Option<f64>,
}

impl From<WireHistoryPoint> for HistoryPoint {
    fn from(wire: WireHistoryPoint) -> Self {
        HistoryPoint {
            timestamp: wire.timestamp,
            buy_price: wire.buy_price,
            sell_price: wire.sell_price,
            rsi: wire.rsi,
            macd_line: wire.macd_line,
            macd_signal: wire.macd_signal,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemHistoryResponse {
    #[serde(default, deserialize_with = "de_null_default")]
    pub history: Vec<WireHistoryPoint>,
}
