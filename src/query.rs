// ============================================================================
// Module : query
// ============================================================================
// Transforme l'état filtres + pagination en un descripteur de requête
// canonique.
//
// Le même descripteur sert à deux choses :
// 1. les paramètres de GET /api/items
// 2. la clé de dépendance du fetcher (changement de clé => nouveau fetch)
//
// CONCEPTS RUST :
// 1. Fonction pure : aucune I/O, aucun état global
// 2. Eq + Hash : le descripteur est comparable et utilisable comme clé
// ============================================================================

use std::fmt;

// ============================================================================
// Filtres
// ============================================================================

/// Les six bornes de filtre exposées par le backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    MinMargin,
    MaxMargin,
    MinBuy,
    MaxBuy,
    MinSell,
    MaxSell,
}

impl FilterField {
    /// Ordre canonique des paramètres dans la query string
    pub const ALL: [FilterField; 6] = [
        FilterField::MinMargin,
        FilterField::MaxMargin,
        FilterField::MinBuy,
        FilterField::MaxBuy,
        FilterField::MinSell,
        FilterField::MaxSell,
    ];

    /// Nom du paramètre côté backend
    pub fn query_key(&self) -> &'static str {
        match self {
            FilterField::MinMargin => "minMargin",
            FilterField::MaxMargin => "maxMargin",
            FilterField::MinBuy => "minBuy",
            FilterField::MaxBuy => "maxBuy",
            FilterField::MinSell => "minSell",
            FilterField::MaxSell => "maxSell",
        }
    }
}

/// Bornes numériques optionnelles
///
/// Aucune relation min <= max n'est imposée : le backend fait foi.
/// Seul invariant : une borne présente est un nombre fini.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterCriteria {
    min_margin: Option<f64>,
    max_margin: Option<f64>,
    min_buy: Option<f64>,
    max_buy: Option<f64>,
    min_sell: Option<f64>,
    max_sell: Option<f64>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FilterField) -> Option<f64> {
        *self.slot(field)
    }

    /// Fixe une borne ; une valeur non finie (NaN, inf) est ignorée
    pub fn set(&mut self, field: FilterField, value: Option<f64>) {
        *self.slot_mut(field) = value.filter(|v| v.is_finite());
    }

    /// Builder : même chose que set() mais consomme self
    pub fn with(mut self, field: FilterField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Fixe une borne depuis la saisie utilisateur
    ///
    /// Champ vide ou non numérique => borne absente (jamais envoyée comme "").
    /// Retourne la valeur retenue.
    pub fn set_from_input(&mut self, field: FilterField, input: &str) -> Option<f64> {
        let value = input.trim().parse::<f64>().ok();
        self.set(field, value);
        self.get(field)
    }

    /// Remet tous les filtres à zéro
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        FilterField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    fn slot(&self, field: FilterField) -> &Option<f64> {
        match field {
            FilterField::MinMargin => &self.min_margin,
            FilterField::MaxMargin => &self.max_margin,
            FilterField::MinBuy => &self.min_buy,
            FilterField::MaxBuy => &self.max_buy,
            FilterField::MinSell => &self.min_sell,
            FilterField::MaxSell => &self.max_sell,
        }
    }

    fn slot_mut(&mut self, field: FilterField) -> &mut Option<f64> {
        match field {
            FilterField::MinMargin => &mut self.min_margin,
            FilterField::MaxMargin => &mut self.max_margin,
            FilterField::MinBuy => &mut self.min_buy,
            FilterField::MaxBuy => &mut self.max_buy,
            FilterField::MinSell => &mut self.min_sell,
            FilterField::MaxSell => &mut self.max_sell,
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Tailles de page proposées
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub fn get(&self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
        }
    }
}

/// Page courante + taille de page
///
/// CONCEPT RUST : Encapsulation d'invariant
/// - Les champs sont privés : page >= 1 est garanti par les méthodes
/// - Changer la taille de page ramène toujours à la page 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpec {
    page: u32,
    page_size: PageSize,
}

impl PageSpec {
    pub fn new(page: u32, page_size: PageSize) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }

    pub fn next(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Page précédente, jamais en dessous de 1
    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Une page plus courte que page_size est la dernière
    pub fn has_next(&self, fetched: usize) -> bool {
        fetched >= self.page_size.get() as usize
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(1, PageSize::default())
    }
}

// ============================================================================
// Descripteur canonique
// ============================================================================

/// Paires clé=valeur dans un ordre fixe : page, pageSize, puis les filtres
/// présents dans l'ordre de FilterField::ALL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    pairs: Vec<(&'static str, String)>,
}

impl QueryDescriptor {
    /// Construit le descripteur (fonction totale, sans effet de bord)
    pub fn build(filters: &FilterCriteria, page: &PageSpec) -> Self {
        let mut pairs = Vec::with_capacity(2 + FilterField::ALL.len());
        pairs.push(("page", page.page().to_string()));
        pairs.push(("pageSize", page.page_size().get().to_string()));

        for field in FilterField::ALL {
            if let Some(value) = filters.get(field) {
                pairs.push((field.query_key(), format_number(value)));
            }
        }

        Self { pairs }
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// 100.0 -> "100", 2.5 -> "2.5"
fn format_number(value: f64) -> String {
    // Display de f64 n'affiche pas ".0" pour les entiers ; -0 devient 0
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_scenario() {
        let filters = FilterCriteria::new().with(FilterField::MinMargin, 100.0);
        let page = PageSpec::new(1, PageSize::Ten);

        let descriptor = QueryDescriptor::build(&filters, &page);
        assert_eq!(descriptor.to_string(), "page=1&pageSize=10&minMargin=100");
    }

    #[test]
    fn test_omitted_fields_never_appear() {
        let mut filters = FilterCriteria::new();
        filters.set_from_input(FilterField::MaxBuy, "   ");
        filters.set_from_input(FilterField::MinSell, "abc");
        filters.set(FilterField::MaxSell, Some(f64::NAN));

        let descriptor = QueryDescriptor::build(&filters, &PageSpec::default());
        assert_eq!(descriptor.to_string(), "page=1&pageSize=10");
        for field in FilterField::ALL {
            assert!(descriptor.get(field.query_key()).is_none());
        }
    }

    #[test]
    fn test_descriptor_is_independent_of_input_order() {
        let mut a = FilterCriteria::new();
        a.set(FilterField::MaxSell, Some(5000.0));
        a.set(FilterField::MinBuy, Some(10.0));

        let mut b = FilterCriteria::new();
        b.set(FilterField::MinBuy, Some(10.0));
        b.set(FilterField::MaxSell, Some(5000.0));

        let page = PageSpec::new(3, PageSize::Fifty);
        let da = QueryDescriptor::build(&a, &page);
        let db = QueryDescriptor::build(&b, &page);

        assert_eq!(da, db);
        assert_eq!(da.to_string(), "page=3&pageSize=50&minBuy=10&maxSell=5000");
    }

    #[test]
    fn test_zero_bound_is_sent() {
        let mut filters = FilterCriteria::new();
        assert_eq!(filters.set_from_input(FilterField::MinMargin, "0"), Some(0.0));

        let descriptor = QueryDescriptor::build(&filters, &PageSpec::default());
        assert_eq!(descriptor.get("minMargin"), Some("0"));
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut page = PageSpec::new(4, PageSize::Ten);
        page.set_page_size(PageSize::Twenty);

        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size().get(), 20);
    }

    #[test]
    fn test_previous_stops_at_one() {
        let mut page = PageSpec::new(0, PageSize::Ten);
        assert_eq!(page.page(), 1);

        page.previous();
        assert_eq!(page.page(), 1);

        page.next();
        page.next();
        page.previous();
        assert_eq!(page.page(), 2);
    }

    #[test]
    fn test_has_next() {
        let page = PageSpec::new(1, PageSize::Ten);
        assert!(page.has_next(10));
        assert!(!page.has_next(7));
    }
}
