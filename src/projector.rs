// ============================================================================
// Module : projector
// ============================================================================
// Tri côté client d'une collection déjà récupérée (le backend ne trie pas
// /api/items).
//
// CONCEPTS RUST :
// 1. slice::sort_by est STABLE : à clé égale, l'ordre d'origine est conservé
// 2. f64::total_cmp : ordre total sur les flottants (pas de panic sur NaN)
// 3. L'entrée est empruntée (&[T]) et jamais modifiée
// ============================================================================

use std::cmp::Ordering;

use crate::models::ItemRecord;

/// Colonne de tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    Buy,
    Sell,
    Margin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Une seule colonne active à la fois
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Clic sur une colonne
    ///
    /// Même colonne en Asc => Desc ; sinon (autre colonne, ou Desc) => Asc
    pub fn toggle(&mut self, key: SortKey) {
        self.direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.key = key;
    }
}

impl Default for SortSpec {
    /// Tri par marge croissante
    fn default() -> Self {
        Self::new(SortKey::Margin, SortDirection::Asc)
    }
}

/// Compare deux lignes selon une colonne (ordre croissant)
///
/// Les noms sont comparés tels que livrés (lexicographique, sensible à la casse).
fn compare(a: &ItemRecord, b: &ItemRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Buy => a.buy.total_cmp(&b.buy),
        SortKey::Sell => a.sell.total_cmp(&b.sell),
        SortKey::Margin => a.margin.total_cmp(&b.margin),
    }
}

/// Retourne une nouvelle séquence triée selon `spec`
pub fn project(items: &[ItemRecord], spec: SortSpec) -> Vec<ItemRecord> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, spec.key);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;

    fn record(id: u32, name: &str, margin: f64) -> ItemRecord {
        ItemRecord::new(ItemId::new(id).unwrap(), name, 100.0, 100.0 + margin, margin)
    }

    fn ids(items: &[ItemRecord]) -> Vec<u32> {
        items.iter().map(|r| r.id.get()).collect()
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let items = vec![
            record(1, "a", 50.0),
            record(2, "b", 10.0),
            record(3, "c", 50.0),
            record(4, "d", 10.0),
        ];

        let asc = project(&items, SortSpec::new(SortKey::Margin, SortDirection::Asc));
        assert_eq!(ids(&asc), vec![2, 4, 1, 3]);

        let desc = project(&items, SortSpec::new(SortKey::Margin, SortDirection::Desc));
        assert_eq!(ids(&desc), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_desc_is_inversion_of_asc() {
        let items = vec![
            record(1, "a", 30.0),
            record(2, "b", -5.0),
            record(3, "c", 1200.0),
            record(4, "d", 7.5),
        ];

        let asc = project(&items, SortSpec::new(SortKey::Margin, SortDirection::Asc));
        let mut desc = project(&items, SortSpec::new(SortKey::Margin, SortDirection::Desc));
        desc.reverse();

        assert_eq!(asc, desc);
    }

    #[test]
    fn test_name_sort_is_case_sensitive() {
        let items = vec![
            record(1, "abyssal whip", 1.0),
            record(2, "Zamorak cape", 1.0),
            record(3, "Bandos tassets", 1.0),
        ];

        let sorted = project(&items, SortSpec::new(SortKey::Name, SortDirection::Asc));
        // Majuscules avant minuscules en ordre lexicographique
        assert_eq!(ids(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let items = vec![record(1, "a", 3.0), record(2, "b", 1.0)];
        let _ = project(&items, SortSpec::default());
        assert_eq!(ids(&items), vec![1, 2]);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let items = vec![record(1, "a", 100.0), record(2, "b", 9.0)];
        let sorted = project(&items, SortSpec::new(SortKey::Margin, SortDirection::Asc));
        assert_eq!(ids(&sorted), vec![2, 1]);
    }

    #[test]
    fn test_toggle() {
        let mut spec = SortSpec::default();

        spec.toggle(SortKey::Margin);
        assert_eq!(spec, SortSpec::new(SortKey::Margin, SortDirection::Desc));

        spec.toggle(SortKey::Margin);
        assert_eq!(spec.direction, SortDirection::Asc);

        spec.toggle(SortKey::Margin);
        spec.toggle(SortKey::Name);
        assert_eq!(spec, SortSpec::new(SortKey::Name, SortDirection::Asc));
    }
}
