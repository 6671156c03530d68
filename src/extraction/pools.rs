/*!
 * Routing of units into the standard and duplicate translation pools.
 *
 * With duplicate detection on, a unit text that occurs more than once in the
 * linear list is translated once, in the duplicate pool, and every occurrence
 * resolves to that single entry. The split is per unit: one line may draw its
 * units from both pools.
 */

use indexmap::IndexMap;

/// Where a unit's translation lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSlot {
    Standard(usize),
    Duplicate(usize),
}

/// The two pools handed to translators, plus each unit's slot in them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationPools {
    pub standard: Vec<String>,
    pub duplicates: Vec<String>,
    slots: Vec<PoolSlot>,
}

impl TranslationPools {
    /// Route `units` into pools
    pub fn build(units: &[String], detect_duplicates: bool) -> Self {
        if !detect_duplicates {
            return Self {
                standard: units.to_vec(),
                duplicates: Vec::new(),
                slots: (0..units.len()).map(PoolSlot::Standard).collect(),
            };
        }

        let mut occurrences: IndexMap<&str, usize> = IndexMap::new();
        for unit in units {
            *occurrences.entry(unit.as_str()).or_insert(0) += 1;
        }

        let mut standard = Vec::new();
        let mut duplicates = Vec::new();
        let mut duplicate_slots: IndexMap<&str, usize> = IndexMap::new();
        let mut slots = Vec::with_capacity(units.len());

        for unit in units {
            let count = occurrences.get(unit.as_str()).copied().unwrap_or(0);
            if count > 1 {
                let slot = *duplicate_slots.entry(unit.as_str()).or_insert_with(|| {
                    duplicates.push(unit.clone());
                    duplicates.len() - 1
                });
                slots.push(PoolSlot::Duplicate(slot));
            } else {
                standard.push(unit.clone());
                slots.push(PoolSlot::Standard(standard.len() - 1));
            }
        }

        Self {
            standard,
            duplicates,
            slots,
        }
    }

    pub fn slot(&self, unit_index: usize) -> Option<PoolSlot> {
        self.slots.get(unit_index).copied()
    }

    pub fn unit_count(&self) -> usize {
        self.slots.len()
    }
}

/// Translated pools read back for reconstruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedUnits {
    pub standard: Vec<String>,
    pub duplicates: Vec<String>,
}

impl TranslatedUnits {
    pub fn new(standard: Vec<String>, duplicates: Vec<String>) -> Self {
        Self { standard, duplicates }
    }

    /// Translation of every unit of `pools`, `None` where the pool file is short.
    ///
    /// When no duplicate translations were supplied and the standard list has
    /// exactly one entry per unit, the standard list is read linearly.
    pub fn resolve(&self, pools: &TranslationPools) -> Vec<Option<String>> {
        let linear = self.duplicates.is_empty() && self.standard.len() == pools.unit_count();

        (0..pools.unit_count())
            .map(|unit_index| {
                if linear {
                    return self.standard.get(unit_index).cloned();
                }
                match pools.slot(unit_index)? {
                    PoolSlot::Standard(slot) => self.standard.get(slot).cloned(),
                    PoolSlot::Duplicate(slot) => self.duplicates.get(slot).cloned(),
                }
            })
            .collect()
    }
}
