use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Selected radicals plus, for every character carrying at least one of
/// them, how many of the selected radicals it carries.
///
/// Each radical keeps the carriers it was counted with, so deselecting it
/// undoes exactly its own contribution even if the store gained characters
/// in the meantime. A character matches the compound query when it carries
/// all selected radicals.
#[derive(Debug, Clone, Default)]
pub struct RadicalMultiset {
    selected: BTreeMap<String, Vec<String>>,
    counts: HashMap<String, usize>,
}

impl RadicalMultiset {
    pub fn contains(&self, radical: &str) -> bool {
        self.selected.contains_key(radical)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> BTreeSet<String> {
        self.selected.keys().cloned().collect()
    }

    /// Select `radical`, counting each literal that carries it.
    pub fn add<I>(&mut self, radical: &str, literals: I)
    where
        I: IntoIterator<Item = String>,
    {
        if self.contains(radical) {
            return;
        }
        let carriers: Vec<String> = literals
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for literal in &carriers {
            *self.counts.entry(literal.clone()).or_default() += 1;
        }
        self.selected.insert(radical.to_string(), carriers);
    }

    /// Deselect `radical`. Returns false if it was not selected.
    pub fn remove(&mut self, radical: &str) -> bool {
        let Some(carriers) = self.selected.remove(radical) else {
            return false;
        };
        for literal in carriers {
            if let Some(count) = self.counts.get_mut(&literal) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&literal);
                }
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.counts.clear();
    }

    /// Literals carrying every selected radical, sorted.
    pub fn matches(&self) -> Vec<String> {
        if self.selected.is_empty() {
            return Vec::new();
        }
        let mut literals: Vec<String> = self
            .counts
            .iter()
            .filter(|(_, count)| **count == self.selected.len())
            .map(|(literal, _)| literal.clone())
            .collect();
        literals.sort();
        literals
    }
}
