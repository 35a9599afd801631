use crate::area::TaxiId;

/// Taxis known to the dispatcher. A taxi's position in the registry is its
/// index in bidder lists and fare assignments, so entries are never removed
/// or reordered.
#[derive(Debug, Clone, Default)]
pub struct TaxiRegistry {
    taxis: Vec<TaxiId>,
}

impl TaxiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `taxi` if it is new. Returns its index either way.
    pub fn register(&mut self, taxi: TaxiId) -> usize {
        match self.index_of(taxi) {
            Some(index) => index,
            None => {
                self.taxis.push(taxi);
                self.taxis.len() - 1
            }
        }
    }

    pub fn index_of(&self, taxi: TaxiId) -> Option<usize> {
        self.taxis.iter().position(|known| *known == taxi)
    }

    /// The taxi at `index`, or `None` for a stale or malformed index.
    pub fn get(&self, index: usize) -> Option<TaxiId> {
        self.taxis.get(index).copied()
    }

    pub fn contains(&self, taxi: TaxiId) -> bool {
        self.index_of(taxi).is_some()
    }

    pub fn len(&self) -> usize {
        self.taxis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxis.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, TaxiId)> + '_ {
        self.taxis.iter().copied().enumerate()
    }
}

impl FromIterator<TaxiId> for TaxiRegistry {
    fn from_iter<I: IntoIterator<Item = TaxiId>>(iter: I) -> Self {
        let mut registry = TaxiRegistry::new();
        for taxi in iter {
            registry.register(taxi);
        }
        registry
    }
}
