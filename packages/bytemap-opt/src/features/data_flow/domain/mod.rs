//! Reaching-definition sets

use crate::shared::models::Loc;
use std::collections::BTreeSet;

/// Locations whose assignment may reach a use. `None` stands for function entry.
pub type DefSites = BTreeSet<Option<Loc>>;

/// The def sites as plain locations, or `None` if entry is among them
pub fn concrete_sites(defs: &DefSites) -> Option<Vec<Loc>> {
    defs.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_sites() {
        let defs: DefSites = [Some(Loc::new(0, 1)), Some(Loc::new(2, 0))].into();
        assert_eq!(
            concrete_sites(&defs),
            Some(vec![Loc::new(0, 1), Loc::new(2, 0)])
        );

        let with_entry: DefSites = [None, Some(Loc::new(0, 1))].into();
        assert_eq!(concrete_sites(&with_entry), None);
    }
}
