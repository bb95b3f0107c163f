//! Co-product ratio rules.
//!
//! Some fuels are produced jointly: a co-product's output is fixed as a multiple of a base
//! fuel's output (e.g. alternative jet fuel produced alongside renewable diesel). Each
//! (base, co-product) pair becomes an exact-ratio equality constraint in the model.
use crate::fuel::FuelID;
use indexmap::IndexMap;

/// The co-product ratio rules for a scenario.
///
/// Keyed by base fuel; each base fuel maps to the co-product fuels tied to it and their
/// production multipliers (co-product output = multiplier x base output).
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CoproductMap {
    by_base: IndexMap<FuelID, IndexMap<FuelID, f64>>,
}

impl CoproductMap {
    /// Create an empty [`CoproductMap`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie `coproduct`'s output to `base`'s at the given multiplier
    pub fn add(&mut self, coproduct: FuelID, base: FuelID, multiplier: f64) {
        self.by_base
            .entry(base)
            .or_default()
            .insert(coproduct, multiplier);
    }

    /// The co-products of `base` and their multipliers, if it has any
    pub fn coproducts_of(&self, base: &FuelID) -> Option<&IndexMap<FuelID, f64>> {
        self.by_base.get(base)
    }

    /// The base fuels that `fuel` is a co-product of
    pub fn base_fuels_of(&self, fuel: &FuelID) -> Vec<&FuelID> {
        self.by_base
            .iter()
            .filter(|(_, coproducts)| coproducts.contains_key(fuel))
            .map(|(base, _)| base)
            .collect()
    }

    /// The multiplier tying `coproduct` to `base`, if the pair is defined
    pub fn multiplier(&self, coproduct: &FuelID, base: &FuelID) -> Option<f64> {
        self.by_base.get(base)?.get(coproduct).copied()
    }

    /// Iterate over every (base, co-product, multiplier) rule
    pub fn iter_pairs(&self) -> impl Iterator<Item = (&FuelID, &FuelID, f64)> {
        self.by_base.iter().flat_map(|(base, coproducts)| {
            coproducts
                .iter()
                .map(move |(coproduct, multiplier)| (base, coproduct, *multiplier))
        })
    }

    /// Whether no rules are defined
    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_coproduct_lookups() {
        let mut coproducts = CoproductMap::new();
        coproducts.add("ajf".into(), "rd".into(), 1.02);
        coproducts.add("ajf".into(), "other".into(), 1.02);
        coproducts.add("naphtha".into(), "rd".into(), 0.1);

        assert_approx_eq!(
            f64,
            coproducts.multiplier(&"ajf".into(), &"rd".into()).unwrap(),
            1.02
        );
        assert!(coproducts.multiplier(&"rd".into(), &"ajf".into()).is_none());

        let bases = coproducts.base_fuels_of(&"ajf".into());
        assert!(bases.contains(&&"rd".into()));
        assert!(bases.contains(&&"other".into()));

        let rd_coproducts = coproducts.coproducts_of(&"rd".into()).unwrap();
        assert_eq!(rd_coproducts.len(), 2);
    }

    #[test]
    fn test_iter_pairs() {
        let mut coproducts = CoproductMap::new();
        coproducts.add("ajf".into(), "rd".into(), 1.02);
        coproducts.add("naphtha".into(), "rd".into(), 0.1);

        let pairs: Vec<_> = coproducts.iter_pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, &FuelID::from("rd"));
    }
}
