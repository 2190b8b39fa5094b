//! Taxonomy: the bidirectional ordinal<->name bijection, and the id-indexed
//! resolver that looks one up (spec §3).
//!
//! Grounded on the id-keyed registry-lookup shape of the teacher's
//! `crypto/mod.rs` (`ExtType` dispatch by a small integer id), generalized
//! from a one-way id->variant table to a two-way ordinal<->name bijection
//! plus an outer id->Taxonomy lookup layer.

use std::collections::HashMap;

/// An immutable bijection between short ordinals and field-name strings,
/// identified by a 16-bit id. Id `0` is reserved for "no taxonomy" (spec
/// §3) and is rejected by [`Taxonomy::new`].
#[derive(Clone, Debug)]
pub struct Taxonomy {
    id: u16,
    ordinal_to_name: HashMap<i16, String>,
    name_to_ordinal: HashMap<String, i16>,
}

impl Taxonomy {
    /// Create an empty taxonomy with the given id. Panics if `id == 0`,
    /// since that id is reserved to mean "no taxonomy" and can never name
    /// a real one (spec §3).
    pub fn new(id: u16) -> Taxonomy {
        assert_ne!(id, 0, "taxonomy id 0 is reserved for \"no taxonomy\"");
        Taxonomy {
            id,
            ordinal_to_name: HashMap::new(),
            name_to_ordinal: HashMap::new(),
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Add an ordinal<->name pair to the bijection. Later calls with the
    /// same ordinal or name overwrite the earlier mapping.
    pub fn add(&mut self, ordinal: i16, name: impl Into<String>) {
        let name = name.into();
        self.ordinal_to_name.insert(ordinal, name.clone());
        self.name_to_ordinal.insert(name, ordinal);
    }

    pub fn name_for(&self, ordinal: i16) -> Option<&str> {
        self.ordinal_to_name.get(&ordinal).map(|s| s.as_str())
    }

    pub fn ordinal_for(&self, name: &str) -> Option<i16> {
        self.name_to_ordinal.get(name).copied()
    }

    /// Whether `(name, ordinal)` both resolve to each other under this
    /// taxonomy (used by the name/ordinal substitution rule, spec §4.4 and
    /// §9's Open Question resolution).
    pub fn matches(&self, name: &str, ordinal: i16) -> bool {
        self.ordinal_for(name) == Some(ordinal) && self.name_for(ordinal) == Some(name)
    }

    /// Apply the writer's name/ordinal substitution rule (spec §4.4, §9
    /// Open Question 3) to an identity about to be written: a name-only
    /// identity the taxonomy can resolve is rewritten to ordinal-only; a
    /// (name, ordinal) pair that agrees with the bijection collapses to
    /// ordinal-only; one that disagrees (or that the taxonomy has no entry
    /// for) passes through unchanged; an ordinal-only identity is never
    /// touched (there is nothing to compress further).
    pub fn substitute_identity(
        &self,
        name: Option<&str>,
        ordinal: Option<i16>,
    ) -> (Option<String>, Option<i16>) {
        match (name, ordinal) {
            (Some(n), Some(o)) => {
                if self.matches(n, o) {
                    (None, Some(o))
                } else {
                    (Some(n.to_string()), Some(o))
                }
            }
            (Some(n), None) => match self.ordinal_for(n) {
                Some(o) => (None, Some(o)),
                None => (Some(n.to_string()), None),
            },
            (None, o) => (None, o),
        }
    }
}

/// Resolves a 16-bit taxonomy id to a [`Taxonomy`]; may return absent
/// (spec §3: "A Taxonomy Resolver maps id→taxonomy (may return absent)").
pub trait TaxonomyResolver: Send + Sync {
    fn resolve(&self, taxonomy_id: u16) -> Option<&Taxonomy>;
}

/// A resolver backed by a simple id->Taxonomy map.
#[derive(Clone, Debug, Default)]
pub struct MapResolver {
    taxonomies: HashMap<u16, Taxonomy>,
}

impl MapResolver {
    pub fn new() -> MapResolver {
        MapResolver {
            taxonomies: HashMap::new(),
        }
    }

    pub fn insert(&mut self, taxonomy: Taxonomy) {
        self.taxonomies.insert(taxonomy.id(), taxonomy);
    }
}

impl TaxonomyResolver for MapResolver {
    fn resolve(&self, taxonomy_id: u16) -> Option<&Taxonomy> {
        self.taxonomies.get(&taxonomy_id)
    }
}

/// A resolver that tries a primary resolver, then falls back to a
/// secondary one (§11.2 of `SPEC_FULL.md`: a supplemental convenience not
/// named verbatim by spec.md but consistent with `TaxonomyResolver` being
/// "just a trait" — real Fudge deployments commonly layer a
/// deployment-specific taxonomy over a shared default one).
pub struct ChainedResolver {
    primary: Box<dyn TaxonomyResolver>,
    fallback: Box<dyn TaxonomyResolver>,
}

impl ChainedResolver {
    pub fn new(primary: Box<dyn TaxonomyResolver>, fallback: Box<dyn TaxonomyResolver>) -> Self {
        Self { primary, fallback }
    }
}

impl TaxonomyResolver for ChainedResolver {
    fn resolve(&self, taxonomy_id: u16) -> Option<&Taxonomy> {
        self.primary
            .resolve(taxonomy_id)
            .or_else(|| self.fallback.resolve(taxonomy_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_round_trips_both_ways() {
        let mut tax = Taxonomy::new(1);
        tax.add(5, "price");
        assert_eq!(tax.name_for(5), Some("price"));
        assert_eq!(tax.ordinal_for("price"), Some(5));
        assert!(tax.matches("price", 5));
        assert!(!tax.matches("price", 6));
    }

    #[test]
    #[should_panic]
    fn id_zero_is_rejected() {
        Taxonomy::new(0);
    }

    #[test]
    fn substitute_identity_follows_spec_9_decision() {
        let mut tax = Taxonomy::new(1);
        tax.add(5, "price");

        // name-only, resolvable -> ordinal-only.
        assert_eq!(tax.substitute_identity(Some("price"), None), (None, Some(5)));
        // name+ordinal agreeing -> ordinal-only.
        assert_eq!(tax.substitute_identity(Some("price"), Some(5)), (None, Some(5)));
        // name+ordinal disagreeing -> both verbatim.
        assert_eq!(
            tax.substitute_identity(Some("price"), Some(6)),
            (Some("price".to_string()), Some(6))
        );
        // name-only, unresolvable -> unchanged.
        assert_eq!(
            tax.substitute_identity(Some("qty"), None),
            (Some("qty".to_string()), None)
        );
        // ordinal-only -> unchanged.
        assert_eq!(tax.substitute_identity(None, Some(5)), (None, Some(5)));
    }

    #[test]
    fn chained_resolver_falls_back() {
        let mut primary = MapResolver::new();
        let mut t1 = Taxonomy::new(1);
        t1.add(1, "a");
        primary.insert(t1);

        let mut fallback = MapResolver::new();
        let mut t2 = Taxonomy::new(2);
        t2.add(2, "b");
        fallback.insert(t2);

        let chained = ChainedResolver::new(Box::new(primary), Box::new(fallback));
        assert!(chained.resolve(1).is_some());
        assert!(chained.resolve(2).is_some());
        assert!(chained.resolve(3).is_none());
    }
}
