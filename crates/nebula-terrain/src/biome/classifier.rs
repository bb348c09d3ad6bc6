//! Best-fit biome selection over a [`BiomeRegistry`].

use nebula_chunk::BiomeId;

use super::{BiomeDef, BiomeRegistry, BiomeRegistryError};

/// Maps normalized (height, temperature, moisture) to a biome.
///
/// Every biome is scored by the average of its three per-axis range fits.
/// The highest score wins and equal scores go to the biome registered first,
/// so reordering the table changes classification. When every biome scores
/// zero the registry's first universal entry is returned.
#[derive(Clone, Debug)]
pub struct BiomeClassifier {
    registry: BiomeRegistry,
    fallback: BiomeId,
}

impl BiomeClassifier {
    /// Wraps a registry, checking that classification is total.
    ///
    /// # Errors
    ///
    /// [`BiomeRegistryError::Empty`] for an empty registry and
    /// [`BiomeRegistryError::NoFallback`] if no entry accepts the whole unit cube.
    pub fn new(registry: BiomeRegistry) -> Result<Self, BiomeRegistryError> {
        if registry.is_empty() {
            return Err(BiomeRegistryError::Empty);
        }
        let fallback = registry.fallback().ok_or(BiomeRegistryError::NoFallback)?;
        Ok(Self { registry, fallback })
    }

    /// Selects the biome for the given normalized values.
    pub fn classify(&self, height: f64, temperature: f64, moisture: f64) -> BiomeId {
        debug_assert!(
            !(height.is_nan() || temperature.is_nan() || moisture.is_nan()),
            "classifier input is NaN"
        );
        let (h, t, m) = (height.clamp(0.0, 1.0), temperature.clamp(0.0, 1.0), moisture.clamp(0.0, 1.0));

        let mut best = self.fallback;
        let mut best_score = 0.0;
        for (id, def) in self.registry.iter() {
            let score = def.score(h, t, m);
            if score > best_score {
                best = id;
                best_score = score;
            }
        }
        best
    }

    /// Score of one biome, for diagnostics.
    pub fn score(&self, id: BiomeId, height: f64, temperature: f64, moisture: f64) -> Option<f64> {
        self.registry.try_get(id).map(|d| d.score(height, temperature, moisture))
    }

    /// The biome returned when nothing matches.
    pub fn fallback(&self) -> BiomeId {
        self.fallback
    }

    /// The underlying registry.
    pub fn registry(&self) -> &BiomeRegistry {
        &self.registry
    }

    /// Definition of a classified biome.
    pub fn def(&self, id: BiomeId) -> &BiomeDef {
        self.registry.get(id)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::biome::{ValueRange, default_biomes};

    fn classifier() -> BiomeClassifier {
        BiomeClassifier::new(BiomeRegistry::from_defs(default_biomes()).expect("valid")).expect("has fallback")
    }

    fn name(c: &BiomeClassifier, h: f64, t: f64, m: f64) -> &str {
        &c.def(c.classify(h, t, m)).name
    }

    #[test]
    fn test_range_centers_select_their_biome() {
        let c = classifier();
        assert_eq!(name(&c, 0.1, 0.5, 0.5), "ocean");
        assert_eq!(name(&c, 0.5, 0.5, 0.5), "plains");
        assert_eq!(name(&c, 0.55, 0.55, 0.75), "forest");
        assert_eq!(name(&c, 0.5, 0.8, 0.175), "desert");
        assert_eq!(name(&c, 0.775, 0.5, 0.5), "mountains");
        assert_eq!(name(&c, 0.91, 0.3, 0.5), "snow");
    }

    #[test]
    fn test_all_zero_scores_use_fallback() {
        let c = classifier();
        assert_eq!(name(&c, 0.0, 0.0, 0.0), "plains");
        assert_eq!(name(&c, 1.0, 1.0, 1.0), "plains");
        assert_eq!(c.fallback(), BiomeId(2));
    }

    #[test]
    fn test_ties_go_to_first_listed() {
        let reg = BiomeRegistry::from_defs(vec![
            BiomeDef::new("first", ValueRange::FULL, ValueRange::FULL, ValueRange::FULL),
            BiomeDef::new("second", ValueRange::FULL, ValueRange::FULL, ValueRange::FULL),
        ])
        .expect("valid");
        let c = BiomeClassifier::new(reg).expect("has fallback");
        for v in [0.1, 0.5, 0.9] {
            assert_eq!(c.classify(v, v, v), BiomeId(0), "equal scores must resolve to the first entry");
        }
    }

    #[test]
    fn test_random_triples_always_classify() {
        let c = classifier();
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        for _ in 0..10_000 {
            let (h, t, m) = (rng.random::<f64>(), rng.random::<f64>(), rng.random::<f64>());
            let id = c.classify(h, t, m);
            assert!(c.registry().try_get(id).is_some(), "({h}, {t}, {m}) produced unknown {id:?}");
        }
    }

    #[test]
    fn test_small_perturbations_are_stable() {
        let c = classifier();
        let a = c.classify(0.55, 0.55, 0.75);
        let b = c.classify(0.5501, 0.5499, 0.7502);
        assert_eq!(a, b);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            BiomeClassifier::new(BiomeRegistry::new()).expect_err("empty"),
            BiomeRegistryError::Empty
        );
        let reg = BiomeRegistry::from_defs(vec![BiomeDef::new(
            "ocean",
            ValueRange::new(0.0, 0.3),
            ValueRange::FULL,
            ValueRange::FULL,
        )])
        .expect("valid");
        assert_eq!(BiomeClassifier::new(reg).expect_err("no fallback"), BiomeRegistryError::NoFallback);
    }
}
