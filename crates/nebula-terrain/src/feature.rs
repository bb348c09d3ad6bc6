//! Feature placement: noise-gated structures and probability-rolled resources.
//!
//! Both passes walk a world-aligned grid of candidate tiles, so a candidate
//! belongs to exactly one chunk whatever the chunk size. All randomness comes
//! from per-chunk ChaCha streams derived from the world seed and the chunk
//! coordinate.

use std::ops::RangeInclusive;

use nebula_chunk::{BiomeId, ChunkPayload, ResourceInstance, ResourceKind, StructureInstance, StructureKind};
use rand::Rng;

use crate::biome::BiomeRegistry;
use crate::error::TerrainError;
use crate::noise_field::{NoiseChannel, NoiseField};
use crate::seed::{SeedPurpose, chunk_rng};

/// One biome's resource spawn rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRule {
    /// Biome name.
    pub biome: String,
    /// Resource spawned there.
    pub kind: ResourceKind,
    /// Spawn chance per candidate, in `[0, 1]`.
    pub probability: f64,
}

/// One biome's structure type.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureRule {
    /// Biome name.
    pub biome: String,
    /// Structure placed there.
    pub kind: StructureKind,
}

/// Placement rules in terms of biome names.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRules {
    /// Tiles between structure candidates.
    pub structure_stride: u32,
    /// Normalized structure-noise value a candidate must exceed.
    pub structure_threshold: f64,
    /// Tiles between resource candidates.
    pub resource_stride: u32,
    /// Resource quantity range, inclusive.
    pub quantity: RangeInclusive<u32>,
    /// Resource rules; biomes without one spawn nothing.
    pub resources: Vec<ResourceRule>,
    /// Structure rules; other biomes get `default_structure`.
    pub structures: Vec<StructureRule>,
    /// Structure for biomes without a rule.
    pub default_structure: StructureKind,
}

impl Default for FeatureRules {
    fn default() -> Self {
        let res = |biome: &str, kind, probability| ResourceRule {
            biome: biome.into(),
            kind,
            probability,
        };
        let st = |biome: &str, kind| StructureRule {
            biome: biome.into(),
            kind,
        };
        Self {
            structure_stride: 8,
            structure_threshold: 0.7,
            resource_stride: 4,
            quantity: 1..=5,
            resources: vec![
                res("forest", ResourceKind::Wood, 0.10),
                res("mountains", ResourceKind::Ore, 0.05),
                res("desert", ResourceKind::Crystal, 0.03),
                res("plains", ResourceKind::Herb, 0.08),
            ],
            structures: vec![
                st("forest", StructureKind::Tree),
                st("mountains", StructureKind::CaveEntrance),
                st("desert", StructureKind::Cactus),
            ],
            default_structure: StructureKind::House,
        }
    }
}

/// Scatters structures and resources across a generated chunk.
#[derive(Clone, Debug)]
pub struct FeaturePlacer {
    seed: u64,
    structure_stride: u32,
    structure_threshold: f64,
    resource_stride: u32,
    quantity: RangeInclusive<u32>,
    /// Indexed by biome id.
    structure_by_biome: Vec<StructureKind>,
    /// Indexed by biome id.
    resource_by_biome: Vec<Option<(ResourceKind, f64)>>,
    default_structure: StructureKind,
}

impl FeaturePlacer {
    /// Resolves `rules` against the registry.
    ///
    /// # Errors
    ///
    /// [`TerrainError::UnknownBiome`] if a rule names an unregistered biome and
    /// [`TerrainError::InvalidFeatureRules`] for zero strides, probabilities
    /// outside `[0, 1]`, or an empty or zero-based quantity range.
    pub fn new(seed: u64, rules: &FeatureRules, registry: &BiomeRegistry) -> Result<Self, TerrainError> {
        if rules.structure_stride == 0 || rules.resource_stride == 0 {
            return Err(TerrainError::InvalidFeatureRules("strides must be positive".into()));
        }
        if *rules.quantity.start() == 0 || rules.quantity.is_empty() {
            return Err(TerrainError::InvalidFeatureRules(format!(
                "quantity range {}..={} must be non-empty and positive",
                rules.quantity.start(),
                rules.quantity.end()
            )));
        }

        let n = registry.len();
        let mut structure_by_biome = vec![rules.default_structure; n];
        for rule in &rules.structures {
            let id = lookup(registry, &rule.biome)?;
            structure_by_biome[id.0 as usize] = rule.kind;
        }

        let mut resource_by_biome = vec![None; n];
        for rule in &rules.resources {
            if !(0.0..=1.0).contains(&rule.probability) {
                return Err(TerrainError::InvalidFeatureRules(format!(
                    "{} probability {} outside [0, 1]",
                    rule.biome, rule.probability
                )));
            }
            let id = lookup(registry, &rule.biome)?;
            resource_by_biome[id.0 as usize] = Some((rule.kind, rule.probability));
        }

        Ok(Self {
            seed,
            structure_stride: rules.structure_stride,
            structure_threshold: rules.structure_threshold,
            resource_stride: rules.resource_stride,
            quantity: rules.quantity.clone(),
            structure_by_biome,
            resource_by_biome,
            default_structure: rules.default_structure,
        })
    }

    /// Structure type placed in `biome`.
    pub fn structure_for(&self, biome: BiomeId) -> StructureKind {
        self.structure_by_biome
            .get(biome.0 as usize)
            .copied()
            .unwrap_or(self.default_structure)
    }

    /// Resource rule of `biome`, if it spawns anything.
    pub fn resource_for(&self, biome: BiomeId) -> Option<(ResourceKind, f64)> {
        self.resource_by_biome.get(biome.0 as usize).copied().flatten()
    }

    /// Appends structures and resources to a payload whose tiles are filled.
    ///
    /// Clears any existing feature lists first, so calling it twice yields
    /// the same result.
    pub fn place_into(&self, field: &NoiseField, payload: &mut ChunkPayload) {
        payload.structures.clear();
        payload.resources.clear();
        self.place_structures(field, payload);
        self.place_resources(payload);
    }

    fn place_structures(&self, field: &NoiseField, payload: &mut ChunkPayload) {
        let coord = payload.coord();
        let size = payload.size();
        let origin = coord.origin(size);
        let mut rng = chunk_rng(self.seed, coord, SeedPurpose::Structures);

        for ly in candidates(origin.y, size, self.structure_stride) {
            for lx in candidates(origin.x, size, self.structure_stride) {
                let tile = *payload.get(lx, ly);
                let wx = origin.x + f64::from(lx);
                let wy = origin.y + f64::from(ly);
                if field.sample_normalized(NoiseChannel::Structure, wx, wy) <= self.structure_threshold {
                    continue;
                }
                let jitter = glam::DVec2::new(rng.random::<f64>(), rng.random::<f64>());
                payload.structures.push(StructureInstance {
                    kind: self.structure_for(tile.biome),
                    position: glam::DVec2::new(wx, wy) + jitter,
                    biome: tile.biome,
                    height: tile.height,
                });
            }
        }
    }

    fn place_resources(&self, payload: &mut ChunkPayload) {
        let coord = payload.coord();
        let size = payload.size();
        let origin = coord.origin(size);
        let mut rng = chunk_rng(self.seed, coord, SeedPurpose::Resources);

        for ly in candidates(origin.y, size, self.resource_stride) {
            for lx in candidates(origin.x, size, self.resource_stride) {
                let tile = *payload.get(lx, ly);
                let Some((kind, probability)) = self.resource_for(tile.biome) else {
                    continue;
                };
                if !rng.random_bool(probability.clamp(0.0, 1.0)) {
                    continue;
                }
                let quantity = rng.random_range(self.quantity.clone());
                payload.resources.push(ResourceInstance {
                    kind,
                    position: glam::DVec2::new(origin.x + f64::from(lx), origin.y + f64::from(ly)),
                    biome: tile.biome,
                    quantity,
                });
            }
        }
    }
}

fn lookup(registry: &BiomeRegistry, name: &str) -> Result<BiomeId, TerrainError> {
    registry
        .lookup_by_name(name)
        .ok_or_else(|| TerrainError::UnknownBiome(name.to_owned()))
}

/// Local indices in `0..size` whose world coordinate is a multiple of `stride`.
fn candidates(origin: f64, size: u32, stride: u32) -> impl Iterator<Item = u32> {
    let offset = (origin as i64).rem_euclid(i64::from(stride)) as u32;
    let first = (stride - offset) % stride;
    (first..size).step_by(stride as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::default_biomes;
    use crate::noise_field::NoiseParams;
    use nebula_chunk::{ChunkCoord, TileSample, TileType};

    fn registry() -> BiomeRegistry {
        BiomeRegistry::from_defs(default_biomes()).expect("valid")
    }

    fn uniform_payload(coord: ChunkCoord, size: u32, biome: BiomeId, tile: TileType) -> ChunkPayload {
        let mut p = ChunkPayload::new(coord, size);
        for y in 0..size {
            for x in 0..size {
                p.set(
                    x,
                    y,
                    TileSample {
                        tile,
                        biome,
                        height: 0.6,
                        ..TileSample::default()
                    },
                );
            }
        }
        p
    }

    #[test]
    fn test_candidates_are_world_aligned() {
        assert_eq!(candidates(0.0, 16, 8).collect::<Vec<_>>(), vec![0, 8]);
        assert_eq!(candidates(-16.0, 16, 8).collect::<Vec<_>>(), vec![0, 8]);
        assert_eq!(candidates(10.0, 10, 4).collect::<Vec<_>>(), vec![2, 6]);
        assert_eq!(candidates(-10.0, 10, 4).collect::<Vec<_>>(), vec![2, 6]);
    }

    #[test]
    fn test_placement_is_deterministic() {
        let reg = registry();
        let forest = reg.lookup_by_name("forest").expect("forest");
        let field = NoiseField::new(42, &NoiseParams::default());
        let rules = FeatureRules {
            structure_threshold: 0.3,
            ..FeatureRules::default()
        };
        let placer = FeaturePlacer::new(42, &rules, &reg).expect("valid rules");

        let coord = ChunkCoord::new(3, -2);
        let mut a = uniform_payload(coord, 32, forest, TileType::Grass);
        let mut b = a.clone();
        placer.place_into(&field, &mut a);
        placer.place_into(&field, &mut b);
        assert_eq!(a.structures, b.structures);
        assert_eq!(a.resources, b.resources);

        let before = a.clone();
        placer.place_into(&field, &mut a);
        assert_eq!(a, before, "re-placing must not duplicate features");
    }

    #[test]
    fn test_structures_follow_biome_mapping() {
        let reg = registry();
        let field = NoiseField::new(1, &NoiseParams::default());
        let rules = FeatureRules {
            structure_threshold: 0.0,
            ..FeatureRules::default()
        };
        let placer = FeaturePlacer::new(1, &rules, &reg).expect("valid rules");

        for (biome, expected) in [
            ("forest", StructureKind::Tree),
            ("mountains", StructureKind::CaveEntrance),
            ("desert", StructureKind::Cactus),
            ("plains", StructureKind::House),
            ("snow", StructureKind::House),
        ] {
            let id = reg.lookup_by_name(biome).expect("registered");
            let mut p = uniform_payload(ChunkCoord::new(0, 0), 16, id, TileType::Grass);
            placer.place_into(&field, &mut p);
            assert!(!p.structures.is_empty(), "{biome}: threshold 0 should accept candidates");
            assert!(p.structures.len() <= 4, "{biome}: at most one structure per candidate");
            for s in &p.structures {
                assert_eq!(s.kind, expected, "{biome} structure");
                assert_eq!(s.biome, id);
                assert!((0.0..16.0).contains(&s.position.x) && (0.0..16.0).contains(&s.position.y));
            }
        }
    }

    #[test]
    fn test_water_candidates_place_default_structure() {
        let reg = registry();
        let ocean = reg.lookup_by_name("ocean").expect("ocean");
        let field = NoiseField::new(1, &NoiseParams::default());
        let rules = FeatureRules {
            structure_threshold: 0.0,
            ..FeatureRules::default()
        };
        let placer = FeaturePlacer::new(1, &rules, &reg).expect("valid rules");
        let mut p = uniform_payload(ChunkCoord::new(0, 0), 16, ocean, TileType::Water);
        placer.place_into(&field, &mut p);
        assert_eq!(p.structures.len(), 4, "every stride-8 candidate passes a zero threshold");
        assert!(p.structures.iter().all(|s| s.kind == StructureKind::House && s.biome == ocean));
        assert!(p.resources.is_empty(), "ocean has no resource rule");
    }

    #[test]
    fn test_structure_threshold_one_rejects_all() {
        let reg = registry();
        let plains = reg.lookup_by_name("plains").expect("plains");
        let field = NoiseField::new(1, &NoiseParams::default());
        let rules = FeatureRules {
            structure_threshold: 1.0,
            ..FeatureRules::default()
        };
        let placer = FeaturePlacer::new(1, &rules, &reg).expect("valid rules");
        let mut p = uniform_payload(ChunkCoord::new(5, 5), 64, plains, TileType::Grass);
        placer.place_into(&field, &mut p);
        assert!(p.structures.is_empty());
    }

    #[test]
    fn test_certain_resources_fill_every_candidate() {
        let reg = registry();
        let forest = reg.lookup_by_name("forest").expect("forest");
        let field = NoiseField::new(1, &NoiseParams::default());
        let rules = FeatureRules {
            resources: vec![ResourceRule {
                biome: "forest".into(),
                kind: ResourceKind::Wood,
                probability: 1.0,
            }],
            ..FeatureRules::default()
        };
        let placer = FeaturePlacer::new(1, &rules, &reg).expect("valid rules");
        let mut p = uniform_payload(ChunkCoord::new(-1, 0), 16, forest, TileType::Grass);
        placer.place_into(&field, &mut p);

        assert_eq!(p.resources.len(), 16, "4x4 candidates at stride 4");
        for r in &p.resources {
            assert_eq!(r.kind, ResourceKind::Wood);
            assert!((1..=5).contains(&r.quantity), "quantity {} out of range", r.quantity);
            assert_eq!(r.position.x.rem_euclid(4.0), 0.0);
        }
        let distinct: std::collections::HashSet<u32> = p.resources.iter().map(|r| r.quantity).collect();
        assert!(distinct.len() > 1, "quantities should vary");
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let reg = registry();
        let bad_biome = FeatureRules {
            structures: vec![StructureRule {
                biome: "tundra".into(),
                kind: StructureKind::Tree,
            }],
            ..FeatureRules::default()
        };
        assert!(matches!(
            FeaturePlacer::new(0, &bad_biome, &reg),
            Err(TerrainError::UnknownBiome(name)) if name == "tundra"
        ));

        let zero_stride = FeatureRules {
            resource_stride: 0,
            ..FeatureRules::default()
        };
        assert!(matches!(
            FeaturePlacer::new(0, &zero_stride, &reg),
            Err(TerrainError::InvalidFeatureRules(_))
        ));

        let zero_quantity = FeatureRules {
            quantity: 0..=3,
            ..FeatureRules::default()
        };
        assert!(FeaturePlacer::new(0, &zero_quantity, &reg).is_err());
    }
}
