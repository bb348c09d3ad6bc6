//! Biome definition: the climate and elevation envelope of a single biome.

use nebula_chunk::TileType;

/// Closed interval within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl ValueRange {
    /// The whole unit interval.
    pub const FULL: Self = Self { min: 0.0, max: 1.0 };

    /// Creates a range. Validity is checked on registration.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `min <= max` and both lie in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.min) && (0.0..=1.0).contains(&self.max) && self.min <= self.max
    }

    /// Returns `true` if the range covers the whole unit interval.
    pub fn is_full(&self) -> bool {
        self.min <= 0.0 && self.max >= 1.0
    }

    /// How well `v` fits this range.
    ///
    /// 1.0 at the center, tapering linearly to 0.0 at either edge, and 0.0
    /// outside. A degenerate range scores 1.0 only on its single point.
    pub fn fit(&self, v: f64) -> f64 {
        if v < self.min || v > self.max {
            return 0.0;
        }
        let half_width = (self.max - self.min) * 0.5;
        if half_width <= 0.0 {
            return 1.0;
        }
        let center = self.min + half_width;
        (1.0 - (v - center).abs() / half_width).clamp(0.0, 1.0)
    }
}

/// Full descriptor for a biome type.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDef {
    /// Unique biome name (e.g., "forest").
    pub name: String,
    /// Accepted normalized height.
    pub height: ValueRange,
    /// Accepted normalized temperature.
    pub temperature: ValueRange,
    /// Accepted normalized moisture.
    pub moisture: ValueRange,
    /// Base tile override. `None` derives the tile from the biome name.
    pub surface: Option<TileType>,
}

impl BiomeDef {
    /// Creates a definition with the tile derived from its name.
    pub fn new(name: impl Into<String>, height: ValueRange, temperature: ValueRange, moisture: ValueRange) -> Self {
        Self {
            name: name.into(),
            height,
            temperature,
            moisture,
            surface: None,
        }
    }

    /// Returns `true` if every axis accepts the whole unit interval.
    pub fn is_universal(&self) -> bool {
        self.height.is_full() && self.temperature.is_full() && self.moisture.is_full()
    }

    /// Average of the three per-axis range fits.
    pub fn score(&self, height: f64, temperature: f64, moisture: f64) -> f64 {
        (self.height.fit(height) + self.temperature.fit(temperature) + self.moisture.fit(moisture)) / 3.0
    }

    /// The tile this biome lays down before cave carving.
    pub fn base_tile(&self) -> TileType {
        self.surface.unwrap_or_else(|| base_tile_for_name(&self.name))
    }
}

/// Base tile for the standard biome names; unknown names get grass.
pub fn base_tile_for_name(name: &str) -> TileType {
    match name {
        "ocean" => TileType::Water,
        "beach" | "desert" => TileType::Sand,
        "plains" | "forest" => TileType::Grass,
        "mountains" => TileType::Stone,
        "snow" => TileType::Snow,
        _ => TileType::Grass,
    }
}

/// The seven standard biomes, with `plains` as the universal catch-all.
///
/// Order matters: equal scores resolve to the earlier entry.
pub fn default_biomes() -> Vec<BiomeDef> {
    use ValueRange as R;
    vec![
        BiomeDef::new("ocean", R::new(0.0, 0.3), R::FULL, R::FULL),
        BiomeDef::new("beach", R::new(0.28, 0.36), R::new(0.2, 1.0), R::FULL),
        BiomeDef::new("plains", R::FULL, R::FULL, R::FULL),
        BiomeDef::new("forest", R::new(0.35, 0.75), R::new(0.3, 0.8), R::new(0.5, 1.0)),
        BiomeDef::new("desert", R::new(0.3, 0.7), R::new(0.6, 1.0), R::new(0.0, 0.35)),
        BiomeDef::new("mountains", R::new(0.65, 0.9), R::FULL, R::FULL),
        BiomeDef::new("snow", R::new(0.82, 1.0), R::new(0.0, 0.6), R::FULL),
    ]
}
