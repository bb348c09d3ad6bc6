//! Six independent fractal noise channels sampled in continuous world space.
//!
//! Each channel composites several octaves of simplex noise, where each
//! successive octave multiplies the frequency by `lacunarity` and the
//! amplitude by `persistence`. Channel `i` is seeded with `seed + i`, which
//! keeps the channels decorrelated while deriving all of them from one
//! world seed.

use noise::{NoiseFn, Simplex};

use crate::seed::fold_seed;

/// The noise channels the generator samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoiseChannel {
    /// Base elevation.
    Height,
    /// Climate temperature.
    Temperature,
    /// Climate moisture.
    Moisture,
    /// High-frequency elevation detail mixed into height.
    Detail,
    /// Cave carving mask.
    Cave,
    /// Structure placement mask.
    Structure,
}

impl NoiseChannel {
    /// All channels, in seed-offset order.
    pub const ALL: [NoiseChannel; 6] = [
        NoiseChannel::Height,
        NoiseChannel::Temperature,
        NoiseChannel::Moisture,
        NoiseChannel::Detail,
        NoiseChannel::Cave,
        NoiseChannel::Structure,
    ];

    /// Position in [`NoiseChannel::ALL`]; also the channel's seed offset.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase channel name.
    pub fn name(self) -> &'static str {
        match self {
            NoiseChannel::Height => "height",
            NoiseChannel::Temperature => "temperature",
            NoiseChannel::Moisture => "moisture",
            NoiseChannel::Detail => "detail",
            NoiseChannel::Cave => "cave",
            NoiseChannel::Structure => "structure",
        }
    }
}

/// Fractal parameters for one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctaveParams {
    /// Frequency of the first (lowest) octave, in cycles per tile.
    pub frequency: f64,
    /// Number of octaves to composite. Zero is treated as one.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
}

impl OctaveParams {
    /// Parameters with the usual lacunarity of 2 and persistence of 0.5.
    pub const fn new(frequency: f64, octaves: u32) -> Self {
        Self {
            frequency,
            octaves,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

/// Parameters for every channel, indexed by [`NoiseChannel::index`].
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    /// Per-channel fractal parameters.
    pub channels: [OctaveParams; 6],
}

impl NoiseParams {
    /// Parameters for one channel.
    pub fn get(&self, channel: NoiseChannel) -> &OctaveParams {
        &self.channels[channel.index()]
    }

    /// Mutable parameters for one channel.
    pub fn get_mut(&mut self, channel: NoiseChannel) -> &mut OctaveParams {
        &mut self.channels[channel.index()]
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            channels: [
                OctaveParams::new(0.01, 5),
                OctaveParams::new(0.004, 3),
                OctaveParams::new(0.005, 3),
                OctaveParams::new(0.08, 2),
                OctaveParams::new(0.05, 2),
                OctaveParams::new(0.1, 1),
            ],
        }
    }
}

struct FractalChannel {
    noise: Simplex,
    params: OctaveParams,
    max_amplitude: f64,
}

impl FractalChannel {
    fn new(seed: u64, params: OctaveParams) -> Self {
        let mut max_amplitude = 0.0;
        let mut amp = 1.0;
        for _ in 0..params.octaves.max(1) {
            max_amplitude += amp;
            amp *= params.persistence;
        }
        Self {
            noise: Simplex::new(fold_seed(seed)),
            params,
            max_amplitude,
        }
    }

    fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.frequency;
        let mut amplitude = 1.0;

        for _ in 0..self.params.octaves.max(1) {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        let v = if self.max_amplitude > 0.0 {
            total / self.max_amplitude
        } else {
            0.0
        };
        debug_assert!(!v.is_nan(), "noise produced NaN at ({x}, {y})");
        v.clamp(-1.0, 1.0)
    }
}

/// Deterministic sampler over all six channels.
///
/// Read-only after construction, so it can be shared across worker threads
/// without locking.
pub struct NoiseField {
    seed: u64,
    channels: [FractalChannel; 6],
}

impl NoiseField {
    /// Builds the six channels from a world seed.
    pub fn new(seed: u64, params: &NoiseParams) -> Self {
        let channels = std::array::from_fn(|i| FractalChannel::new(seed.wrapping_add(i as u64), params.channels[i]));
        Self { seed, channels }
    }

    /// The world seed the channels derive from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Samples `channel` at world position `(x, y)`, in `[-1, 1]`.
    pub fn sample(&self, channel: NoiseChannel, x: f64, y: f64) -> f64 {
        self.channels[channel.index()].sample(x, y)
    }

    /// Samples `channel` at `(x, y)`, remapped to `[0, 1]`.
    pub fn sample_normalized(&self, channel: NoiseChannel, x: f64, y: f64) -> f64 {
        ((self.sample(channel, x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Fractal parameters of `channel`.
    pub fn params(&self, channel: NoiseChannel) -> &OctaveParams {
        &self.channels[channel.index()].params
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish_non_exhaustive()
    }
}
