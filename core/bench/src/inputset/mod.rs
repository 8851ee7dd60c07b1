//! Deterministic, layered generation of the sample inputs a circuit is compiled against.
//!
//! Enumerating the whole input domain is out of reach (`2^(W*N)` vectors), so the set is
//! the concatenation of four structured layers, in this order:
//!
//! 1. axis sweep: each position alone across its range, the rest at a baseline;
//! 2. extremes and mixes: a handful of boundary patterns;
//! 3. adjacent-pair sweep: the joint range of every compare-exchange unit;
//! 4. random fill.
//!
//! Generation only depends on the input shape, the [`CoverageConfig`] and the random source,
//! so a fixed seed reproduces the exact same vector sequence.

use aes_prng::AesRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use strum_macros::Display;
use thiserror::Error;
use tracing::debug;

pub mod layers;
pub mod profile;

pub use profile::{CoverageConfig, CoverageProfile};

/// Widest element the generator accepts. Larger widths make the sweeps intractable.
pub const MAX_BIT_WIDTH: u32 = 16;

/// Largest number of vectors a generated set may hold.
pub const MAX_VECTORS: usize = 1 << 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Layer {
    #[strum(serialize = "axis sweep")]
    Axis,
    #[strum(serialize = "extremes")]
    Extremes,
    #[strum(serialize = "adjacent pairs")]
    AdjacentPairs,
    #[strum(serialize = "random fill")]
    Random,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputSetError {
    #[error("input shape needs at least one lane and a bit-width in 1..=16, got {lanes} lanes of {bit_width} bits")]
    InvalidShape { lanes: usize, bit_width: u32 },
    #[error("{layer} step must be positive")]
    InvalidStep { layer: Layer },
    #[error("baseline {baseline} exceeds the largest representable value {max}")]
    BaselineOutOfRange { baseline: u64, max: u64 },
    #[error("every coverage layer is disabled, the input set would be empty")]
    Empty,
    #[error("vector {index} does not match the input shape")]
    OutOfShape { index: usize },
    #[error("coverage configuration yields {vectors} vectors, more than the limit of {limit}")]
    TooLarge { vectors: u128, limit: usize },
}

/// Length and element width shared by every vector fed to a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    lanes: usize,
    bit_width: u32,
}

impl InputShape {
    pub fn new(lanes: usize, bit_width: u32) -> Result<Self, InputSetError> {
        if lanes == 0 || bit_width == 0 || bit_width > MAX_BIT_WIDTH {
            return Err(InputSetError::InvalidShape { lanes, bit_width });
        }
        Ok(Self { lanes, bit_width })
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// `2^W - 1`.
    pub fn max_value(&self) -> u64 {
        (1 << self.bit_width) - 1
    }

    /// Middle of the value range, the default baseline of the sweeps.
    pub fn midpoint(&self) -> u64 {
        1 << (self.bit_width - 1)
    }

    pub fn contains(&self, vector: &InputVector) -> bool {
        vector.values().len() == self.lanes
            && vector.values().iter().all(|&v| v <= self.max_value())
    }

    /// Uniformly random vector of this shape.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> InputVector {
        let max = self.max_value();
        InputVector((0..self.lanes).map(|_| rng.gen_range(0..=max)).collect())
    }

    fn grid(&self, step: usize) -> impl Iterator<Item = u64> {
        (0..=self.max_value()).step_by(step)
    }

    fn grid_len(&self, step: usize) -> usize {
        (1_usize << self.bit_width).div_ceil(step)
    }
}

/// One sample input: a fixed-length sequence of unsigned values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputVector(Vec<u64>);

impl InputVector {
    pub fn filled(lanes: usize, value: u64) -> Self {
        Self(vec![value; lanes])
    }

    /// Same vector with position `pos` replaced.
    pub fn with(mut self, pos: usize, value: u64) -> Self {
        self.0[pos] = value;
        self
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }
}

impl From<Vec<u64>> for InputVector {
    fn from(values: Vec<u64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[u64; N]> for InputVector {
    fn from(values: [u64; N]) -> Self {
        Self(values.to_vec())
    }
}

/// Number of vectors contributed by each layer, in generation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayerCounts {
    pub axis: usize,
    pub extremes: usize,
    pub pairs: usize,
    pub random: usize,
    /// Vectors given explicitly rather than generated.
    pub supplied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet {
    shape: InputShape,
    vectors: Vec<InputVector>,
    counts: LayerCounts,
}

impl InputSet {
    /// Build the set drawing the random layer from `rng`.
    ///
    /// The caller can keep using `rng` afterwards, which is how the driver derives its
    /// spot-check vectors from the same seed.
    pub fn generate<R: Rng + ?Sized>(
        shape: InputShape,
        config: &CoverageConfig,
        rng: &mut R,
    ) -> Result<Self, InputSetError> {
        let baseline = config.baseline().unwrap_or_else(|| shape.midpoint());
        if baseline > shape.max_value() {
            return Err(InputSetError::BaselineOutOfRange {
                baseline,
                max: shape.max_value(),
            });
        }
        if config.axis_step() == Some(0) {
            return Err(InputSetError::InvalidStep { layer: Layer::Axis });
        }
        if config.pair_step() == Some(0) {
            return Err(InputSetError::InvalidStep {
                layer: Layer::AdjacentPairs,
            });
        }

        let planned = planned_len(&shape, config);
        if planned > MAX_VECTORS as u128 {
            return Err(InputSetError::TooLarge {
                vectors: planned,
                limit: MAX_VECTORS,
            });
        }

        let mut vectors = Vec::with_capacity(planned as usize);
        let mut counts = LayerCounts::default();

        if let Some(step) = config.axis_step() {
            let layer = layers::axis_sweep(&shape, baseline, step);
            counts.axis = layer.len();
            vectors.extend(layer);
        }
        if config.extremes() {
            let layer = layers::extremes_and_mixes(&shape);
            counts.extremes = layer.len();
            vectors.extend(layer);
        }
        if let Some(step) = config.pair_step() {
            let layer = layers::adjacent_pairs(&shape, baseline, step);
            counts.pairs = layer.len();
            vectors.extend(layer);
        }
        let layer = layers::random_fill(&shape, config.random_count(), rng);
        counts.random = layer.len();
        vectors.extend(layer);

        if vectors.is_empty() {
            return Err(InputSetError::Empty);
        }
        debug!(
            axis = counts.axis,
            extremes = counts.extremes,
            pairs = counts.pairs,
            random = counts.random,
            "generated input set"
        );
        Ok(Self {
            shape,
            vectors,
            counts,
        })
    }

    /// Build the set from a fresh generator seeded with `seed`.
    pub fn generate_seeded(
        shape: InputShape,
        config: &CoverageConfig,
        seed: u64,
    ) -> Result<Self, InputSetError> {
        Self::generate(shape, config, &mut AesRng::seed_from_u64(seed))
    }

    /// Wrap an explicit list of vectors, for circuits compiled against hand-picked inputs.
    pub fn from_vectors(
        shape: InputShape,
        vectors: Vec<InputVector>,
    ) -> Result<Self, InputSetError> {
        if vectors.is_empty() {
            return Err(InputSetError::Empty);
        }
        if let Some(index) = vectors.iter().position(|v| !shape.contains(v)) {
            return Err(InputSetError::OutOfShape { index });
        }
        let counts = LayerCounts {
            supplied: vectors.len(),
            ..LayerCounts::default()
        };
        Ok(Self {
            shape,
            vectors,
            counts,
        })
    }

    pub fn shape(&self) -> &InputShape {
        &self.shape
    }

    pub fn counts(&self) -> &LayerCounts {
        &self.counts
    }

    pub fn vectors(&self) -> &[InputVector] {
        &self.vectors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InputVector> {
        self.vectors.iter()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Little-endian serialisation of the shape followed by every value, in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + 8 * self.len() * self.shape.lanes());
        bytes.extend_from_slice(&(self.shape.lanes() as u64).to_le_bytes());
        bytes.extend_from_slice(&self.shape.bit_width().to_le_bytes());
        for value in self.vectors.iter().flat_map(|v| v.values()) {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// SHA3-256 of [`InputSet::to_bytes`], used to check that two runs compiled against the
    /// same inputs.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha3_256::digest(self.to_bytes()))
    }
}

/// Number of vectors `config` produces for `shape`, computed before anything is allocated.
fn planned_len(shape: &InputShape, config: &CoverageConfig) -> u128 {
    let lanes = shape.lanes() as u128;
    let mut total = config.random_count() as u128;
    if let Some(step) = config.axis_step() {
        total += lanes * shape.grid_len(step) as u128;
    }
    if config.extremes() {
        total += layers::extremes_and_mixes(shape).len() as u128;
    }
    if let Some(step) = config.pair_step() {
        let grid = shape.grid_len(step) as u128;
        total += lanes.saturating_sub(1) * grid * grid;
    }
    total
}

impl<'a> IntoIterator for &'a InputSet {
    type Item = &'a InputVector;
    type IntoIter = std::slice::Iter<'a, InputVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}
