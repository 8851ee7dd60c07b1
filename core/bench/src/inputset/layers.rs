//! The individual coverage layers. Each returns its vectors in generation order.

use super::{InputShape, InputVector};
use rand::Rng;

/// Every position, in turn, swept across the full range while the others sit at `baseline`.
pub fn axis_sweep(shape: &InputShape, baseline: u64, step: usize) -> Vec<InputVector> {
    let mut out = Vec::with_capacity(shape.lanes() * shape.grid_len(step));
    for pos in 0..shape.lanes() {
        for value in shape.grid(step) {
            out.push(InputVector::filled(shape.lanes(), baseline).with(pos, value));
        }
    }
    out
}

/// Hand-picked boundary patterns that stress the sum and sum-of-squares upper bounds.
pub fn extremes_and_mixes(shape: &InputShape) -> Vec<InputVector> {
    let lanes = shape.lanes();
    let max = shape.max_value();

    let mut out = vec![
        InputVector::filled(lanes, 0),
        InputVector::filled(lanes, max),
    ];
    for pos in [0, 1] {
        if pos < lanes {
            out.push(InputVector::filled(lanes, 0).with(pos, max));
        }
    }
    out.push(InputVector::filled(lanes, max).with(lanes - 1, 0));
    // clustered mid and high values, 100 and 200 on a byte
    out.push(InputVector::filled(lanes, max * 100 / 255));
    out.push(InputVector::filled(lanes, max * 200 / 255));
    out
}

/// Joint sweep of each adjacent pair `(i, i + 1)`, the inputs of one compare-exchange unit.
pub fn adjacent_pairs(shape: &InputShape, baseline: u64, step: usize) -> Vec<InputVector> {
    let lanes = shape.lanes();
    let grid_len = shape.grid_len(step);
    let mut out = Vec::with_capacity(lanes.saturating_sub(1) * grid_len * grid_len);
    for i in 0..lanes.saturating_sub(1) {
        for v in shape.grid(step) {
            for w in shape.grid(step) {
                out.push(
                    InputVector::filled(lanes, baseline)
                        .with(i, v)
                        .with(i + 1, w),
                );
            }
        }
    }
    out
}

pub fn random_fill<R: Rng + ?Sized>(
    shape: &InputShape,
    count: usize,
    rng: &mut R,
) -> Vec<InputVector> {
    (0..count).map(|_| shape.sample(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_prng::AesRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn byte_shape() -> InputShape {
        InputShape::new(5, 8).unwrap()
    }

    #[test]
    fn axis_sweep_hits_each_value_once_per_position() {
        let shape = byte_shape();
        for step in [1, 3, 8] {
            let vectors = axis_sweep(&shape, 128, step);
            assert_eq!(vectors.len(), 5 * 256_usize.div_ceil(step));
            for pos in 0..5 {
                for x in (0..256_u64).step_by(step) {
                    let hits = vectors
                        .iter()
                        .filter(|v| {
                            v.values()[pos] == x
                                && v.values()
                                    .iter()
                                    .enumerate()
                                    .all(|(j, &y)| j == pos || y == 128)
                        })
                        .count();
                    // x == 128 also matches the sweeps of the other positions at their baseline
                    let expected = if x == 128 { 5 } else { 1 };
                    assert_eq!(hits, expected, "pos {pos} value {x} step {step}");
                }
            }
        }
    }

    #[test]
    fn axis_sweep_reaches_both_ends_with_unit_step() {
        let vectors = axis_sweep(&byte_shape(), 128, 1);
        for pos in 0..5 {
            assert!(vectors.iter().any(|v| v.values()[pos] == 0));
            assert!(vectors.iter().any(|v| v.values()[pos] == 255));
        }
    }

    #[test]
    fn extremes_for_bytes() {
        let vectors = extremes_and_mixes(&byte_shape());
        let expected: Vec<InputVector> = vec![
            vec![0, 0, 0, 0, 0].into(),
            vec![255, 255, 255, 255, 255].into(),
            vec![255, 0, 0, 0, 0].into(),
            vec![0, 255, 0, 0, 0].into(),
            vec![255, 255, 255, 255, 0].into(),
            vec![100, 100, 100, 100, 100].into(),
            vec![200, 200, 200, 200, 200].into(),
        ];
        assert_eq!(vectors, expected);
    }

    #[test]
    fn extremes_skip_missing_positions() {
        let shape = InputShape::new(1, 4).unwrap();
        let vectors = extremes_and_mixes(&shape);
        assert_eq!(vectors.len(), 6);
        assert!(vectors.iter().all(|v| v.values().len() == 1));
        assert!(vectors.iter().all(|v| shape.contains(v)));
    }

    #[test]
    fn adjacent_pairs_cover_grid_exactly_once() {
        let shape = byte_shape();
        let step = 16;
        let vectors = adjacent_pairs(&shape, 128, step);
        assert_eq!(vectors.len(), 4 * 16 * 16);

        let mut seen: HashMap<(usize, u64, u64), usize> = HashMap::new();
        for (idx, v) in vectors.iter().enumerate() {
            let i = idx / 256;
            let values = v.values();
            assert!(values
                .iter()
                .enumerate()
                .all(|(j, &y)| j == i || j == i + 1 || y == 128));
            *seen.entry((i, values[i], values[i + 1])).or_default() += 1;
        }
        for i in 0..4 {
            for v in (0..256).step_by(step) {
                for w in (0..256).step_by(step) {
                    assert_eq!(seen.get(&(i, v, w)), Some(&1), "pair {i} ({v}, {w})");
                }
            }
        }
    }

    #[test]
    fn adjacent_pairs_single_lane_is_empty() {
        let shape = InputShape::new(1, 8).unwrap();
        assert!(adjacent_pairs(&shape, 128, 8).is_empty());
    }

    #[test]
    fn random_fill_is_seeded_and_in_range() {
        let shape = byte_shape();
        let a = random_fill(&shape, 32, &mut AesRng::seed_from_u64(7));
        let b = random_fill(&shape, 32, &mut AesRng::seed_from_u64(7));
        let c = random_fill(&shape, 32, &mut AesRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|v| shape.contains(v)));
    }
}
