use super::oblivious::{swap_sorted, Oblivious};

/// Number of lanes every kernel takes as input.
pub const LANES: usize = 5;

/// Compare-exchange units of the 5-lane sorting network, in execution order: four passes of
/// 4, 3, 2 and 1 adjacent comparators.
pub const SORT5_NETWORK: [(usize, usize); 10] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 1),
    (1, 2),
    (2, 3),
    (0, 1),
    (1, 2),
    (0, 1),
];

pub fn sort5<T: Oblivious>(v: &[T; LANES]) -> [T; LANES] {
    let mut lanes = v.clone();
    for &(i, j) in SORT5_NETWORK.iter() {
        let (lo, hi) = swap_sorted(&lanes[i], &lanes[j]);
        lanes[i] = lo;
        lanes[j] = hi;
    }
    lanes
}

/// Balanced reduction: `max(max(max(a0, a1), max(a2, a3)), a4)`.
pub fn max5<T: Oblivious>(v: &[T; LANES]) -> T {
    let [a0, a1, a2, a3, a4] = v;
    let m01 = a0.max(a1);
    let m23 = a2.max(a3);
    m01.max(&m23).max(a4)
}

pub fn mean5<T: Oblivious>(v: &[T; LANES]) -> T {
    let [a0, a1, a2, a3, a4] = v;
    a0.add(a1).add(a2).add(a3).add(a4).div_clear(LANES as u64)
}

pub fn sumsq5<T: Oblivious>(v: &[T; LANES]) -> T {
    let [a0, a1, a2, a3, a4] = v;
    a0.mul(a0)
        .add(&a1.mul(a1))
        .add(&a2.mul(a2))
        .add(&a3.mul(a3))
        .add(&a4.mul(a4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: [u64; LANES] = [42, 17, 99, 8, 63];

    #[test]
    fn sample_vector() {
        assert_eq!(sort5(&SAMPLE), [8, 17, 42, 63, 99]);
        assert_eq!(max5(&SAMPLE), 99);
        assert_eq!(mean5(&SAMPLE), 45);
        assert_eq!(sumsq5(&SAMPLE), 15887);
    }

    #[test]
    fn network_shape() {
        // every comparator is adjacent and pass lengths decrease
        assert!(SORT5_NETWORK.iter().all(|&(i, j)| j == i + 1));
        let pass_starts = SORT5_NETWORK
            .iter()
            .enumerate()
            .filter(|(_, pair)| pair.0 == 0)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        assert_eq!(pass_starts, vec![0, 4, 7, 9]);
    }

    #[test]
    fn sumsq_upper_bound_for_bytes() {
        assert_eq!(sumsq5(&[255; LANES]), 325_125);
        assert_eq!(mean5(&[255; LANES]), 255);
    }

    proptest! {
        #[test]
        fn sort5_matches_std_sort(v in prop::array::uniform5(0_u64..256)) {
            let mut expected = v;
            expected.sort_unstable();
            prop_assert_eq!(sort5(&v), expected);
        }

        #[test]
        fn max5_is_maximum(v in prop::array::uniform5(0_u64..65536)) {
            prop_assert_eq!(max5(&v), *v.iter().max().unwrap());
        }

        #[test]
        fn mean5_is_floor_mean(v in prop::array::uniform5(0_u64..65536)) {
            prop_assert_eq!(mean5(&v), v.iter().sum::<u64>() / 5);
        }

        #[test]
        fn sumsq5_is_sum_of_squares(v in prop::array::uniform5(0_u64..65536)) {
            prop_assert_eq!(sumsq5(&v), v.iter().map(|x| x * x).sum::<u64>());
        }
    }
}
