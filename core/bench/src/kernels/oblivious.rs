//! The kernel-authoring interface.
//!
//! Kernels are generic over [`Oblivious`] and can only combine values through its methods.
//! None of them exposes a comparison result, so a kernel cannot branch on data derived from
//! its input. This is what makes every kernel safe to run on an encrypted backend, where the
//! only control flow available is the one fixed at compile time.

/// Total, data-oblivious operations on a fixed-width unsigned value.
pub trait Oblivious: Clone {
    fn min(&self, other: &Self) -> Self;

    fn max(&self, other: &Self) -> Self;

    fn add(&self, other: &Self) -> Self;

    fn mul(&self, other: &Self) -> Self;

    /// Floor division by a clear constant. The divisor must be non-zero.
    fn div_clear(&self, divisor: u64) -> Self;
}

impl Oblivious for u64 {
    fn min(&self, other: &Self) -> Self {
        Ord::min(*self, *other)
    }

    fn max(&self, other: &Self) -> Self {
        Ord::max(*self, *other)
    }

    fn add(&self, other: &Self) -> Self {
        self.wrapping_add(*other)
    }

    fn mul(&self, other: &Self) -> Self {
        self.wrapping_mul(*other)
    }

    fn div_clear(&self, divisor: u64) -> Self {
        self / divisor
    }
}

/// Compare-exchange: returns `(min(x, y), max(x, y))`.
pub fn swap_sorted<T: Oblivious>(x: &T, y: &T) -> (T, T) {
    (x.min(y), x.max(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 9, (3, 9))]
    #[case(9, 3, (3, 9))]
    #[case(7, 7, (7, 7))]
    #[case(0, u64::MAX, (0, u64::MAX))]
    fn swap_sorted_orders_pair(#[case] x: u64, #[case] y: u64, #[case] expected: (u64, u64)) {
        assert_eq!(swap_sorted(&x, &y), expected);
    }

    #[test]
    fn clear_division_floors() {
        assert_eq!(Oblivious::div_clear(&229_u64, 5), 45);
        assert_eq!(Oblivious::div_clear(&4_u64, 5), 0);
    }
}
