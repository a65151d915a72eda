//! Slide navigation targets

/// Where a slide change should go
///
/// Every target resolves by modular arithmetic, so any integer is a valid
/// request: `Index(-1)` is the last slide and `Relative(+1)` from the last
/// slide is the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdvanceTarget {
    /// Absolute slide index, wrapped into range
    Index(i64),
    /// Offset from the current slide
    Relative(i64),
    /// One forward
    Next,
    /// One back
    Previous,
}

impl AdvanceTarget {
    /// Coerce a host-supplied float index, mapping non-finite values to 0
    pub fn from_f64(index: f64) -> Self {
        if index.is_finite() {
            // `as` saturates at the i64 bounds
            AdvanceTarget::Index(index.trunc() as i64)
        } else {
            AdvanceTarget::Index(0)
        }
    }

    /// Resolve to an index in `[0, count)`. A count of 0 resolves to 0.
    pub fn resolve(self, current: usize, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let n = count as i128;
        let raw = match self {
            AdvanceTarget::Index(i) => i as i128,
            AdvanceTarget::Relative(d) => current as i128 + d as i128,
            AdvanceTarget::Next => current as i128 + 1,
            AdvanceTarget::Previous => current as i128 - 1,
        };
        raw.rem_euclid(n) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps_to_first() {
        assert_eq!(AdvanceTarget::Next.resolve(3, 4), 0);
        assert_eq!(AdvanceTarget::Next.resolve(0, 1), 0);
    }

    #[test]
    fn test_previous_wraps_to_last() {
        assert_eq!(AdvanceTarget::Previous.resolve(0, 4), 3);
    }

    #[test]
    fn test_index_wraps() {
        assert_eq!(AdvanceTarget::Index(-1).resolve(0, 5), 4);
        assert_eq!(AdvanceTarget::Index(12).resolve(0, 5), 2);
        assert!(AdvanceTarget::Relative(i64::MIN).resolve(3, 7) < 7);
    }

    #[test]
    fn test_from_f64_coerces_non_finite() {
        assert_eq!(AdvanceTarget::from_f64(f64::NAN), AdvanceTarget::Index(0));
        assert_eq!(AdvanceTarget::from_f64(f64::INFINITY), AdvanceTarget::Index(0));
        assert_eq!(AdvanceTarget::from_f64(2.9), AdvanceTarget::Index(2));
        assert_eq!(AdvanceTarget::from_f64(-1.5), AdvanceTarget::Index(-1));
    }

    #[test]
    fn test_zero_count() {
        assert_eq!(AdvanceTarget::Next.resolve(0, 0), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Next from the last slide is the first, previous from the first is the last
        #[test]
        fn wrap_around(count in 1usize..500) {
            prop_assert_eq!(AdvanceTarget::Next.resolve(count - 1, count), 0);
            prop_assert_eq!(AdvanceTarget::Previous.resolve(0, count), count - 1);
        }

        /// Every target resolves into range
        #[test]
        fn always_in_range(count in 1usize..500, current in 0usize..500, i in any::<i64>()) {
            let current = current % count;
            prop_assert!(AdvanceTarget::Index(i).resolve(current, count) < count);
            prop_assert!(AdvanceTarget::Relative(i).resolve(current, count) < count);
        }

        /// Next then previous returns to the start
        #[test]
        fn next_previous_inverse(count in 1usize..500, current in 0usize..500) {
            let current = current % count;
            let forward = AdvanceTarget::Next.resolve(current, count);
            prop_assert_eq!(AdvanceTarget::Previous.resolve(forward, count), current);
        }
    }
}
