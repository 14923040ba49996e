/// A fixed-width unsigned integer interpreted on a circular number line.
///
/// Values wrap from the type's maximum back to zero, and ordering is decided by
/// the shortest distance around the circle, so a value one step past the
/// maximum is still "more recent" than the maximum itself.
pub trait WrappingNumber: Copy + Eq + Ord {
    /// Half of the type's total range
    const HALF_RANGE: Self;

    /// Returns the successor of this value, wrapping from max to zero
    fn next(self) -> Self;

    /// Returns the modular sum of two values
    fn wrapping_sum(self, other: Self) -> Self;

    /// Returns whether this value is ahead of `other` on the circular number line
    fn is_more_recent(self, other: Self) -> bool;
}

macro_rules! impl_wrapping_number {
    ($int:ty) => {
        impl WrappingNumber for $int {
            const HALF_RANGE: Self = 1 << (<$int>::BITS - 1);

            fn next(self) -> Self {
                self.wrapping_add(1)
            }

            fn wrapping_sum(self, other: Self) -> Self {
                self.wrapping_add(other)
            }

            fn is_more_recent(self, other: Self) -> bool {
                // both subtractions are guarded by the comparison beside them
                ((self > other) && (self - other <= Self::HALF_RANGE))
                    || ((self < other) && (other - self > Self::HALF_RANGE))
            }
        }
    };
}

impl_wrapping_number!(u8);
impl_wrapping_number!(u16);
impl_wrapping_number!(u32);

/// Returns whether or not a wrapping number is greater than another
/// sequence_greater_than(2,1) will return true
/// sequence_greater_than(1,2) will return false
/// sequence_greater_than(1,1) will return false
///
/// # Examples
/// ```
/// # use lockstep_shared::sequence_greater_than;
/// assert!(sequence_greater_than(2u8, 1u8));
/// assert!(sequence_greater_than(0u16, u16::MAX));
/// assert!(!sequence_greater_than(7u32, 7u32));
/// ```
pub fn sequence_greater_than<N: WrappingNumber>(s1: N, s2: N) -> bool {
    s1.is_more_recent(s2)
}

/// Returns whether or not a wrapping number is less than another
/// sequence_less_than(1,2) will return true
/// sequence_less_than(2,1) will return false
/// sequence_less_than(1,1) will return false
pub fn sequence_less_than<N: WrappingNumber>(s1: N, s2: N) -> bool {
    sequence_greater_than(s2, s1)
}
