//! Small numeric helpers

/// Unsigned counters that wrap around
pub trait SequenceNumber: Copy + Ord {
    /// `self - other` with wrap-around
    fn distance(self, other: Self) -> Self;
    /// Half the type's range
    fn half_range() -> Self;
}

macro_rules! impl_sequence_number {
    ($($ty:ty),*) => {
        $(
            impl SequenceNumber for $ty {
                fn distance(self, other: Self) -> Self {
                    self.wrapping_sub(other)
                }

                fn half_range() -> Self {
                    <$ty>::MAX >> 1
                }
            }
        )*
    };
}

impl_sequence_number!(u8, u16, u32, u64, u128, usize);

/// True if `s1` is newer than `s2`, allowing the counter to have wrapped.
///
/// `s1` is newer when it is ahead of `s2` by at most half the range, or
/// behind it by more than half the range.
pub fn is_sequence_more_recent<T: SequenceNumber>(s1: T, s2: T) -> bool {
    let half = T::half_range();
    (s1 > s2 && s1.distance(s2) <= half) || (s2 > s1 && s2.distance(s1) > half)
}
