//! Byte ranges over the ordered keyspace.

use bytes::{Bytes, BytesMut};
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::ops::{Bound, RangeBounds};

/// Computes the lexicographic successor of every string prefixed by `data`.
///
/// Returns `None` if no such sequence exists (the input is empty or all
/// `0xFF` bytes), meaning a prefix range has no upper limit.
///
/// - `[0x61]` → `Some([0x62])`
/// - `[0x61, 0xFF]` → `Some([0x62])`
/// - `[0xFF]` → `None`
pub fn lex_increment(data: &[u8]) -> Option<Bytes> {
    let mut result = BytesMut::from(data);

    // trailing 0xFF bytes cannot be bumped, drop them and carry left
    while let Some(last) = result.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(result.freeze());
        }
        result.truncate(result.len() - 1);
    }

    None
}

/// A range over byte sequences, used for key range scans.
///
/// Bounds compare keys bytewise, the same order the store iterates in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BytesRange {
    pub start: Bound<Bytes>,
    pub end: Bound<Bytes>,
}

impl BytesRange {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// Creates the half-open range `[start, end)`.
    pub fn half_open(start: Bytes, end: Bytes) -> Self {
        Self {
            start: Included(start),
            end: Excluded(end),
        }
    }

    /// Creates the range `[start, ..)` with no upper limit.
    pub fn from_inclusive(start: Bytes) -> Self {
        Self {
            start: Included(start),
            end: Unbounded,
        }
    }

    /// Creates the range of all keys that begin with `prefix`.
    pub fn prefix(prefix: Bytes) -> Self {
        match lex_increment(&prefix) {
            Some(end) => Self::half_open(prefix, end),
            None if prefix.is_empty() => Self::unbounded(),
            None => Self::from_inclusive(prefix),
        }
    }

    /// Creates a range that scans everything.
    pub fn unbounded() -> Self {
        Self {
            start: Unbounded,
            end: Unbounded,
        }
    }

    pub fn contains(&self, k: &[u8]) -> bool {
        (match &self.start {
            Included(s) => k >= s.as_ref(),
            Excluded(s) => k > s.as_ref(),
            Unbounded => true,
        }) && (match &self.end {
            Included(e) => k <= e.as_ref(),
            Excluded(e) => k < e.as_ref(),
            Unbounded => true,
        })
    }
}

impl RangeBounds<Bytes> for BytesRange {
    fn start_bound(&self) -> Bound<&Bytes> {
        self.start.as_ref()
    }
    fn end_bound(&self) -> Bound<&Bytes> {
        self.end.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn should_increment_produce_strictly_greater_result(data: Vec<u8>) {
            prop_assume!(data.iter().any(|&b| b < 0xFF));

            let incremented = lex_increment(&data).unwrap();
            prop_assert!(incremented.as_ref() > data.as_slice());
        }

        #[test]
        fn should_prefix_range_contain_exactly_prefixed_keys(prefix: Vec<u8>, other: Vec<u8>) {
            let range = BytesRange::prefix(Bytes::from(prefix.clone()));

            prop_assert!(range.contains(&prefix));
            prop_assert_eq!(range.contains(&other), other.starts_with(&prefix));
        }

        #[test]
        fn should_unbounded_range_contain_every_key(key: Vec<u8>) {
            prop_assert!(BytesRange::unbounded().contains(&key));
        }

        #[test]
        fn should_half_open_range_exclude_its_end(start: Vec<u8>, end: Vec<u8>) {
            prop_assume!(start < end);

            let range = BytesRange::half_open(Bytes::from(start.clone()), Bytes::from(end.clone()));

            prop_assert!(range.contains(&start));
            prop_assert!(!range.contains(&end));
        }
    }

    #[test]
    fn should_increment_last_byte() {
        assert_eq!(lex_increment(b"a").unwrap().as_ref(), b"b");
        assert_eq!(lex_increment(&[0x00]).unwrap().as_ref(), &[0x01]);
        assert_eq!(lex_increment(&[0xFE]).unwrap().as_ref(), &[0xFF]);
    }

    #[test]
    fn should_drop_trailing_ff_before_incrementing() {
        assert_eq!(lex_increment(&[0x61, 0xFF]).unwrap().as_ref(), &[0x62]);
        assert_eq!(
            lex_increment(&[0x00, 0xFF, 0xFF]).unwrap().as_ref(),
            &[0x01]
        );
    }

    #[test]
    fn should_return_none_for_non_incrementable() {
        assert!(lex_increment(&[]).is_none());
        assert!(lex_increment(&[0xFF]).is_none());
        assert!(lex_increment(&[0xFF, 0xFF]).is_none());
    }

    #[test]
    fn should_leave_prefix_range_open_for_all_ff_prefix() {
        // when
        let range = BytesRange::prefix(Bytes::from_static(&[0xFF, 0xFF]));

        // then
        assert_eq!(range.end, Unbounded);
        assert!(range.contains(&[0xFF, 0xFF, 0xFF]));
        assert!(!range.contains(&[0xFF]));
    }

    #[test]
    fn should_scan_everything_for_empty_prefix() {
        assert_eq!(BytesRange::prefix(Bytes::new()), BytesRange::unbounded());
    }

    #[test]
    fn should_contain_keys_inside_half_open_range() {
        // given
        let range = BytesRange::half_open(Bytes::from("b"), Bytes::from("d"));

        // then
        assert!(range.contains(b"b"));
        assert!(range.contains(b"b\x00"));
        assert!(range.contains(b"c\xFF\xFF"));
        assert!(!range.contains(b"a\xFF"));
        assert!(!range.contains(b"d"));
        assert!(!range.contains(b"d\x00"));
    }

    #[test]
    fn should_treat_missing_upper_limit_as_open() {
        // given
        let range = BytesRange::from_inclusive(Bytes::from_static(&[0xFF, 0xFF]));

        // then
        assert!(range.contains(&[0xFF, 0xFF]));
        assert!(range.contains(&[0xFF, 0xFF, 0xFF, 0xFF]));
        assert!(!range.contains(&[0xFF, 0xFE]));
    }

    #[test]
    fn should_respect_excluded_start_and_included_end() {
        // given
        let range = BytesRange::new(
            Excluded(Bytes::from("a")),
            Included(Bytes::from("c")),
        );

        // then
        assert!(!range.contains(b"a"));
        assert!(range.contains(b"a\x00"));
        assert!(range.contains(b"c"));
        assert!(!range.contains(b"c\x00"));
    }

    #[test]
    fn should_expose_bounds_through_range_bounds() {
        // given
        let range = BytesRange::half_open(Bytes::from("x"), Bytes::from("y"));

        // then
        assert_eq!(range.start_bound(), Included(&Bytes::from("x")));
        assert_eq!(range.end_bound(), Excluded(&Bytes::from("y")));
    }
}
