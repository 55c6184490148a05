//! Group/category numbering.
//!
//! A category number is its group's number followed by a per-group sequence
//! written in decimal: group 3 owns 31, 32, ... 39, 310, 311 and so on. The
//! value is kept as an explicit `(group, sequence)` pair and only composed into
//! the concatenated integer for storage and display, so computing the next
//! number never has to guess where the group prefix ends.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    #[error("group number must be a positive integer")]
    InvalidGroup,

    #[error("category sequence must start at 1")]
    InvalidSequence,

    #[error("category number {number} does not start with group number {group}")]
    PrefixMismatch { group: u32, number: i64 },

    #[error("category number {number} has no sequence after group number {group}")]
    MissingSequence { group: u32, number: i64 },

    #[error("category number {number} has a zero-padded sequence after group number {group}")]
    PaddedSequence { group: u32, number: i64 },

    #[error("category number for group {group} sequence {sequence} is out of range")]
    OutOfRange { group: u32, sequence: u64 },
}

/// A category number as its two explicit parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct CategoryNumber {
    group: u32,
    sequence: u32,
    value: i64,
}

impl CategoryNumber {
    pub fn new(group: u32, sequence: u32) -> Result<Self, NumberingError> {
        if group == 0 {
            return Err(NumberingError::InvalidGroup);
        }
        if sequence == 0 {
            return Err(NumberingError::InvalidSequence);
        }
        let value = compose(group, sequence).ok_or(NumberingError::OutOfRange {
            group,
            sequence: u64::from(sequence),
        })?;
        Ok(Self {
            group,
            sequence,
            value,
        })
    }

    /// The number the first category of `group` receives.
    pub fn first(group: u32) -> Result<Self, NumberingError> {
        Self::new(group, 1)
    }

    /// Splits a stored number into its parts, requiring the digits of `group`
    /// as prefix and a non-empty suffix without leading zeros.
    pub fn parse_for_group(group: u32, number: i64) -> Result<Self, NumberingError> {
        if group == 0 {
            return Err(NumberingError::InvalidGroup);
        }
        let digits = number.to_string();
        let suffix = digits
            .strip_prefix(&group.to_string())
            .ok_or(NumberingError::PrefixMismatch { group, number })?;

        if suffix.is_empty() {
            return Err(NumberingError::MissingSequence { group, number });
        }
        if suffix.starts_with('0') {
            return Err(NumberingError::PaddedSequence { group, number });
        }

        let sequence: u32 = suffix.parse().map_err(|_| NumberingError::OutOfRange {
            group,
            sequence: u64::MAX,
        })?;
        Self::new(group, sequence)
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The concatenated integer, e.g. 310 for group 3 sequence 10.
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn next(&self) -> Result<Self, NumberingError> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or(NumberingError::OutOfRange {
                group: self.group,
                sequence: u64::from(self.sequence) + 1,
            })?;
        Self::new(self.group, sequence)
    }

    /// Same sequence under a different group; used when a group is renumbered.
    pub fn regroup(&self, group: u32) -> Result<Self, NumberingError> {
        Self::new(group, self.sequence)
    }
}

impl fmt::Display for CategoryNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.group, self.sequence)
    }
}

/// Next number to hand out under `group`, given the numbers already assigned.
///
/// Numbers belonging to other groups are ignored. With nothing assigned yet
/// the group starts at sequence 1.
pub fn next_category_number<I>(group: u32, existing: I) -> Result<CategoryNumber, NumberingError>
where
    I: IntoIterator<Item = CategoryNumber>,
{
    existing
        .into_iter()
        .filter(|number| number.group() == group)
        .max_by_key(|number| number.sequence())
        .map_or_else(|| CategoryNumber::first(group), |highest| highest.next())
}

fn compose(group: u32, sequence: u32) -> Option<i64> {
    let width = sequence.checked_ilog10()? + 1;
    i64::from(group)
        .checked_mul(10_i64.checked_pow(width)?)?
        .checked_add(i64::from(sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;

    fn stored(group: u32, numbers: &[i64]) -> Vec<CategoryNumber> {
        numbers
            .iter()
            .map(|n| CategoryNumber::parse_for_group(group, *n).unwrap())
            .collect()
    }

    #[rstest]
    #[case(3, &[], 31)]
    #[case(3, &[31, 32], 33)]
    #[case(3, &[31, 32, 33, 34, 35, 36, 37, 38, 39], 310)]
    #[case(3, &[31, 310, 39], 311)]
    #[case(12, &[121], 122)]
    #[case(9, &[91], 92)]
    #[case(19, &[191, 199], 1910)]
    fn next_number_follows_convention(
        #[case] group: u32,
        #[case] existing: &[i64],
        #[case] expected: i64,
    ) {
        let next = next_category_number(group, stored(group, existing)).unwrap();
        assert_eq!(next.value(), expected);
        assert_eq!(next.to_string(), expected.to_string());
    }

    #[test]
    fn next_number_is_idempotent_without_inserts() {
        let existing = stored(3, &[31, 32]);
        let first = next_category_number(3, existing.clone()).unwrap();
        let second = next_category_number(3, existing).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn numbers_from_other_groups_are_ignored() {
        let mut existing = stored(3, &[31]);
        existing.extend(stored(4, &[41, 42, 43]));
        assert_eq!(next_category_number(3, existing).unwrap().value(), 32);
    }

    #[test]
    fn parse_splits_grown_sequence() {
        let number = CategoryNumber::parse_for_group(3, 310).unwrap();
        assert_eq!(number.group(), 3);
        assert_eq!(number.sequence(), 10);
    }

    #[test]
    fn parse_rejects_numbers_outside_convention() {
        assert_matches!(
            CategoryNumber::parse_for_group(3, 41),
            Err(NumberingError::PrefixMismatch { group: 3, number: 41 })
        );
        assert_matches!(
            CategoryNumber::parse_for_group(3, 3),
            Err(NumberingError::MissingSequence { .. })
        );
        assert_matches!(
            CategoryNumber::parse_for_group(3, 30),
            Err(NumberingError::PaddedSequence { .. })
        );
        assert_matches!(
            CategoryNumber::parse_for_group(3, 305),
            Err(NumberingError::PaddedSequence { .. })
        );
        assert_matches!(
            CategoryNumber::parse_for_group(3, -31),
            Err(NumberingError::PrefixMismatch { .. })
        );
        assert_matches!(
            CategoryNumber::parse_for_group(0, 1),
            Err(NumberingError::InvalidGroup)
        );
    }

    #[test]
    fn new_rejects_zero_parts() {
        assert_eq!(CategoryNumber::new(0, 1), Err(NumberingError::InvalidGroup));
        assert_eq!(CategoryNumber::new(3, 0), Err(NumberingError::InvalidSequence));
    }

    #[test]
    fn compose_overflow_is_reported() {
        assert_matches!(
            CategoryNumber::new(u32::MAX, u32::MAX),
            Err(NumberingError::OutOfRange { .. })
        );
    }

    #[test]
    fn regroup_keeps_sequence() {
        let number = CategoryNumber::new(3, 10).unwrap();
        let moved = number.regroup(7).unwrap();
        assert_eq!(moved.value(), 710);
        assert_eq!(moved.sequence(), 10);
    }

    proptest! {
        #[test]
        fn composed_number_parses_back(group in 1u32..100_000, sequence in 1u32..100_000) {
            let number = CategoryNumber::new(group, sequence).unwrap();
            let parsed = CategoryNumber::parse_for_group(group, number.value()).unwrap();
            prop_assert_eq!(parsed, number);
        }

        #[test]
        fn next_keeps_group_prefix(group in 1u32..10_000, count in 1u32..200) {
            let existing: Vec<_> = (1..=count)
                .map(|seq| CategoryNumber::new(group, seq).unwrap())
                .collect();
            let next = next_category_number(group, existing).unwrap();
            prop_assert_eq!(next.sequence(), count + 1);
            prop_assert!(next.to_string().starts_with(&group.to_string()));
        }
    }
}
