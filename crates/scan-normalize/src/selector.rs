//! Sheet selectors such as `1,3-5,7`
//!
//! Grammar: `selector := token (',' token)*`, `token := INT | INT '-' INT`.
//! Every range names both bounds, integers start at 1.

use crate::types::*;
use std::fmt;
use std::str::FromStr;

/// A validated set of 1-based sheet (or position) numbers.
///
/// Stored as sorted, disjoint, non-adjacent inclusive ranges, so a wide
/// range costs the same as a single number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MultiIndex {
    ranges: Vec<(usize, usize)>,
}

impl MultiIndex {
    /// Parse a selector expression
    pub fn parse(input: &str) -> Result<Self> {
        let mut ranges = Vec::new();

        if input.trim().is_empty() {
            return Err(ScanError::selector(input, "empty selector"));
        }

        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(ScanError::selector(input, "empty entry"));
            }

            match token.split_once('-') {
                None => {
                    let index = parse_index(input, token)?;
                    ranges.push((index, index));
                }
                Some((start, end)) => {
                    if start.trim().is_empty() || end.trim().is_empty() {
                        return Err(ScanError::selector(
                            input,
                            format!("range '{}' must name both bounds", token),
                        ));
                    }
                    let start = parse_index(input, start.trim())?;
                    let end = parse_index(input, end.trim())?;
                    if start > end {
                        return Err(ScanError::selector(
                            input,
                            format!("range '{}' runs backwards", token),
                        ));
                    }
                    ranges.push((start, end));
                }
            }
        }

        Ok(Self {
            ranges: merge(ranges),
        })
    }

    pub fn contains(&self, index: usize) -> bool {
        let pos = self.ranges.partition_point(|&(_, end)| end < index);
        self.ranges
            .get(pos)
            .is_some_and(|&(start, _)| start <= index)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of selected indices
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|&(start, end)| end - start + 1).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|&(start, end)| start..=end)
    }

    pub fn max(&self) -> Option<usize> {
        self.ranges.last().map(|&(_, end)| end)
    }

    /// Smallest index selected by both `self` and `other`
    pub fn first_common(&self, other: &MultiIndex) -> Option<usize> {
        let (mut i, mut j) = (0, 0);
        while let (Some(&(a_start, a_end)), Some(&(b_start, b_end))) =
            (self.ranges.get(i), other.ranges.get(j))
        {
            let start = a_start.max(b_start);
            if start <= a_end.min(b_end) {
                return Some(start);
            }
            if a_end < b_end {
                i += 1;
            } else {
                j += 1;
            }
        }
        None
    }
}

/// Sort and join overlapping or touching ranges
fn merge(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn parse_index(input: &str, token: &str) -> Result<usize> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(ScanError::selector(
            input,
            format!("'{}' is not a positive integer", token),
        ));
    }
    let value: usize = token
        .parse()
        .map_err(|_| ScanError::selector(input, format!("'{}' is out of range", token)))?;
    if value == 0 {
        return Err(ScanError::selector(input, "numbering starts at 1"));
    }
    Ok(value)
}

impl FromStr for MultiIndex {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        MultiIndex::parse(s)
    }
}

impl TryFrom<String> for MultiIndex {
    type Error = ScanError;

    fn try_from(value: String) -> Result<Self> {
        MultiIndex::parse(&value)
    }
}

impl From<MultiIndex> for String {
    fn from(value: MultiIndex) -> Self {
        value.to_string()
    }
}

/// Renders the canonical form, collapsing runs into ranges
impl fmt::Display for MultiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &(start, end)) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}
