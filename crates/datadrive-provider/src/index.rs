use std::ops::RangeInclusive;

use rustc_hash::FxHashSet;

use crate::error::ProviderError;

/// A parsed 1-based index expression such as `"1, 3-5"`.
///
/// Ranges are kept as written and only expanded on request, so a wide
/// range costs nothing until it is checked against the rows on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpression {
    ranges: Vec<RangeInclusive<usize>>,
}

impl IndexExpression {
    pub fn from_indexes(indexes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            ranges: indexes.into_iter().map(|n| n..=n).collect(),
        }
    }

    pub fn ranges(&self) -> &[RangeInclusive<usize>] {
        &self.ranges
    }

    pub fn contains(&self, index: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&index))
    }

    /// The first index, in written order, that lies past `available` rows.
    pub fn first_beyond(&self, available: usize) -> Option<usize> {
        self.ranges
            .iter()
            .find(|r| *r.end() > available)
            .map(|r| (*r.start()).max(available + 1))
    }

    /// Every index in written order. Repeats keep their first position.
    pub fn indexes(&self) -> Vec<usize> {
        let mut seen = FxHashSet::default();
        self.ranges
            .iter()
            .flat_map(|r| r.clone())
            .filter(|n| seen.insert(*n))
            .collect()
    }
}

/// Parse an index expression.
///
/// Whitespace is ignored. Zero, reversed ranges, empty items and anything
/// non-numeric are rejected.
pub fn parse_index_expression(expression: &str) -> Result<IndexExpression, ProviderError> {
    let invalid = |message: String| ProviderError::InvalidIndex {
        expression: expression.to_string(),
        message,
    };

    let compact: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid("expression is empty".to_string()));
    }

    let mut ranges = Vec::new();
    for item in compact.split(',') {
        if item.is_empty() {
            return Err(invalid("empty item between commas".to_string()));
        }
        let (first, last) = match item.split_once('-') {
            Some((a, b)) => (parse_one(a, &invalid)?, parse_one(b, &invalid)?),
            None => {
                let n = parse_one(item, &invalid)?;
                (n, n)
            }
        };
        if first > last {
            return Err(invalid(format!("range `{item}` runs backwards")));
        }
        ranges.push(first..=last);
    }
    Ok(IndexExpression { ranges })
}

fn parse_one(
    text: &str,
    invalid: &impl Fn(String) -> ProviderError,
) -> Result<usize, ProviderError> {
    let n: usize = text
        .parse()
        .map_err(|_| invalid(format!("`{text}` is not an index")))?;
    if n == 0 {
        return Err(invalid("indexes start at 1".to_string()));
    }
    Ok(n)
}
