use std::collections::BTreeSet;
use std::fmt::Write;

use chumsky::Parser;
use chumsky::primitive::just;

use crate::common::error::SpecError;
use crate::common::parser::{CharParser, ParseError, all_consuming, parse_u32};

/// Upper bound on the number of node numbers a range string may expand to.
pub const MAX_RANGE_LENGTH: u32 = 10_000;

/// Parse a single term in the format n[-end] into its inclusive bounds.
/// A range has to contain at least two numbers, `3-3` and `3-2` are rejected.
fn parse_term() -> impl CharParser<(u32, u32)> {
    let first = parse_u32().labelled("first");
    let last = just('-').ignore_then(parse_u32()).labelled("last").or_not();

    first
        .then(last)
        .try_map(|(first, last), span| {
            if first == 0 {
                return Err(ParseError::custom(span, "Node numbers start at 1"));
            }
            match last {
                None => Ok((first, first)),
                Some(last) if last > first => Ok((first, last)),
                Some(_) => Err(ParseError::custom(
                    span,
                    "The end of a range has to be greater than its start",
                )),
            }
        })
        .labelled("range")
}

/// Parses terms separated by `+`.
fn parse_terms() -> impl CharParser<Vec<(u32, u32)>> {
    parse_term().separated_by(just('+')).at_least(1)
}

/// Expands a range string like `1-4+6+7-8` into `[1, 2, 3, 4, 6, 7, 8]`.
/// Terms are expanded in input order, they are neither sorted nor deduplicated.
/// At most [`MAX_RANGE_LENGTH`] numbers are produced.
pub fn expand_range(input: &str) -> crate::Result<Vec<u32>> {
    let terms = all_consuming(parse_terms())
        .parse_text(input)
        .map_err(SpecError::InvalidRangeSyntax)?;

    let total: u64 = terms
        .iter()
        .map(|(first, last)| u64::from(last - first) + 1)
        .sum();
    if total > u64::from(MAX_RANGE_LENGTH) {
        return Err(SpecError::InvalidRangeSyntax(format!(
            "Range `{input}` is too large, it selects {total} nodes but at most {MAX_RANGE_LENGTH} are allowed"
        )));
    }
    Ok(terms
        .into_iter()
        .flat_map(|(first, last)| first..=last)
        .collect())
}

/// Formats numbers into the shortest range string accepted by [`expand_range`].
/// The numbers are sorted and deduplicated first.
pub fn compact_range(numbers: impl IntoIterator<Item = u32>) -> String {
    let numbers: BTreeSet<u32> = numbers.into_iter().collect();
    let mut runs: Vec<(u32, u32)> = Vec::new();
    for number in numbers {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == number => *last = number,
            _ => runs.push((number, number)),
        }
    }

    let mut output = String::new();
    for (index, (first, last)) in runs.into_iter().enumerate() {
        if index > 0 {
            output.push('+');
        }
        if first == last {
            let _ = write!(output, "{first}");
        } else {
            let _ = write!(output, "{first}-{last}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_error(input: &str) -> String {
        match expand_range(input) {
            Err(SpecError::InvalidRangeSyntax(message)) => message,
            result => panic!("Expected invalid range for {input:?}, got {result:?}"),
        }
    }

    #[test]
    fn test_expand_single() {
        assert_eq!(expand_range("34").unwrap(), vec![34]);
    }

    #[test]
    fn test_expand_terms() {
        assert_eq!(expand_range("1-4+6+7-8").unwrap(), vec![1, 2, 3, 4, 6, 7, 8]);
        assert_eq!(expand_range("7-8+1-2").unwrap(), vec![7, 8, 1, 2]);
    }

    #[test]
    fn test_expand_keeps_duplicates() {
        assert_eq!(expand_range("2+1-3").unwrap(), vec![2, 1, 2, 3]);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert!(range_error("3-3").contains("greater than its start"));
        assert!(range_error("3-2").contains("greater than its start"));
    }

    #[test]
    fn test_huge_ranges() {
        assert!(range_error("1-4294967295").contains("is too large"));
        assert!(range_error("1-6000+10001-16000").contains("is too large"));
        assert_eq!(
            expand_range(&format!("1-{MAX_RANGE_LENGTH}")).unwrap().len(),
            MAX_RANGE_LENGTH as usize
        );
    }

    #[test]
    fn test_invalid_tokens() {
        range_error("a-b");
        range_error("1-4-5");
        range_error("");
        range_error("1+");
        range_error("1,2");
        range_error("-3");
    }

    #[test]
    fn test_zero_is_rejected() {
        assert!(range_error("0-4").contains("Node numbers start at 1"));
    }

    #[test]
    fn test_error_echoes_input() {
        let message = range_error("1-4-5");
        assert_eq!(message.lines().nth(1), Some("  1-4-5"));
    }

    #[test]
    fn test_compact_range() {
        assert_eq!(compact_range([1, 2, 3, 4, 6, 7, 8]), "1-4+6+7-8");
        assert_eq!(compact_range([8, 1, 3, 2, 2]), "1-3+8");
        assert_eq!(compact_range([5]), "5");
        assert_eq!(compact_range(Vec::<u32>::new()), "");
    }

    #[test]
    fn test_compact_range_is_accepted_by_expand() {
        let numbers = vec![1, 2, 5, 9, 10, 11];
        assert_eq!(expand_range(&compact_range(numbers.clone())).unwrap(), numbers);
    }
}
