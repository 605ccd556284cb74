use std::fmt::Write;

use chumsky::Parser;
use chumsky::error::{Simple, SimpleReason};
use chumsky::primitive::{end, filter};
use colored::Color;

pub type ParseError = Simple<char>;

/// Parser over characters that can render its failures for the terminal.
pub trait CharParser<T>: Parser<char, T, Error = ParseError> + Sized {
    fn parse_text(&self, input: &str) -> Result<T, String> {
        self.parse(input)
            .map_err(|errors| format_errors_cli(input, errors))
    }
}
impl<T, P> CharParser<T> for P where P: Parser<char, T, Error = ParseError> {}

#[cfg(not(test))]
fn color_string<S: AsRef<str>>(string: S, color: Color) -> colored::ColoredString {
    use colored::Colorize;
    string.as_ref().color(color)
}

#[cfg(test)]
fn color_string<S: AsRef<str>>(string: S, _color: Color) -> String {
    string.as_ref().to_string()
}

fn describe_expected(error: &ParseError) -> String {
    let mut expected: Vec<String> = error
        .expected()
        .map(|item| match item {
            Some(c) => c.to_string(),
            None => "<end of input>".to_string(),
        })
        .collect();
    if expected.is_empty() {
        return "something else".to_string();
    }
    expected.sort_unstable();
    expected
        .into_iter()
        .map(|item| color_string(item, Color::Blue).to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

fn describe_note(error: &ParseError) -> String {
    match error.reason() {
        SimpleReason::Custom(message) => message.clone(),
        _ => match error.found() {
            Some(c) => format!("Unexpected token `{c}`"),
            None => "Unexpected end of input".to_string(),
        },
    }
}

/// Formats the first `chumsky` error into a user-visible (optionally colored) string.
/// The input is echoed with the failing span highlighted and a short note below it.
pub fn format_errors_cli(input: &str, errors: Vec<ParseError>) -> String {
    const ERROR_COLOR: Color = Color::Red;

    let Some(error) = errors.into_iter().next() else {
        return format!("Cannot parse `{input}`");
    };

    let mut output = String::new();
    let headline = if error.found().is_some() {
        "Unexpected token"
    } else {
        "Unexpected end of input"
    };
    let context = error
        .label()
        .map(|label| {
            format!(
                " while attempting to parse {}",
                color_string(label, Color::Yellow)
            )
        })
        .unwrap_or_default();
    let _ = writeln!(
        output,
        "{headline} found{context}, expected {}:",
        describe_expected(&error)
    );

    if input.is_empty() {
        output.push_str("(the input was empty)");
        return output;
    }

    let span = error.span();
    let before: String = input.chars().take(span.start).collect();
    let inside: String = input
        .chars()
        .skip(span.start)
        .take(span.end.saturating_sub(span.start))
        .collect();
    let after: String = input.chars().skip(span.end).collect();
    let _ = writeln!(
        output,
        "  {before}{}{after}",
        color_string(inside, ERROR_COLOR)
    );

    let padding = " ".repeat(2 + span.start);
    let _ = writeln!(output, "{padding}{}", color_string("|", ERROR_COLOR));
    let _ = writeln!(
        output,
        "{padding}{}{}",
        color_string("--- ", ERROR_COLOR),
        color_string(describe_note(&error), ERROR_COLOR)
    );
    output
}

/// Parses a non-empty run of decimal digits as a 4-byte unsigned integer.
pub fn parse_u32() -> impl CharParser<u32> {
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|digits, span| {
            digits
                .parse::<u32>()
                .map_err(|_| ParseError::custom(span, "Cannot parse as 4-byte unsigned integer"))
        })
        .labelled("number")
}

/// Return a parser that will fail if there is any input following the text parsed by the
/// provided parser.
pub fn all_consuming<T>(parser: impl CharParser<T>) -> impl CharParser<T> {
    parser.then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::primitive::just;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32().parse_text("0").unwrap(), 0);
        assert_eq!(parse_u32().parse_text("1019").unwrap(), 1019);
    }

    #[test]
    fn test_parse_u32_overflow() {
        let error = all_consuming(parse_u32())
            .parse_text("99999999999")
            .unwrap_err();
        assert!(error.contains("Cannot parse as 4-byte unsigned integer"));
    }

    #[test]
    fn test_empty_input_is_reported() {
        let error = all_consuming(parse_u32()).parse_text("").unwrap_err();
        assert!(error.starts_with("Unexpected end of input found"));
        assert!(error.ends_with("(the input was empty)"));
    }

    #[test]
    fn test_error_points_at_token() {
        let error = all_consuming(just('x')).parse_text("y").unwrap_err();
        let lines: Vec<&str> = error.lines().collect();
        assert_eq!(lines[1], "  y");
        assert_eq!(lines[2], "  |");
        assert_eq!(lines[3], "  --- Unexpected token `y`");
    }
}
