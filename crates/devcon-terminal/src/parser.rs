//! Line parser: raw text to command name plus argument tokens.
//!
//! Arguments are separated by whitespace. A double-quoted span is one token
//! and keeps its inner whitespace; `\"` is a literal quote anywhere.

use devcon_types::error::{ConsoleError, Result};

/// Stand-in for `\"` while the line is split on real quotes.
const ESCAPED_QUOTE: char = '\u{E000}';

/// Tokenize a command line.
///
/// The first token is the command name. Fails with
/// [`ConsoleError::EmptyInput`] on blank input and
/// [`ConsoleError::MalformedQuoting`] on an unbalanced quote.
pub fn parse(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::EmptyInput);
    }

    let masked = trimmed.replace("\\\"", &ESCAPED_QUOTE.to_string());
    let segments: Vec<&str> = masked.split('"').collect();
    // Balanced quotes always leave an odd number of segments.
    if segments.len() % 2 == 0 {
        return Err(ConsoleError::MalformedQuoting);
    }

    let mut tokens = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i % 2 == 1 {
            tokens.push(unmask(segment));
        } else {
            tokens.extend(segment.split_whitespace().map(unmask));
        }
    }

    if tokens.is_empty() {
        return Err(ConsoleError::EmptyInput);
    }
    Ok(tokens)
}

fn unmask(s: &str) -> String {
    s.replace(ESCAPED_QUOTE, "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_words() {
        assert_eq!(parse("cube_scale 2").unwrap(), vec!["cube_scale", "2"]);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            parse("  move\t1   2 \n").unwrap(),
            vec!["move", "1", "2"]
        );
    }

    #[test]
    fn quoted_token_keeps_spaces() {
        assert_eq!(
            parse(r#"set "a b" 3"#).unwrap(),
            vec!["set", "a b", "3"]
        );
    }

    #[test]
    fn escaped_quotes_are_literal() {
        assert_eq!(
            parse(r#"x \"y\" z"#).unwrap(),
            vec!["x", "\"y\"", "z"]
        );
    }

    #[test]
    fn escaped_quote_inside_quoted_span() {
        assert_eq!(
            parse(r#"say "he said \"hi\"""#).unwrap(),
            vec!["say", "he said \"hi\""]
        );
    }

    #[test]
    fn empty_quoted_token_is_kept() {
        assert_eq!(parse(r#"name """#).unwrap(), vec!["name", ""]);
    }

    #[test]
    fn quote_adjacent_to_word_splits() {
        assert_eq!(parse(r#"a"b c"d"#).unwrap(), vec!["a", "b c", "d"]);
    }

    #[test]
    fn unbalanced_quote_fails() {
        assert!(matches!(
            parse(r#"a "b"#),
            Err(ConsoleError::MalformedQuoting)
        ));
    }

    #[test]
    fn blank_input_fails() {
        assert!(matches!(parse(""), Err(ConsoleError::EmptyInput)));
        assert!(matches!(parse("   \t "), Err(ConsoleError::EmptyInput)));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn rejoin_and_reparse_is_stable(
                words in proptest::collection::vec("[a-zA-Z0-9_.#,-]{1,8}", 1..6),
                gaps in proptest::collection::vec("[ \t]{1,3}", 6),
            ) {
                let mut line = String::new();
                for (word, gap) in words.iter().zip(gaps.iter()) {
                    line.push_str(gap);
                    line.push_str(word);
                }
                let first = parse(&line).unwrap();
                prop_assert_eq!(&first, &words);
                let second = parse(&first.join(" ")).unwrap();
                prop_assert_eq!(first, second);
            }

            #[test]
            fn quoted_span_is_one_token(inner in "[a-z ]{0,12}") {
                let tokens = parse(&format!("cmd \"{inner}\"")).unwrap();
                prop_assert_eq!(tokens.len(), 2);
                prop_assert_eq!(&tokens[1], &inner);
            }
        }
    }
}
