//! Input line tokenizer and invocation parser.

use packshell_types::error::{Result, ShellError};

/// One input line split into a command name and its raw argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedInvocation {
    /// Arguments as borrowed slices, the form handlers take.
    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Result of parsing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Nothing but whitespace. Not an error.
    Empty,
    Invocation(ParsedInvocation),
}

/// Parse a raw line into an invocation.
pub fn parse(line: &str) -> Result<Parsed> {
    let mut tokens = tokenize(line)?.into_iter();
    match tokens.next() {
        None => Ok(Parsed::Empty),
        Some(name) => Ok(Parsed::Invocation(ParsedInvocation {
            name,
            args: tokens.collect(),
        })),
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: handles single quotes, double quotes, and backslash escapes.
// ---------------------------------------------------------------------------

/// Tokenize a command line respecting quotes and backslash escapes.
///
/// - Single-quoted strings preserve all characters literally.
/// - Double-quoted strings honour `\"` and `\\`.
/// - Backslash escapes the next character outside of quotes.
/// - `""` produces an empty token.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(&next) = chars.peek()
                && matches!(next, '"' | '\\')
            {
                current.push(next);
                chars.next();
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    has_token = true;
                },
                '"' => {
                    in_double = true;
                    has_token = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        has_token = true;
                    }
                },
                c if c.is_whitespace() => {
                    if has_token {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                },
                _ => {
                    current.push(ch);
                    has_token = true;
                },
            }
        }
    }

    if in_single {
        return Err(ShellError::Parse("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(ShellError::Parse("unterminated double quote".to_string()));
    }

    if has_token {
        tokens.push(current);
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Completion context
// ---------------------------------------------------------------------------

/// The word under the cursor and the tokens before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// Byte offset where the word under the cursor starts.
    pub start: usize,
    /// The partial word, unquoted.
    pub word: String,
    /// Complete tokens before the word. Empty while typing the command name.
    pub preceding: Vec<String>,
}

/// Split `line[..pos]` for completion. Never fails: an open quote simply
/// becomes part of the word being typed.
pub fn completion_context(line: &str, pos: usize) -> CompletionContext {
    let before = &line[..pos.min(line.len())];
    let mut preceding = Vec::new();
    let mut word = String::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in before.char_indices() {
        if escaped {
            word.push(ch);
            escaped = false;
            continue;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => word.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    start.get_or_insert(i);
                },
                '\\' => {
                    escaped = true;
                    start.get_or_insert(i);
                },
                c if c.is_whitespace() => {
                    if start.take().is_some() {
                        preceding.push(std::mem::take(&mut word));
                    }
                },
                _ => {
                    word.push(ch);
                    start.get_or_insert(i);
                },
            },
        }
    }

    CompletionContext {
        start: start.unwrap_or(before.len()),
        word,
        preceding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(line: &str) -> ParsedInvocation {
        match parse(line).unwrap() {
            Parsed::Invocation(inv) => inv,
            Parsed::Empty => panic!("expected invocation for {line:?}"),
        }
    }

    #[test]
    fn empty_and_whitespace_lines() {
        assert_eq!(parse("").unwrap(), Parsed::Empty);
        assert_eq!(parse("   ").unwrap(), Parsed::Empty);
        assert_eq!(parse(" \t  ").unwrap(), Parsed::Empty);
    }

    #[test]
    fn name_and_args() {
        let inv = invocation("  bogus-cmd arg1   arg2 ");
        assert_eq!(inv.name, "bogus-cmd");
        assert_eq!(inv.args, vec!["arg1", "arg2"]);
        assert_eq!(inv.arg_refs(), vec!["arg1", "arg2"]);
    }

    #[test]
    fn double_quotes_group_words() {
        let inv = invocation(r#"home-dir "/srv/my packs""#);
        assert_eq!(inv.args, vec!["/srv/my packs"]);
    }

    #[test]
    fn single_quotes_are_literal() {
        let tokens = tokenize(r#"echo 'a \"b\" c'"#).unwrap();
        assert_eq!(tokens, vec!["echo", r#"a \"b\" c"#]);
    }

    #[test]
    fn escapes_inside_double_quotes() {
        let tokens = tokenize(r#""say \"hi\" \\ \n""#).unwrap();
        assert_eq!(tokens, vec![r#"say "hi" \ \n"#]);
    }

    #[test]
    fn backslash_escapes_space() {
        let tokens = tokenize(r"run-headless my\ pack.conf").unwrap();
        assert_eq!(tokens, vec!["run-headless", "my pack.conf"]);
    }

    #[test]
    fn empty_quoted_token_kept() {
        let tokens = tokenize(r#"language """#).unwrap();
        assert_eq!(tokens, vec!["language", ""]);
    }

    #[test]
    fn adjacent_quotes_join() {
        let tokens = tokenize(r#"a"b c"'d'"#).unwrap();
        assert_eq!(tokens, vec!["ab cd"]);
    }

    #[test]
    fn unbalanced_quotes_are_parse_errors() {
        assert!(matches!(parse("setup \"oops"), Err(ShellError::Parse(_))));
        assert!(matches!(parse("setup 'oops"), Err(ShellError::Parse(_))));
    }

    #[test]
    fn completion_context_command_word() {
        let ctx = completion_context("hom", 3);
        assert_eq!(ctx.start, 0);
        assert_eq!(ctx.word, "hom");
        assert!(ctx.preceding.is_empty());
    }

    #[test]
    fn completion_context_after_space() {
        let ctx = completion_context("setup ", 6);
        assert_eq!(ctx.start, 6);
        assert_eq!(ctx.word, "");
        assert_eq!(ctx.preceding, vec!["setup"]);
    }

    #[test]
    fn completion_context_partial_flag() {
        let line = "config-gen --r";
        let ctx = completion_context(line, line.len());
        assert_eq!(ctx.start, 11);
        assert_eq!(ctx.word, "--r");
        assert_eq!(ctx.preceding, vec!["config-gen"]);
    }

    #[test]
    fn completion_context_respects_cursor() {
        let ctx = completion_context("language de_DE", 4);
        assert_eq!(ctx.word, "lang");
        assert!(ctx.preceding.is_empty());
    }

    #[test]
    fn completion_context_open_quote() {
        let line = r#"home-dir "/srv/my pa"#;
        let ctx = completion_context(line, line.len());
        assert_eq!(ctx.start, 9);
        assert_eq!(ctx.word, "/srv/my pa");
        assert_eq!(ctx.preceding, vec!["home-dir"]);
    }
}
