//! Lexer for the template mini-language
//!
//! Plain text passes through untouched, `{{ name }}` references a variable
//! and `{% cmd %}` runs a shell command. There is no escaping and no
//! nesting: the first matching closer ends an expression.

use std::fmt;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Identifier,
    Command,
    End,
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Text => "text",
            TokenKind::Identifier => "identifier",
            TokenKind::Command => "command",
            TokenKind::End => "end",
            TokenKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single token; `value` carries the error message for `Error` tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn end() -> Self {
        Self::new(TokenKind::End, "")
    }

    /// Whether no token can follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, TokenKind::End | TokenKind::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Identifier,
    Command,
}

impl Delimiter {
    fn opener(self) -> &'static str {
        match self {
            Delimiter::Identifier => "{{",
            Delimiter::Command => "{%",
        }
    }

    fn closer(self) -> &'static str {
        match self {
            Delimiter::Identifier => "}}",
            Delimiter::Command => "%}",
        }
    }

    fn kind(self) -> TokenKind {
        match self {
            Delimiter::Identifier => TokenKind::Identifier,
            Delimiter::Command => TokenKind::Command,
        }
    }
}

/// Single-pass, non-backtracking template lexer
///
/// Yields tokens one at a time and stops after the first `End` or `Error`.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            finished: false,
        }
    }

    /// Locate the next `{{` or `{%` at or after the cursor
    fn next_opener(&self) -> Option<(usize, Delimiter)> {
        let bytes = self.input.as_bytes();
        let mut at = self.pos;

        while let Some(offset) = self.input[at..].find('{') {
            let brace = at + offset;
            match bytes.get(brace + 1) {
                Some(b'{') => return Some((brace, Delimiter::Identifier)),
                Some(b'%') => return Some((brace, Delimiter::Command)),
                _ => at = brace + 1,
            }
        }

        None
    }

    fn lex_expression(&mut self, start: usize, delimiter: Delimiter) -> Token {
        let body_start = start + delimiter.opener().len();

        match self.input[body_start..].find(delimiter.closer()) {
            Some(offset) => {
                let body_end = body_start + offset;
                self.pos = body_end + delimiter.closer().len();
                Token::new(delimiter.kind(), self.input[body_start..body_end].trim())
            }
            None => Token::new(
                TokenKind::Error,
                format!(
                    "unterminated {} starting at byte {}: expected '{}'",
                    delimiter.kind(),
                    start,
                    delimiter.closer()
                ),
            ),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        let token = match self.next_opener() {
            Some((start, _)) if start > self.pos => {
                let text = &self.input[self.pos..start];
                self.pos = start;
                Token::new(TokenKind::Text, text)
            }
            Some((start, delimiter)) => self.lex_expression(start, delimiter),
            None if self.pos < self.input.len() => {
                let text = &self.input[self.pos..];
                self.pos = self.input.len();
                Token::new(TokenKind::Text, text)
            }
            None => Token::end(),
        };

        self.finished = token.is_terminal();
        Some(token)
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Lex a whole template into a token vector
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Token {
        Token::new(TokenKind::Text, value)
    }

    fn ident(value: &str) -> Token {
        Token::new(TokenKind::Identifier, value)
    }

    fn command(value: &str) -> Token {
        Token::new(TokenKind::Command, value)
    }

    #[test]
    fn test_tokenize_table() {
        let cases: Vec<(&str, Vec<Token>)> = vec![
            ("", vec![Token::end()]),
            ("some text", vec![text("some text"), Token::end()]),
            ("{{ key }}", vec![ident("key"), Token::end()]),
            ("{% command %}", vec![command("command"), Token::end()]),
            ("pre {{ key }}", vec![text("pre "), ident("key"), Token::end()]),
            (
                "pre {% command %} post",
                vec![text("pre "), command("command"), text(" post"), Token::end()],
            ),
            (
                "pre {{ key }} between {% command %} post",
                vec![
                    text("pre "),
                    ident("key"),
                    text(" between "),
                    command("command"),
                    text(" post"),
                    Token::end(),
                ],
            ),
            ("{{ key }} post", vec![ident("key"), text(" post"), Token::end()]),
            (
                "some {{ key }} text {{ other_key }}",
                vec![
                    text("some "),
                    ident("key"),
                    text(" text "),
                    ident("other_key"),
                    Token::end(),
                ],
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(tokenize(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_adjacent_expressions_have_no_empty_text() {
        assert_eq!(
            tokenize("{{a}}{%b%}{{c}}"),
            vec![ident("a"), command("b"), ident("c"), Token::end()]
        );
    }

    #[test]
    fn test_whitespace_only_interior_is_empty_value() {
        assert_eq!(tokenize("{{   }}"), vec![ident(""), Token::end()]);
        assert_eq!(tokenize("{%\t%}"), vec![command(""), Token::end()]);
    }

    #[test]
    fn test_unterminated_expression_ends_with_single_error() {
        let tokens = tokenize("pre {{ key");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], text("pre "));
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert!(tokens[1].value.contains("'}}'"));

        let tokens = tokenize("{% run }}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert!(tokens[0].value.contains("'%}'"));
    }

    #[test]
    fn test_first_closer_wins_and_lone_braces_are_text() {
        assert_eq!(
            tokenize("{ a } {{ b %} }} c"),
            vec![text("{ a } "), ident("b %}"), text(" c"), Token::end()]
        );
        assert_eq!(tokenize("}} %}"), vec![text("}} %}"), Token::end()]);
    }

    #[test]
    fn test_lexer_is_fused_after_terminal_token() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next(), Some(text("x")));
        assert_eq!(lexer.next(), Some(Token::end()));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        assert_eq!(
            tokenize("héllo {{ naïve }} ✓"),
            vec![text("héllo "), ident("naïve"), text(" ✓"), Token::end()]
        );
    }
}
