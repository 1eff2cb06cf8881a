use super::Error;

/// A token on a line, with its byte span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Token<'src> {
    pub(super) text: &'src str,
    pub(super) span: (usize, usize),
}

/// Splits a single line into whitespace separated tokens.
///
/// A backslash starts a comment which runs until the end of the line.
pub(super) struct LineParser<'src> {
    source: &'src str,
    position: usize,
    line_nr: usize,
}

impl<'src> LineParser<'src> {
    pub(super) fn new(line: &'src str, line_nr: usize) -> Self {
        let without_comment = match line.find('\\') {
            Some(index) => &line[..index],
            None => line,
        };

        LineParser {
            source: without_comment.trim_end_matches(['\n', '\r']),
            position: 0,
            line_nr,
        }
    }

    pub(super) fn line_nr(&self) -> usize {
        self.line_nr
    }

    /// The next token, or [`None`] when the rest of the line is blank.
    pub(super) fn next_token(&mut self) -> Option<Token<'src>> {
        let rest = &self.source[self.position..];
        let start = self.position + (rest.len() - rest.trim_start().len());
        if start >= self.source.len() {
            self.position = self.source.len();
            return None;
        }

        let length = self.source[start..]
            .find(char::is_whitespace)
            .unwrap_or(self.source.len() - start);
        self.position = start + length;

        Some(Token {
            text: &self.source[start..start + length],
            span: (start, start + length),
        })
    }

    /// Whether the rest of the line is blank.
    pub(super) fn is_at_end(&self) -> bool {
        self.source[self.position..].trim_start().is_empty()
    }

    /// Parse `token` as an unsigned integer.
    pub(super) fn unsigned(&self, token: Token<'src>, what: &str) -> Result<usize, Error> {
        token
            .text
            .parse::<usize>()
            .map_err(|_| self.error(token, format!("expected {what}")))
    }

    /// Parse `token` as `0` or `1`.
    pub(super) fn flag(&self, token: Token<'src>) -> Result<bool, Error> {
        match token.text {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(self.error(token, "expected 0 or 1".to_owned())),
        }
    }

    /// Error unless the rest of the line is blank.
    pub(super) fn expect_end(&mut self) -> Result<(), Error> {
        match self.next_token() {
            Some(token) => Err(self.error(token, "unexpected input: expected end of line".to_owned())),
            None => Ok(()),
        }
    }

    pub(super) fn error(&self, token: Token<'src>, reason: String) -> Error {
        Error::ParseError {
            line_nr: self.line_nr,
            token: token.text.to_owned(),
            reason,
            span: token.span,
        }
    }
}
