//! Lexical helpers for the MySQL-style DDL subset.
//!
//! [`Cursor`] walks a single column or index fragment left to right, consuming
//! keywords, backtick identifiers, quoted literals and parenthesised argument
//! lists. Every consuming method either advances past what it matched (plus
//! trailing whitespace) or leaves the cursor untouched.

use crate::error::SchemaError;

/// Wraps a name in backticks, doubling embedded backticks.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Renders a single-quoted string literal with backslash escaping.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Renders a parenthesised list of backtick identifiers: `` (`a`,`b`) ``.
#[must_use]
pub fn identifier_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| quote_identifier(n)).collect();
    format!("({})", quoted.join(","))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Forward-only reader over one DDL fragment.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(fragment: &'a str) -> Self {
        Self {
            rest: fragment.trim_start(),
        }
    }

    /// Unconsumed input.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    fn advance(&mut self, bytes: usize) {
        self.rest = self.rest[bytes..].trim_start();
    }

    /// Returns `true` if the input starts with `keyword` as a whole word,
    /// compared case-insensitively, without consuming it.
    #[must_use]
    pub fn peek_keyword(&self, keyword: &str) -> bool {
        let len = keyword.len();
        if self.rest.len() < len || !self.rest.is_char_boundary(len) {
            return false;
        }
        if !self.rest[..len].eq_ignore_ascii_case(keyword) {
            return false;
        }
        !self.rest[len..].starts_with(is_word_char)
    }

    /// Consumes `keyword` if present.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.advance(keyword.len());
            true
        } else {
            false
        }
    }

    /// Consumes a whole keyword sequence, or nothing.
    pub fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let mut probe = *self;
        for keyword in keywords {
            if !probe.eat_keyword(keyword) {
                return false;
            }
        }
        *self = probe;
        true
    }

    /// Consumes a keyword sequence or fails naming it.
    pub fn expect_keywords(&mut self, keywords: &[&str]) -> Result<(), SchemaError> {
        if self.eat_keywords(keywords) {
            Ok(())
        } else {
            Err(SchemaError::parse(self.rest, keywords.join(" ")))
        }
    }

    /// Consumes a bare word (`[A-Za-z0-9_]+`).
    pub fn eat_word(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !is_word_char(c))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let word = &self.rest[..end];
        self.advance(end);
        Some(word)
    }

    pub fn eat_char(&mut self, ch: char) -> bool {
        if self.rest.starts_with(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    pub fn expect_char(&mut self, ch: char, expected: &str) -> Result<(), SchemaError> {
        if self.eat_char(ch) {
            Ok(())
        } else {
            Err(SchemaError::parse(self.rest, expected))
        }
    }

    /// Consumes an unsigned decimal integer.
    pub fn eat_number(&mut self) -> Option<u32> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let value = self.rest[..end].parse().ok()?;
        self.advance(end);
        Some(value)
    }

    /// Consumes a backtick identifier if one starts here.
    ///
    /// Fails when the opening backtick has no matching close.
    pub fn eat_identifier(&mut self) -> Result<Option<String>, SchemaError> {
        if !self.rest.starts_with('`') {
            return Ok(None);
        }
        let mut name = String::new();
        let mut chars = self.rest.char_indices().skip(1).peekable();
        while let Some((i, ch)) = chars.next() {
            if ch == '`' {
                if let Some((_, '`')) = chars.peek() {
                    chars.next();
                    name.push('`');
                    continue;
                }
                self.advance(i + 1);
                return Ok(Some(name));
            }
            name.push(ch);
        }
        Err(SchemaError::parse(self.rest, "closing backtick"))
    }

    pub fn expect_identifier(&mut self, expected: &str) -> Result<String, SchemaError> {
        self.eat_identifier()?
            .ok_or_else(|| SchemaError::parse(self.rest, expected))
    }

    /// Consumes a single-quoted literal if one starts here, resolving
    /// backslash escapes and doubled quotes.
    pub fn eat_literal(&mut self) -> Result<Option<String>, SchemaError> {
        if !self.rest.starts_with('\'') {
            return Ok(None);
        }
        let mut text = String::new();
        let mut chars = self.rest.char_indices().skip(1).peekable();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some((_, esc)) => text.push(match esc {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '0' => '\0',
                        other => other,
                    }),
                    None => break,
                },
                '\'' => {
                    if let Some((_, '\'')) = chars.peek() {
                        chars.next();
                        text.push('\'');
                        continue;
                    }
                    self.advance(i + 1);
                    return Ok(Some(text));
                }
                c => text.push(c),
            }
        }
        Err(SchemaError::parse(self.rest, "closing quote"))
    }

    pub fn expect_literal(&mut self, expected: &str) -> Result<String, SchemaError> {
        self.eat_literal()?
            .ok_or_else(|| SchemaError::parse(self.rest, expected))
    }

    /// Consumes `(length[,precision])` if present.
    pub fn eat_type_args(&mut self) -> Result<Option<(u32, Option<u32>)>, SchemaError> {
        if !self.eat_char('(') {
            return Ok(None);
        }
        let length = self
            .eat_number()
            .ok_or_else(|| SchemaError::parse(self.rest, "type length"))?;
        let precision = if self.eat_char(',') {
            Some(
                self.eat_number()
                    .ok_or_else(|| SchemaError::parse(self.rest, "type precision"))?,
            )
        } else {
            None
        };
        self.expect_char(')', "closing parenthesis")?;
        Ok(Some((length, precision)))
    }

    /// Consumes `` (`a`, `b`) `` and returns the names in order.
    pub fn expect_identifier_list(&mut self, expected: &str) -> Result<Vec<String>, SchemaError> {
        self.expect_char('(', expected)?;
        let mut names = vec![self.expect_identifier("field name")?];
        while self.eat_char(',') {
            names.push(self.expect_identifier("field name")?);
        }
        self.expect_char(')', "closing parenthesis")?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_requires_word_boundary() {
        let mut c = Cursor::new("unsigned_thing");
        assert!(!c.eat_keyword("UNSIGNED"));
        let mut c = Cursor::new("Unsigned NOT NULL");
        assert!(c.eat_keyword("UNSIGNED"));
        assert!(c.eat_keywords(&["NOT", "NULL"]));
        assert!(c.is_empty());
    }

    #[test]
    fn keyword_sequence_is_all_or_nothing() {
        let mut c = Cursor::new("NOT DEFAULT");
        assert!(!c.eat_keywords(&["NOT", "NULL"]));
        assert_eq!(c.rest(), "NOT DEFAULT");
    }

    #[test]
    fn literal_resolves_escapes() {
        let mut c = Cursor::new(r"'it\'s a \\ ''test''' tail");
        assert_eq!(c.eat_literal().unwrap().as_deref(), Some(r"it's a \ 'test'"));
        assert_eq!(c.rest(), "tail");
    }

    #[test]
    fn literal_without_close_fails() {
        let mut c = Cursor::new("'abc");
        let err = c.eat_literal().unwrap_err();
        assert!(matches!(err, SchemaError::Parse { ref expected, .. } if expected == "closing quote"));
    }

    #[test]
    fn literal_round_trips_through_quote() {
        let original = "a'b\\c\nd";
        let quoted = quote_literal(original);
        let mut c = Cursor::new(&quoted);
        assert_eq!(c.eat_literal().unwrap().as_deref(), Some(original));
    }

    #[test]
    fn identifier_and_list() {
        let mut c = Cursor::new("`weird``name` (`a`, `b`,`c`) rest");
        assert_eq!(c.eat_identifier().unwrap().as_deref(), Some("weird`name"));
        assert_eq!(
            c.expect_identifier_list("field list").unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(c.rest(), "rest");
        assert_eq!(quote_identifier("weird`name"), "`weird``name`");
    }

    #[test]
    fn type_args() {
        let mut c = Cursor::new("(10,2) UNSIGNED");
        assert_eq!(c.eat_type_args().unwrap(), Some((10, Some(2))));
        let mut c = Cursor::new("(10");
        assert!(c.eat_type_args().is_err());
        let mut c = Cursor::new("UNSIGNED");
        assert_eq!(c.eat_type_args().unwrap(), None);
    }
}
