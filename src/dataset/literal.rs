//! Reader for the Python literals embedded in dataset columns:
//! `['rock', 'pop']` for genres and `{0: 'Am C', 3: 'G'}` for chord lines.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

type Result<T> = std::result::Result<T, LiteralError>;

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(LiteralError {
            offset: self.pos,
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => self.error(format!("expected {want:?}, found {c:?}")),
            None => self.error(format!("expected {want:?}, found end of input")),
        }
    }

    /// Consume `close` if it's next. Used after an element to allow
    /// trailing commas.
    fn eat_close(&mut self, close: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(close) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos < self.src.len() {
            return self.error("trailing characters");
        }
        Ok(())
    }

    fn int(&mut self) -> Result<u32> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if start == self.pos {
            return self.error("expected integer key");
        }
        self.src[start..self.pos]
            .parse()
            .or_else(|_| self.error("integer key out of range"))
    }

    fn string(&mut self) -> Result<String> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return self.error("expected string"),
        };
        self.bump();

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return self.error("unterminated string"),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some(c @ '0'..='7') => out.push(self.octal_char(c)?),
            Some('x') => out.push(self.hex_char(2)?),
            Some('u') => out.push(self.hex_char(4)?),
            Some('U') => out.push(self.hex_char(8)?),
            Some('\n') => {}
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            // Python keeps unknown escapes verbatim
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => return self.error("unterminated escape"),
        }
        Ok(())
    }

    /// Up to three octal digits, `first` already consumed.
    fn octal_char(&mut self, first: char) -> Result<char> {
        let mut value = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    value = value * 8 + d;
                    self.bump();
                }
                None => break,
            }
        }
        char::from_u32(value).map_or_else(|| self.error("bad code point"), Ok)
    }

    fn hex_char(&mut self, digits: usize) -> Result<char> {
        let start = self.pos;
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return self.error("bad hex escape"),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| self.error("bad code point"), Ok)
    }
}

/// Parse a list of strings: `['a', "b"]`.
pub fn parse_str_list(src: &str) -> Result<Vec<String>> {
    let mut cur = Cursor::new(src);
    cur.expect('[')?;
    let mut items = Vec::new();
    if !cur.eat_close(']') {
        loop {
            items.push(cur.string()?);
            if cur.eat_close(']') {
                break;
            }
            cur.expect(',')?;
            if cur.eat_close(']') {
                break;
            }
        }
    }
    cur.finish()?;
    Ok(items)
}

/// Parse an int-keyed dict of strings: `{0: 'Am', 2: 'G'}`.
pub fn parse_line_map(src: &str) -> Result<BTreeMap<u32, String>> {
    let mut cur = Cursor::new(src);
    cur.expect('{')?;
    let mut map = BTreeMap::new();
    if !cur.eat_close('}') {
        loop {
            let key = cur.int()?;
            cur.expect(':')?;
            let value = cur.string()?;
            map.insert(key, value);
            if cur.eat_close('}') {
                break;
            }
            cur.expect(',')?;
            if cur.eat_close('}') {
                break;
            }
        }
    }
    cur.finish()?;
    Ok(map)
}
