use std::borrow::Cow;

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------
// Token

/// The kind of the next value on a [`JsonReader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    /// A property name inside an object.
    Name,
    Str,
    Number,
    Bool,
    Null,
    /// The end of the input.
    EndDocument,
}

/// A parsed JSON number, keeping integers exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JsonNumber {
    Int(i64),
    Float(f64),
}

impl JsonNumber {
    /// The value as `f64`, widening integers.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            JsonNumber::Int(i) => i as f64,
            JsonNumber::Float(f) => f,
        }
    }
}

// -----------------------------------------------------------------------------
// Scope tracking

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonemptyDocument,
    EmptyObject,
    NonemptyObject,
    /// A name has been read; a value must follow.
    DanglingName,
    EmptyArray,
    NonemptyArray,
}

// -----------------------------------------------------------------------------
// JsonReader

/// A pull-style JSON token reader over a borrowed string.
///
/// The reader validates nesting with an internal scope stack, so a
/// mismatched `end_object`/`end_array` is a syntax error rather than
/// silent corruption.
///
/// # Lookahead
///
/// [`short_term_copy`](Self::short_term_copy) returns an independent cursor
/// over the same input. Reading from the copy never moves the original:
///
/// ```
/// use refson::json::{JsonReader, Token};
///
/// let mut reader = JsonReader::new(r#"{"a":1}"#);
/// let mut probe = reader.short_term_copy();
/// probe.begin_object().unwrap();
/// assert_eq!(probe.next_name().unwrap(), "a");
///
/// // The real stream is still at the start.
/// assert_eq!(reader.peek().unwrap(), Token::BeginObject);
/// ```
#[derive(Clone)]
pub struct JsonReader<'de> {
    src: &'de str,
    pos: usize,
    stack: Vec<Scope>,
    peeked: Option<Token>,
    lenient: bool,
}

impl<'de> JsonReader<'de> {
    /// Creates a strict reader over `src`.
    pub fn new(src: &'de str) -> Self {
        Self {
            src,
            pos: 0,
            stack: vec![Scope::EmptyDocument],
            peeked: None,
            lenient: false,
        }
    }

    /// Toggles lenient parsing: single-quoted strings, unquoted property
    /// names, and `NaN`/`Infinity` literals.
    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    /// Whether lenient parsing is enabled.
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// An independent cursor for bounded lookahead.
    ///
    /// The copy shares the input but owns its position and scope stack, so
    /// it can be read and discarded without touching `self`.
    #[inline]
    pub fn short_term_copy(&self) -> JsonReader<'de> {
        self.clone()
    }

    // -- errors ---------------------------------------------------------------

    fn position(&self) -> (usize, usize) {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        let line = consumed.bytes().filter(|b| *b == b'\n').count() + 1;
        let column = consumed
            .rfind('\n')
            .map(|i| self.pos - i)
            .unwrap_or(self.pos + 1);
        (line, column)
    }

    pub(crate) fn syntax(&self, msg: impl Into<Cow<'static, str>>) -> Error {
        let (line, column) = self.position();
        Error::Syntax {
            msg: msg.into(),
            line,
            column,
        }
    }

    fn unexpected(&self, expected: &'static str, got: Token) -> Error {
        self.syntax(format!("expected {expected}, got {got:?}"))
    }

    // -- low-level scanning ---------------------------------------------------

    #[inline]
    fn bytes(&self) -> &'de [u8] {
        self.src.as_bytes()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.bytes();
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn next_byte(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    // -- peeking --------------------------------------------------------------

    /// Returns the kind of the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token> {
        if let Some(t) = self.peeked {
            return Ok(t);
        }
        let token = self.do_peek()?;
        self.peeked = Some(token);
        Ok(token)
    }

    fn do_peek(&mut self) -> Result<Token> {
        let scope = *self.stack.last().expect("scope stack never empty");
        match scope {
            Scope::EmptyObject => {
                self.skip_whitespace();
                match self.next_byte() {
                    Some(b'}') => Ok(Token::EndObject),
                    Some(_) => self.peek_name(),
                    None => Err(self.syntax("unexpected end of input in object")),
                }
            }
            Scope::NonemptyObject => {
                self.skip_whitespace();
                match self.next_byte() {
                    Some(b'}') => Ok(Token::EndObject),
                    Some(b',') => {
                        self.pos += 1;
                        self.skip_whitespace();
                        match self.next_byte() {
                            Some(b'}') if self.lenient => Ok(Token::EndObject),
                            Some(b'}') => Err(self.syntax("trailing comma in object")),
                            Some(_) => self.peek_name(),
                            None => Err(self.syntax("unexpected end of input in object")),
                        }
                    }
                    Some(_) => Err(self.syntax("expected ',' or '}'")),
                    None => Err(self.syntax("unexpected end of input in object")),
                }
            }
            Scope::EmptyArray => {
                self.skip_whitespace();
                match self.next_byte() {
                    Some(b']') => Ok(Token::EndArray),
                    Some(_) => self.peek_value(),
                    None => Err(self.syntax("unexpected end of input in array")),
                }
            }
            Scope::NonemptyArray => {
                self.skip_whitespace();
                match self.next_byte() {
                    Some(b']') => Ok(Token::EndArray),
                    Some(b',') => {
                        self.pos += 1;
                        self.skip_whitespace();
                        match self.next_byte() {
                            Some(b']') if self.lenient => Ok(Token::EndArray),
                            Some(b']') => Err(self.syntax("trailing comma in array")),
                            Some(_) => self.peek_value(),
                            None => Err(self.syntax("unexpected end of input in array")),
                        }
                    }
                    Some(_) => Err(self.syntax("expected ',' or ']'")),
                    None => Err(self.syntax("unexpected end of input in array")),
                }
            }
            Scope::DanglingName | Scope::EmptyDocument => {
                self.skip_whitespace();
                match self.next_byte() {
                    Some(_) => self.peek_value(),
                    None if scope == Scope::EmptyDocument => Ok(Token::EndDocument),
                    None => Err(self.syntax("expected a value")),
                }
            }
            Scope::NonemptyDocument => {
                self.skip_whitespace();
                match self.next_byte() {
                    None => Ok(Token::EndDocument),
                    Some(_) => Err(self.syntax("trailing content after document")),
                }
            }
        }
    }

    fn peek_name(&self) -> Result<Token> {
        match self.next_byte() {
            Some(b'"') => Ok(Token::Name),
            Some(b'\'') if self.lenient => Ok(Token::Name),
            Some(b) if self.lenient && is_ident_byte(b) => Ok(Token::Name),
            _ => Err(self.syntax("expected a property name")),
        }
    }

    fn peek_value(&self) -> Result<Token> {
        match self.next_byte() {
            Some(b'{') => Ok(Token::BeginObject),
            Some(b'[') => Ok(Token::BeginArray),
            Some(b'"') => Ok(Token::Str),
            Some(b'\'') if self.lenient => Ok(Token::Str),
            Some(b't') | Some(b'f') => Ok(Token::Bool),
            Some(b'n') => Ok(Token::Null),
            Some(b'-') | Some(b'0'..=b'9') => Ok(Token::Number),
            Some(b'N') | Some(b'I') if self.lenient => Ok(Token::Number),
            _ => Err(self.syntax("expected a value")),
        }
    }

    // -- structural consumption ----------------------------------------------

    /// Records that a value has been fully consumed in the current scope.
    fn value_done(&mut self) {
        let top = self.stack.last_mut().expect("scope stack never empty");
        *top = match *top {
            Scope::EmptyDocument => Scope::NonemptyDocument,
            Scope::DanglingName => Scope::NonemptyObject,
            Scope::EmptyArray | Scope::NonemptyArray => Scope::NonemptyArray,
            other => other,
        };
    }

    /// Consumes the opening brace of an object.
    pub fn begin_object(&mut self) -> Result<()> {
        match self.peek()? {
            Token::BeginObject => {
                self.peeked = None;
                self.pos += 1;
                self.stack.push(Scope::EmptyObject);
                Ok(())
            }
            got => Err(self.unexpected("'{'", got)),
        }
    }

    /// Consumes the closing brace of an object.
    pub fn end_object(&mut self) -> Result<()> {
        match self.peek()? {
            Token::EndObject => {
                self.peeked = None;
                self.pos += 1;
                self.stack.pop();
                self.value_done();
                Ok(())
            }
            got => Err(self.unexpected("'}'", got)),
        }
    }

    /// Consumes the opening bracket of an array.
    pub fn begin_array(&mut self) -> Result<()> {
        match self.peek()? {
            Token::BeginArray => {
                self.peeked = None;
                self.pos += 1;
                self.stack.push(Scope::EmptyArray);
                Ok(())
            }
            got => Err(self.unexpected("'['", got)),
        }
    }

    /// Consumes the closing bracket of an array.
    pub fn end_array(&mut self) -> Result<()> {
        match self.peek()? {
            Token::EndArray => {
                self.peeked = None;
                self.pos += 1;
                self.stack.pop();
                self.value_done();
                Ok(())
            }
            got => Err(self.unexpected("']'", got)),
        }
    }

    /// Whether the current object or array has another element.
    pub fn has_next(&mut self) -> Result<bool> {
        let token = self.peek()?;
        Ok(token != Token::EndObject && token != Token::EndArray && token != Token::EndDocument)
    }

    // -- scalar consumption ---------------------------------------------------

    /// Reads a property name and its trailing `:`.
    pub fn next_name(&mut self) -> Result<Cow<'de, str>> {
        match self.peek()? {
            Token::Name => {}
            got => return Err(self.unexpected("a property name", got)),
        }
        self.peeked = None;
        let name = match self.next_byte() {
            Some(b'"') => self.parse_quoted(b'"')?,
            Some(b'\'') if self.lenient => self.parse_quoted(b'\'')?,
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        match self.next_byte() {
            Some(b':') => self.pos += 1,
            _ => return Err(self.syntax("expected ':' after property name")),
        }
        let top = self.stack.last_mut().expect("scope stack never empty");
        *top = Scope::DanglingName;
        Ok(name)
    }

    /// Reads a string value.
    pub fn next_str(&mut self) -> Result<Cow<'de, str>> {
        match self.peek()? {
            Token::Str => {}
            // JS-style tolerance: numbers and booleans read fine as strings.
            Token::Number => {
                let n = self.next_number()?;
                return Ok(Cow::Owned(match n {
                    JsonNumber::Int(i) => i.to_string(),
                    JsonNumber::Float(f) => f.to_string(),
                }));
            }
            Token::Bool => {
                let b = self.next_bool()?;
                return Ok(Cow::Owned(b.to_string()));
            }
            got => return Err(self.unexpected("a string", got)),
        }
        self.peeked = None;
        let quote = match self.next_byte() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.syntax("expected a string")),
        };
        let s = self.parse_quoted(quote)?;
        self.value_done();
        Ok(s)
    }

    /// Reads a boolean value.
    pub fn next_bool(&mut self) -> Result<bool> {
        match self.peek()? {
            Token::Bool => {}
            got => return Err(self.unexpected("a boolean", got)),
        }
        self.peeked = None;
        let value = if self.src[self.pos..].starts_with("true") {
            self.pos += 4;
            true
        } else if self.src[self.pos..].starts_with("false") {
            self.pos += 5;
            false
        } else {
            return Err(self.syntax("expected `true` or `false`"));
        };
        self.value_done();
        Ok(value)
    }

    /// Consumes a `null`.
    pub fn next_null(&mut self) -> Result<()> {
        match self.peek()? {
            Token::Null => {}
            got => return Err(self.unexpected("null", got)),
        }
        self.peeked = None;
        if self.src[self.pos..].starts_with("null") {
            self.pos += 4;
            self.value_done();
            Ok(())
        } else {
            Err(self.syntax("expected `null`"))
        }
    }

    /// Reads a number, preserving integers exactly.
    pub fn next_number(&mut self) -> Result<JsonNumber> {
        match self.peek()? {
            Token::Number => {}
            // JS-style tolerance for `"42"` in a numeric slot.
            Token::Str => {
                let s = self.next_str()?;
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(JsonNumber::Int(i));
                }
                return match s.parse::<f64>() {
                    Ok(f) => Ok(JsonNumber::Float(f)),
                    Err(_) => Err(self.syntax(format!("cannot parse `{s}` as a number"))),
                };
            }
            got => return Err(self.unexpected("a number", got)),
        }
        self.peeked = None;

        if self.lenient {
            for (literal, value) in [
                ("NaN", f64::NAN),
                ("-Infinity", f64::NEG_INFINITY),
                ("Infinity", f64::INFINITY),
            ] {
                if self.src[self.pos..].starts_with(literal) {
                    self.pos += literal.len();
                    self.value_done();
                    return Ok(JsonNumber::Float(value));
                }
            }
        }

        let start = self.pos;
        let bytes = self.bytes();
        let mut integral = true;
        if bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' | b'e' | b'E' | b'+' | b'-' => {
                    integral = false;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = &self.src[start..self.pos];
        if text.is_empty() || text == "-" {
            return Err(self.syntax("malformed number"));
        }
        self.value_done();
        if integral {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(JsonNumber::Int(i));
            }
        }
        match text.parse::<f64>() {
            Ok(f) => Ok(JsonNumber::Float(f)),
            Err(_) => Err(self.syntax(format!("malformed number `{text}`"))),
        }
    }

    /// Skips the next value (scalar, object, or array) entirely.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                Token::BeginObject => {
                    self.begin_object()?;
                    depth += 1;
                }
                Token::BeginArray => {
                    self.begin_array()?;
                    depth += 1;
                }
                Token::EndObject => {
                    self.end_object()?;
                    depth -= 1;
                }
                Token::EndArray => {
                    self.end_array()?;
                    depth -= 1;
                }
                Token::Name => {
                    self.next_name()?;
                    continue;
                }
                Token::Str => {
                    self.next_str()?;
                }
                Token::Number => {
                    self.next_number()?;
                }
                Token::Bool => {
                    self.next_bool()?;
                }
                Token::Null => {
                    self.next_null()?;
                }
                Token::EndDocument => {
                    return Err(self.syntax("unexpected end of input"));
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    // -- string parsing -------------------------------------------------------

    fn parse_quoted(&mut self, quote: u8) -> Result<Cow<'de, str>> {
        debug_assert_eq!(self.next_byte(), Some(quote));
        self.pos += 1;
        let start = self.pos;
        let bytes = self.bytes();

        // Fast path: no escapes, borrow straight from the input.
        let mut i = self.pos;
        while let Some(&b) = bytes.get(i) {
            if b == quote {
                let s = &self.src[start..i];
                self.pos = i + 1;
                return Ok(Cow::Borrowed(s));
            }
            if b == b'\\' {
                break;
            }
            i += 1;
        }
        if bytes.get(i).is_none() {
            return Err(self.syntax("unterminated string"));
        }

        // Slow path with escape decoding.
        let mut out = String::with_capacity(i - start + 16);
        out.push_str(&self.src[start..i]);
        self.pos = i;
        loop {
            match self.next_byte() {
                None => return Err(self.syntax("unterminated string")),
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(Cow::Owned(out));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let esc = self
                        .next_byte()
                        .ok_or_else(|| self.syntax("unterminated escape"))?;
                    self.pos += 1;
                    match esc {
                        b'"' => out.push('"'),
                        b'\'' => out.push('\''),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{0008}'),
                        b'f' => out.push('\u{000C}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => {
                            let c = self.parse_unicode_escape()?;
                            out.push(c);
                        }
                        other => {
                            return Err(
                                self.syntax(format!("invalid escape `\\{}`", other as char))
                            );
                        }
                    }
                }
                Some(_) => {
                    // Copy a run of plain characters in one go.
                    let run_start = self.pos;
                    let bytes = self.bytes();
                    let mut j = self.pos;
                    while let Some(&b) = bytes.get(j) {
                        if b == quote || b == b'\\' {
                            break;
                        }
                        j += 1;
                    }
                    out.push_str(&self.src[run_start..j]);
                    self.pos = j;
                }
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        let unit = self.parse_hex4()?;
        // Surrogate pair?
        if (0xD800..=0xDBFF).contains(&unit) {
            if self.src[self.pos..].starts_with("\\u") {
                self.pos += 2;
                let low = self.parse_hex4()?;
                if (0xDC00..=0xDFFF).contains(&low) {
                    let c = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(c).ok_or_else(|| self.syntax("invalid surrogate pair"));
                }
            }
            return Err(self.syntax("unpaired surrogate in \\u escape"));
        }
        char::from_u32(unit).ok_or_else(|| self.syntax("invalid \\u escape"))
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let hex = self
            .src
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.syntax("truncated \\u escape"))?;
        let unit =
            u32::from_str_radix(hex, 16).map_err(|_| self.syntax("invalid \\u escape digits"))?;
        self.pos += 4;
        Ok(unit)
    }

    fn parse_ident(&mut self) -> Result<Cow<'de, str>> {
        let start = self.pos;
        let bytes = self.bytes();
        while let Some(&b) = bytes.get(self.pos) {
            if is_ident_byte(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.syntax("expected a property name"));
        }
        Ok(Cow::Borrowed(&self.src[start..self.pos]))
    }
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round() {
        let mut r = JsonReader::new(r#"[1, -2.5, "hi", true, null]"#);
        r.begin_array().unwrap();
        assert_eq!(r.next_number().unwrap(), JsonNumber::Int(1));
        assert_eq!(r.next_number().unwrap(), JsonNumber::Float(-2.5));
        assert_eq!(r.next_str().unwrap(), "hi");
        assert!(r.next_bool().unwrap());
        r.next_null().unwrap();
        r.end_array().unwrap();
        assert_eq!(r.peek().unwrap(), Token::EndDocument);
    }

    #[test]
    fn object_names_and_values() {
        let mut r = JsonReader::new(r#"{"a": {"b": [3]}, "c": "d"}"#);
        r.begin_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "a");
        r.begin_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "b");
        r.begin_array().unwrap();
        assert_eq!(r.next_number().unwrap(), JsonNumber::Int(3));
        assert!(!r.has_next().unwrap());
        r.end_array().unwrap();
        r.end_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "c");
        assert_eq!(r.next_str().unwrap(), "d");
        r.end_object().unwrap();
    }

    #[test]
    fn skip_value_spans_composites() {
        let mut r = JsonReader::new(r#"{"junk": {"x": [1, {"y": 2}]}, "keep": 7}"#);
        r.begin_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "junk");
        r.skip_value().unwrap();
        assert_eq!(r.next_name().unwrap(), "keep");
        assert_eq!(r.next_number().unwrap(), JsonNumber::Int(7));
        r.end_object().unwrap();
    }

    #[test]
    fn escapes_decode() {
        let mut r = JsonReader::new(r#""a\nbé😀""#);
        assert_eq!(r.next_str().unwrap(), "a\nb\u{e9}\u{1F600}");
    }

    #[test]
    fn short_term_copy_does_not_advance() {
        let mut r = JsonReader::new(r#"{"k": 1}"#);
        let mut probe = r.short_term_copy();
        probe.begin_object().unwrap();
        assert_eq!(probe.next_name().unwrap(), "k");
        r.begin_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "k");
        assert_eq!(r.next_number().unwrap(), JsonNumber::Int(1));
        r.end_object().unwrap();
    }

    #[test]
    fn lenient_literals() {
        let mut r = JsonReader::new("{key: NaN}");
        r.set_lenient(true);
        r.begin_object().unwrap();
        assert_eq!(r.next_name().unwrap(), "key");
        match r.next_number().unwrap() {
            JsonNumber::Float(f) => assert!(f.is_nan()),
            other => panic!("expected NaN, got {other:?}"),
        }
        r.end_object().unwrap();
    }

    #[test]
    fn trailing_content_is_an_error() {
        let mut r = JsonReader::new("1 2");
        r.next_number().unwrap();
        assert!(r.peek().is_err());
    }

    #[test]
    fn string_in_number_slot_coerces() {
        let mut r = JsonReader::new(r#""42""#);
        assert_eq!(r.next_number().unwrap(), JsonNumber::Int(42));
    }
}
