use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WScope {
    EmptyDocument,
    NonemptyDocument,
    EmptyObject,
    NonemptyObject,
    DanglingName,
    EmptyArray,
    NonemptyArray,
}

/// A push-style JSON writer building a `String`.
///
/// Property names are *deferred*: [`name`](Self::name) records the pending
/// name but emits nothing until a value follows. When `serialize_nulls` is
/// off and the value turns out to be null, the whole pair is dropped, so
/// callers never have to pre-check for absence.
pub struct JsonWriter {
    out: String,
    stack: Vec<WScope>,
    pending_name: Option<String>,
    serialize_nulls: bool,
    html_safe: bool,
    lenient: bool,
    indent: Option<String>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            stack: vec![WScope::EmptyDocument],
            pending_name: None,
            serialize_nulls: false,
            html_safe: false,
            lenient: false,
            indent: None,
        }
    }

    /// Whether `null` field values are written or their pairs dropped.
    pub fn set_serialize_nulls(&mut self, on: bool) {
        self.serialize_nulls = on;
    }

    pub fn serialize_nulls(&self) -> bool {
        self.serialize_nulls
    }

    /// Escape `<`, `>`, `&`, `=` and `'` so output can be embedded in HTML.
    pub fn set_html_safe(&mut self, on: bool) {
        self.html_safe = on;
    }

    /// Permit non-finite floats, written as `NaN`/`Infinity` literals.
    pub fn set_lenient(&mut self, on: bool) {
        self.lenient = on;
    }

    /// Pretty-print with the given indent unit; empty string means compact.
    pub fn set_indent(&mut self, unit: &str) {
        self.indent = if unit.is_empty() {
            None
        } else {
            Some(unit.to_owned())
        };
    }

    /// Consumes the writer, returning the document built so far.
    pub fn into_string(self) -> String {
        self.out
    }

    // -- structure ------------------------------------------------------------

    pub fn begin_object(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.push('{');
        self.stack.push(WScope::EmptyObject);
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(WScope::EmptyObject) => {
                self.stack.pop();
                self.out.push('}');
            }
            Some(WScope::NonemptyObject) => {
                self.stack.pop();
                self.newline_indent();
                self.out.push('}');
            }
            _ => return Err(structural("end_object outside an object")),
        }
        self.value_done();
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.push('[');
        self.stack.push(WScope::EmptyArray);
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(WScope::EmptyArray) => {
                self.stack.pop();
                self.out.push(']');
            }
            Some(WScope::NonemptyArray) => {
                self.stack.pop();
                self.newline_indent();
                self.out.push(']');
            }
            _ => return Err(structural("end_array outside an array")),
        }
        self.value_done();
        Ok(())
    }

    /// Records a property name. Nothing is emitted until the value arrives.
    pub fn name(&mut self, name: &str) -> Result<()> {
        match self.stack.last() {
            Some(WScope::EmptyObject | WScope::NonemptyObject) => {}
            _ => return Err(structural("name outside an object")),
        }
        if self.pending_name.is_some() {
            return Err(structural("two names in a row"));
        }
        self.pending_name = Some(name.to_owned());
        Ok(())
    }

    // -- values ---------------------------------------------------------------

    /// Writes `null`, or drops the pending pair when nulls are suppressed.
    pub fn null_value(&mut self) -> Result<()> {
        if self.pending_name.is_some() && !self.serialize_nulls {
            self.pending_name = None;
            return Ok(());
        }
        self.before_value()?;
        self.out.push_str("null");
        self.value_done();
        Ok(())
    }

    pub fn bool_value(&mut self, v: bool) -> Result<()> {
        self.before_value()?;
        self.out.push_str(if v { "true" } else { "false" });
        self.value_done();
        Ok(())
    }

    pub fn int_value(&mut self, v: i64) -> Result<()> {
        self.before_value()?;
        self.out.push_str(&v.to_string());
        self.value_done();
        Ok(())
    }

    pub fn uint_value(&mut self, v: u64) -> Result<()> {
        self.before_value()?;
        self.out.push_str(&v.to_string());
        self.value_done();
        Ok(())
    }

    pub fn float_value(&mut self, v: f64) -> Result<()> {
        if !v.is_finite() && !self.lenient {
            return Err(structural("non-finite floats require lenient mode"));
        }
        self.before_value()?;
        if v.is_nan() {
            self.out.push_str("NaN");
        } else if v.is_infinite() {
            self.out
                .push_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
        } else if v == v.trunc() && v.abs() < 1e15 {
            // Keep whole floats readable as `1.0`, not `1`.
            self.out.push_str(&format!("{v:.1}"));
        } else {
            self.out.push_str(&v.to_string());
        }
        self.value_done();
        Ok(())
    }

    pub fn str_value(&mut self, v: &str) -> Result<()> {
        self.before_value()?;
        self.write_quoted(v);
        self.value_done();
        Ok(())
    }

    /// Splices pre-rendered JSON into the stream verbatim.
    pub fn raw_value(&mut self, json: &str) -> Result<()> {
        self.before_value()?;
        self.out.push_str(json);
        self.value_done();
        Ok(())
    }

    // -- internals ------------------------------------------------------------

    fn before_value(&mut self) -> Result<()> {
        match self.stack.last().copied() {
            Some(WScope::EmptyObject | WScope::NonemptyObject) => {
                let name = self
                    .pending_name
                    .take()
                    .ok_or_else(|| structural("value in object without a name"))?;
                if self.stack.last() == Some(&WScope::NonemptyObject) {
                    self.out.push(',');
                }
                if let Some(top) = self.stack.last_mut() {
                    *top = WScope::DanglingName;
                }
                self.newline_indent();
                self.write_quoted(&name);
                self.out.push(':');
                if self.indent.is_some() {
                    self.out.push(' ');
                }
                Ok(())
            }
            Some(WScope::NonemptyArray) => {
                self.out.push(',');
                self.newline_indent();
                Ok(())
            }
            Some(WScope::EmptyArray) => {
                self.newline_indent();
                Ok(())
            }
            Some(WScope::EmptyDocument | WScope::DanglingName) => Ok(()),
            Some(WScope::NonemptyDocument) => Err(structural("multiple top-level values")),
            None => Err(structural("writer already closed")),
        }
    }

    fn value_done(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            *top = match *top {
                WScope::EmptyDocument => WScope::NonemptyDocument,
                WScope::DanglingName => WScope::NonemptyObject,
                WScope::EmptyArray | WScope::NonemptyArray => WScope::NonemptyArray,
                other => other,
            };
        }
    }

    fn newline_indent(&mut self) {
        let Some(unit) = &self.indent else { return };
        self.out.push('\n');
        // depth counts open containers below the document scope
        let depth = self.stack.len().saturating_sub(1);
        for _ in 0..depth {
            self.out.push_str(unit);
        }
    }

    fn write_quoted(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{0008}' => self.out.push_str("\\b"),
                '\u{000C}' => self.out.push_str("\\f"),
                '\u{2028}' => self.out.push_str("\\u2028"),
                '\u{2029}' => self.out.push_str("\\u2029"),
                c if (c as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", c as u32));
                }
                '<' | '>' | '&' | '=' | '\'' if self.html_safe => {
                    self.out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn structural(msg: &'static str) -> Error {
    Error::Syntax {
        msg: msg.into(),
        line: 0,
        column: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_object() {
        let mut w = JsonWriter::new();
        w.begin_object().unwrap();
        w.name("a").unwrap();
        w.int_value(1).unwrap();
        w.name("b").unwrap();
        w.str_value("x\"y").unwrap();
        w.end_object().unwrap();
        assert_eq!(w.into_string(), r#"{"a":1,"b":"x\"y"}"#);
    }

    #[test]
    fn null_pair_dropped_by_default() {
        let mut w = JsonWriter::new();
        w.begin_object().unwrap();
        w.name("gone").unwrap();
        w.null_value().unwrap();
        w.name("kept").unwrap();
        w.bool_value(true).unwrap();
        w.end_object().unwrap();
        assert_eq!(w.into_string(), r#"{"kept":true}"#);
    }

    #[test]
    fn null_pair_written_when_enabled() {
        let mut w = JsonWriter::new();
        w.set_serialize_nulls(true);
        w.begin_object().unwrap();
        w.name("gone").unwrap();
        w.null_value().unwrap();
        w.end_object().unwrap();
        assert_eq!(w.into_string(), r#"{"gone":null}"#);
    }

    #[test]
    fn nested_arrays() {
        let mut w = JsonWriter::new();
        w.begin_array().unwrap();
        w.int_value(1).unwrap();
        w.begin_array().unwrap();
        w.float_value(2.5).unwrap();
        w.end_array().unwrap();
        w.end_array().unwrap();
        assert_eq!(w.into_string(), "[1,[2.5]]");
    }

    #[test]
    fn whole_floats_keep_a_decimal() {
        let mut w = JsonWriter::new();
        w.float_value(3.0).unwrap();
        assert_eq!(w.into_string(), "3.0");
    }

    #[test]
    fn non_finite_requires_lenient() {
        let mut w = JsonWriter::new();
        assert!(w.float_value(f64::NAN).is_err());
        w.set_lenient(true);
        w.float_value(f64::NAN).unwrap();
        assert_eq!(w.into_string(), "NaN");
    }

    #[test]
    fn pretty_indent() {
        let mut w = JsonWriter::new();
        w.set_indent("  ");
        w.begin_object().unwrap();
        w.name("a").unwrap();
        w.int_value(1).unwrap();
        w.end_object().unwrap();
        assert_eq!(w.into_string(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn html_safe_escapes() {
        let mut w = JsonWriter::new();
        w.set_html_safe(true);
        w.str_value("<b>").unwrap();
        assert_eq!(w.into_string(), "\"\\u003cb\\u003e\"");
    }
}
