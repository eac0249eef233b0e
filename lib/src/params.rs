//! Positional query parameters
//!
//! The SQL engine has no server-side bind API, so `?` placeholders are
//! replaced with rendered SQL literals before the query text reaches the
//! engine. Values are typed and strings are quoted with embedded quotes
//! doubled, so caller-supplied text can never terminate its own literal.

use crate::error::Error;
use crate::Result;

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Param {
    /// Guess the best-typed parameter for a raw command-line string.
    ///
    /// Tries integer, float, and boolean readings before falling back to a
    /// string. Non-finite float spellings ("nan", "inf") stay strings.
    pub fn infer(raw: &str) -> Param {
        if raw.eq_ignore_ascii_case("null") {
            return Param::Null;
        }
        if raw.eq_ignore_ascii_case("true") {
            return Param::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Param::Bool(false);
        }
        if let Ok(v) = raw.parse::<i64>() {
            return Param::Int(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            if v.is_finite() {
                return Param::Float(v);
            }
        }
        Param::Str(raw.to_string())
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Param::Null => out.push_str("NULL"),
            Param::Bool(true) => out.push_str("TRUE"),
            Param::Bool(false) => out.push_str("FALSE"),
            Param::Int(v) => out.push_str(&v.to_string()),
            Param::Float(v) => {
                // Keep whole floats float-typed in the SQL text.
                if v.is_finite() && v.fract() == 0.0 {
                    out.push_str(&format!("{v:.1}"));
                } else {
                    out.push_str(&v.to_string());
                }
            }
            Param::Str(s) => {
                out.push('\'');
                for c in s.chars() {
                    if c == '\'' {
                        out.push('\'');
                    }
                    out.push(c);
                }
                out.push('\'');
            }
        }
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<u32> for Param {
    fn from(v: u32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

/// Substitute `?` placeholders in `sql` with the rendered `params`.
///
/// Placeholders inside string literals, quoted identifiers, and comments are
/// left alone. The placeholder count must match the parameter count exactly;
/// a mismatch in either direction is an error, never silent truncation.
pub fn bind(sql: &str, params: &[Param]) -> Result<String> {
    let offsets = placeholder_offsets(sql);
    if offsets.len() != params.len() {
        return Err(Error::ParameterCount {
            placeholders: offsets.len(),
            supplied: params.len(),
        });
    }
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut last = 0;
    for (offset, param) in offsets.iter().zip(params) {
        out.push_str(&sql[last..*offset]);
        param.render_into(&mut out);
        last = offset + 1;
    }
    out.push_str(&sql[last..]);
    Ok(out)
}

// Byte offsets of every `?` outside strings, quoted identifiers, and
// comments. All sentinels are ASCII, so scanning bytes is UTF-8 safe.
fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut offsets = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        // '' is an escaped quote inside the literal
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            b'?' => {
                offsets.push(i);
                i += 1;
            }
            _ => i += 1,
        }
    }
    offsets
}
