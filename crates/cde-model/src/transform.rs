//! Parser and formatter for transform literals.
//!
//! Only two shapes are accepted: a floating-point literal for `scale` rows
//! and a flat string-to-string dictionary for `map` rows. The sentinel
//! `"nan"` stands for "no transform" in both.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mapping::TransformType;

/// Transform string meaning "leave the column as is".
pub const NO_TRANSFORM: &str = "nan";

/// Neutral scale factor proposed for numeric CDEs.
pub const NEUTRAL_SCALE: &str = "1.0";

/// Placeholder relabel dictionary for rows created without column values.
pub const PLACEHOLDER_MAP: &str = "{\"X\": \"Y\", \"Y\": \"X\"}";

/// A parsed transform literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// The `"nan"` sentinel.
    Identity,
    Scale(f64),
    Map(RelabelMap),
}

impl Transform {
    /// Parses `literal` according to the row's transform type.
    pub fn parse(transform_type: TransformType, literal: &str) -> Result<Self> {
        if is_no_transform(literal) {
            return Ok(Transform::Identity);
        }
        match transform_type {
            TransformType::Scale => parse_scale(literal).map(Transform::Scale),
            TransformType::Map => RelabelMap::parse(literal).map(Transform::Map),
        }
    }
}

/// True when `literal` is the no-transform sentinel.
pub fn is_no_transform(literal: &str) -> bool {
    literal.trim().eq_ignore_ascii_case(NO_TRANSFORM)
}

/// Parses a finite floating-point scale factor.
pub fn parse_scale(literal: &str) -> Result<f64> {
    let trimmed = literal.trim();
    let invalid = |message: &str| ModelError::InvalidTransform {
        kind: "scale",
        literal: literal.to_string(),
        message: message.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid("empty literal"));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| invalid("not a floating-point literal"))?;
    if !value.is_finite() {
        return Err(invalid("scale factor must be finite"));
    }
    Ok(value)
}

/// Ordered `source value -> target value` relabeling dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelabelMap {
    entries: Vec<(String, String)>,
}

impl RelabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.insert(key, value);
        }
        map
    }

    /// Inserts or replaces the entry for `key`, keeping first insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a flat dictionary literal such as `{'M': 'Male', "F": "Female"}`.
    ///
    /// Keys and values must be quoted strings. Later duplicates replace
    /// earlier ones.
    pub fn parse(literal: &str) -> Result<Self> {
        let mut parser = DictParser {
            chars: literal.chars().collect(),
            pos: 0,
        };
        parser.parse().map_err(|message| ModelError::InvalidTransform {
            kind: "map",
            literal: literal.to_string(),
            message,
        })
    }

    /// Renders the dictionary as a literal that [`RelabelMap::parse`] accepts.
    pub fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelabelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "\"{}\": \"{}\"", escape(key), escape(value))?;
        }
        f.write_str("}")
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

struct DictParser {
    chars: Vec<char>,
    pos: usize,
}

impl DictParser {
    fn parse(&mut self) -> std::result::Result<RelabelMap, String> {
        let mut map = RelabelMap::new();
        self.skip_ws();
        self.expect('{')?;
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }
            let key = self.string()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.string()?;
            map.insert(key, value);
            self.skip_ws();
            match self.next() {
                Some(',') => {}
                Some('}') => break,
                Some(c) => return Err(format!("expected ',' or '}}', found {c:?}")),
                None => return Err("unterminated dictionary".to_string()),
            }
        }
        self.skip_ws();
        if let Some(c) = self.peek() {
            return Err(format!("trailing input starting at {c:?}"));
        }
        Ok(map)
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        let quote = match self.next() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(format!("expected quoted string, found {c:?}")),
            None => return Err("expected quoted string, found end of input".to_string()),
        };
        let mut out = String::new();
        loop {
            match self.next() {
                None => return Err("unterminated string".to_string()),
                Some('\\') => match self.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err("dangling escape".to_string()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        match self.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected {expected:?}, found {c:?}")),
            None => Err(format!("expected {expected:?}, found end of input")),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_literals() {
        assert_eq!(parse_scale("1.0").unwrap(), 1.0);
        assert_eq!(parse_scale(" 2 ").unwrap(), 2.0);
        assert_eq!(parse_scale("1e-3").unwrap(), 0.001);
        assert!(parse_scale("inf").is_err());
        assert!(parse_scale("two").is_err());
        assert!(parse_scale("").is_err());
    }

    #[test]
    fn sentinel_is_identity_for_both_types() {
        assert_eq!(
            Transform::parse(TransformType::Scale, "nan").unwrap(),
            Transform::Identity
        );
        assert_eq!(
            Transform::parse(TransformType::Map, "nan").unwrap(),
            Transform::Identity
        );
    }

    #[test]
    fn parses_single_quoted_dictionary() {
        let map = RelabelMap::parse("{'M': 'Male', \"F\": \"Female\",}").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("M"), Some("Male"));
        assert_eq!(map.get("F"), Some("Female"));
    }

    #[test]
    fn rejects_non_string_dictionaries() {
        assert!(RelabelMap::parse("{0: 'a'}").is_err());
        assert!(RelabelMap::parse("{'a': ['b']}").is_err());
        assert!(RelabelMap::parse("{'a': 'b'} extra").is_err());
        assert!(RelabelMap::parse("__import__('os')").is_err());
    }

    #[test]
    fn formats_with_escapes() {
        let map = RelabelMap::from_pairs([("a\"b", "c"), ("d", "e\\f")]);
        insta::assert_snapshot!(map.to_literal(), @r#"{"a\"b": "c", "d": "e\\f"}"#);
        assert_eq!(RelabelMap::parse(&map.to_literal()).unwrap(), map);
    }

    #[test]
    fn empty_dictionary() {
        let map = RelabelMap::parse("{ }").unwrap();
        assert!(map.is_empty());
        assert_eq!(map.to_literal(), "{}");
    }
}
