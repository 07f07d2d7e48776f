//! Common Data Element definitions and the target schema.
//!
//! A schema is an ordered list of CDEs. Each CDE has a unique code, a value
//! type and, for categorical types, an ordered value domain of
//! `encoded value -> display label` pairs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mapping::TransformType;

/// Value type of a CDE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CdeType {
    Integer,
    Real,
    #[serde(alias = "binominal")]
    Binomial,
    #[serde(alias = "multinominal")]
    Multinomial,
}

impl CdeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdeType::Integer => "integer",
            CdeType::Real => "real",
            CdeType::Binomial => "binomial",
            CdeType::Multinomial => "multinomial",
        }
    }

    /// True for `integer` and `real`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CdeType::Integer | CdeType::Real)
    }

    pub fn is_categorical(&self) -> bool {
        !self.is_numeric()
    }

    /// The only transform type a row of this CDE type may carry.
    pub fn transform_type(&self) -> TransformType {
        if self.is_numeric() {
            TransformType::Scale
        } else {
            TransformType::Map
        }
    }
}

impl fmt::Display for CdeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CdeType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "integer" => Ok(CdeType::Integer),
            "real" => Ok(CdeType::Real),
            "binomial" | "binominal" => Ok(CdeType::Binomial),
            "multinomial" | "multinominal" => Ok(CdeType::Multinomial),
            _ => Err(ModelError::UnknownCdeType(s.to_string())),
        }
    }
}

/// One `encoded value -> display label` pair of a categorical CDE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainValue {
    pub code: String,
    pub label: String,
}

/// Ordered value domain of a categorical CDE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueDomain {
    values: Vec<DomainValue>,
}

impl ValueDomain {
    pub fn new(values: Vec<DomainValue>) -> Self {
        Self { values }
    }

    /// Builds a domain from `(code, label)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(code, label)| DomainValue {
                    code: code.into(),
                    label: label.into(),
                })
                .collect(),
        }
    }

    /// Parses the string-encoded `values` cell of a schema row.
    ///
    /// Accepts brace groups of `"code","label"` pairs
    /// (`{"0","Male"},{"1","Female"}`) as well as a single dictionary-style
    /// group (`{0: "Male", 1: "Female"}`). Typographic quotes are replaced by
    /// straight quotes first. A blank cell yields an empty domain.
    pub fn parse(cde_code: &str, raw: &str) -> Result<Self> {
        let normalized = normalize_quotes(raw);
        let groups = tokenize_groups(&normalized).map_err(|message| {
            ModelError::InvalidValueDomain {
                code: cde_code.to_string(),
                message,
            }
        })?;

        let mut values = Vec::new();
        for group in groups {
            if group.separators.iter().any(|sep| *sep == ':') {
                // {k: v, k: v}
                if group.items.len() % 2 != 0 {
                    return Err(ModelError::InvalidValueDomain {
                        code: cde_code.to_string(),
                        message: "unbalanced key/value pairs".to_string(),
                    });
                }
                for (idx, pair) in group.items.chunks(2).enumerate() {
                    let expected_colon = group.separators.get(idx * 2).copied();
                    if expected_colon != Some(':') {
                        return Err(ModelError::InvalidValueDomain {
                            code: cde_code.to_string(),
                            message: "expected ':' between code and label".to_string(),
                        });
                    }
                    values.push(DomainValue {
                        code: pair[0].clone(),
                        label: pair[1].clone(),
                    });
                }
            } else if group.items.len() == 2 {
                values.push(DomainValue {
                    code: group.items[0].clone(),
                    label: group.items[1].clone(),
                });
            } else {
                return Err(ModelError::InvalidValueDomain {
                    code: cde_code.to_string(),
                    message: format!(
                        "expected a (code, label) pair, found {} items",
                        group.items.len()
                    ),
                });
            }
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[DomainValue] {
        &self.values
    }

    /// Encoded values in declaration order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.code.as_str())
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.values.iter().any(|v| v.code == code)
    }

    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.code == code)
            .map(|v| v.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize_quotes(raw: &str) -> String {
    raw.replace(['\u{201c}', '\u{201d}', '\u{201e}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

struct Group {
    items: Vec<String>,
    separators: Vec<char>,
}

fn tokenize_groups(input: &str) -> std::result::Result<Vec<Group>, String> {
    let mut groups = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some('{') => {}
            Some(other) => return Err(format!("unexpected character {other:?} outside braces")),
        }

        let mut group = Group {
            items: Vec::new(),
            separators: Vec::new(),
        };
        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            match chars.peek().copied() {
                None => return Err("unterminated '{'".to_string()),
                Some('}') => {
                    chars.next();
                    break;
                }
                Some(sep @ (',' | ':')) => {
                    if group.separators.len() >= group.items.len() {
                        return Err(format!("unexpected {sep:?}"));
                    }
                    chars.next();
                    group.separators.push(sep);
                }
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut item = String::new();
                    loop {
                        match chars.next() {
                            None => return Err("unterminated quoted string".to_string()),
                            Some('\\') => {
                                if let Some(escaped) = chars.next() {
                                    item.push(escaped);
                                }
                            }
                            Some(c) if c == quote => break,
                            Some(c) => item.push(c),
                        }
                    }
                    group.items.push(item);
                }
                Some(_) => {
                    let mut item = String::new();
                    while let Some(c) = chars.peek().copied() {
                        if matches!(c, ',' | ':' | '}') {
                            break;
                        }
                        item.push(c);
                        chars.next();
                    }
                    group.items.push(item.trim().to_string());
                }
            }
        }
        groups.push(group);
    }
    Ok(groups)
}

/// A single Common Data Element of the target schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdeEntry {
    pub code: String,
    #[serde(rename = "type")]
    pub cde_type: CdeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueDomain>,
}

impl CdeEntry {
    pub fn numeric(code: impl Into<String>, cde_type: CdeType) -> Self {
        Self {
            code: code.into(),
            cde_type,
            values: None,
        }
    }

    pub fn categorical(code: impl Into<String>, cde_type: CdeType, values: ValueDomain) -> Self {
        Self {
            code: code.into(),
            cde_type,
            values: Some(values),
        }
    }
}

/// The target schema: CDEs in declaration order, unique by code.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<CdeEntry>,
    index: BTreeMap<String, usize>,
}

impl Schema {
    /// Builds a schema, rejecting duplicate codes.
    pub fn new(entries: Vec<CdeEntry>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if index.insert(entry.code.clone(), idx).is_some() {
                return Err(ModelError::DuplicateCode(entry.code.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn get(&self, code: &str) -> Option<&CdeEntry> {
        self.index.get(code).map(|idx| &self.entries[*idx])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn entries(&self) -> &[CdeEntry] {
        &self.entries
    }

    /// CDE codes in declaration order.
    pub fn codes(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.code.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tuple_groups_with_smart_quotes() {
        let domain =
            ValueDomain::parse("sex", "{\u{201c}M\u{201d},\u{201c}Male\u{201d}},{\"F\",\"Female\"}")
                .unwrap();
        let codes: Vec<&str> = domain.codes().collect();
        assert_eq!(codes, vec!["M", "F"]);
        assert_eq!(domain.label_for("F"), Some("Female"));
    }

    #[test]
    fn parses_dictionary_group() {
        let domain = ValueDomain::parse("sex", "{0: \"Male\", 1: 'Female'}").unwrap();
        assert_eq!(domain.len(), 2);
        assert_eq!(domain.values()[0].code, "0");
        assert_eq!(domain.values()[1].label, "Female");
    }

    #[test]
    fn blank_cell_is_empty_domain() {
        let domain = ValueDomain::parse("x", "  ").unwrap();
        assert!(domain.is_empty());
    }

    #[test]
    fn rejects_malformed_domain() {
        assert!(ValueDomain::parse("x", "{\"a\",\"b\",\"c\"}").is_err());
        assert!(ValueDomain::parse("x", "{\"a\",\"b\"").is_err());
        assert!(ValueDomain::parse("x", "a,b").is_err());
    }

    #[test]
    fn cde_type_aliases() {
        assert_eq!("binominal".parse::<CdeType>().unwrap(), CdeType::Binomial);
        assert_eq!(" Real ".parse::<CdeType>().unwrap(), CdeType::Real);
        assert!(matches!(
            "text".parse::<CdeType>(),
            Err(ModelError::UnknownCdeType(_))
        ));
    }

    #[test]
    fn schema_rejects_duplicate_codes() {
        let result = Schema::new(vec![
            CdeEntry::numeric("age", CdeType::Integer),
            CdeEntry::numeric("age", CdeType::Real),
        ]);
        assert_eq!(result.unwrap_err(), ModelError::DuplicateCode("age".into()));
    }
}
