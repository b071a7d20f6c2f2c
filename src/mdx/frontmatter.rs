//! Frontmatter codec.
//!
//! Serializes and parses the restricted YAML block delimited by `---`
//! lines at the top of an MDX file. Serialization preserves field order
//! and emits the exact quoting the site's content collections expect;
//! parsing accepts any mapping the YAML parser understands and flags
//! everything else as malformed so batch callers can skip the file.

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while parsing an MDX document.
#[derive(Error, Diagnostic, Debug)]
pub enum FrontmatterError {
    #[error("missing frontmatter delimiters")]
    #[diagnostic(code(mdxsync::frontmatter::malformed))]
    Malformed,

    #[error("invalid YAML frontmatter: {0}")]
    #[diagnostic(code(mdxsync::frontmatter::yaml))]
    Yaml(String),

    #[error("unsupported value for field \"{key}\"")]
    #[diagnostic(code(mdxsync::frontmatter::unsupported_value))]
    UnsupportedValue { key: String },
}

/// A frontmatter field value.
///
/// The codec supports the scalar shapes the content collections use plus
/// one level of nesting for the `translations` cross-link map and
/// list-valued fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Int(i64),
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, String)]> {
        match self {
            FieldValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

/// An ordered set of frontmatter fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: Vec<(String, FieldValue)>,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing any existing value under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_bool)
    }

    pub fn int_field(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_int)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An MDX document: ordered frontmatter plus a Markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdxDocument {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl MdxDocument {
    pub fn new(frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    /// Render the document to its on-disk form.
    ///
    /// `---\n<fields>\n---\n\n<body>\n` with strings double-quoted
    /// (embedded quotes escaped), booleans and integers unquoted, and
    /// lists/maps as indented blocks under their key.
    pub fn serialize(&self) -> String {
        let mut lines = Vec::with_capacity(self.fields_len() + 2);
        for (key, value) in self.frontmatter.iter() {
            match value {
                FieldValue::String(s) => {
                    lines.push(format!("{}: \"{}\"", key, escape_quotes(s)));
                }
                FieldValue::Bool(b) => lines.push(format!("{}: {}", key, b)),
                FieldValue::Int(n) => lines.push(format!("{}: {}", key, n)),
                FieldValue::List(items) => {
                    lines.push(format!("{}:", key));
                    for item in items {
                        lines.push(format!("  - \"{}\"", escape_quotes(item)));
                    }
                }
                FieldValue::Map(entries) => {
                    lines.push(format!("{}:", key));
                    for (k, v) in entries {
                        lines.push(format!("  {}: \"{}\"", k, escape_quotes(v)));
                    }
                }
            }
        }
        format!("---\n{}\n---\n\n{}\n", lines.join("\n"), self.body.trim_end())
    }

    /// Parse an on-disk MDX document.
    ///
    /// The block between the first two `---` lines is parsed as YAML; a
    /// missing second delimiter or a YAML error yields a malformed-class
    /// error the caller must treat as unusable.
    pub fn parse(text: &str) -> Result<Self, FrontmatterError> {
        let (raw, body) = split_frontmatter(text)?;

        let mapping: serde_yaml::Value =
            serde_yaml::from_str(&raw).map_err(|e| FrontmatterError::Yaml(e.to_string()))?;
        let mapping = match mapping {
            serde_yaml::Value::Mapping(m) => m,
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            _ => return Err(FrontmatterError::Malformed),
        };

        let mut frontmatter = Frontmatter::new();
        for (key, value) in mapping {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                other => scalar_to_string(&other).ok_or(FrontmatterError::Malformed)?,
            };
            let value = convert_value(&key, value)?;
            frontmatter.set(key, value);
        }

        Ok(Self { frontmatter, body })
    }

    fn fields_len(&self) -> usize {
        self.frontmatter.fields.len()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// Split a document into its raw frontmatter block and body.
fn split_frontmatter(text: &str) -> Result<(String, String), FrontmatterError> {
    let lines: Vec<&str> = text.lines().collect();

    if lines.is_empty() || lines[0].trim() != "---" {
        return Err(FrontmatterError::Malformed);
    }

    let closing_index = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == "---")
        .ok_or(FrontmatterError::Malformed)?
        + 1;

    let raw = lines[1..closing_index].join("\n");
    let body = if closing_index + 1 < lines.len() {
        lines[closing_index + 1..].join("\n").trim_start().to_string()
    } else {
        String::new()
    };

    Ok((raw, body))
}

fn convert_value(key: &str, value: serde_yaml::Value) -> Result<FieldValue, FrontmatterError> {
    match value {
        serde_yaml::Value::String(s) => Ok(FieldValue::String(s)),
        serde_yaml::Value::Bool(b) => Ok(FieldValue::Bool(b)),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(FieldValue::Int(i)),
            None => Ok(FieldValue::String(n.to_string())),
        },
        serde_yaml::Value::Null => Ok(FieldValue::String(String::new())),
        serde_yaml::Value::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(scalar_to_string(&item).ok_or_else(|| {
                    FrontmatterError::UnsupportedValue {
                        key: key.to_string(),
                    }
                })?);
            }
            Ok(FieldValue::List(list))
        }
        serde_yaml::Value::Mapping(entries) => {
            let mut map = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let k = scalar_to_string(&k).ok_or_else(|| FrontmatterError::UnsupportedValue {
                    key: key.to_string(),
                })?;
                let v = scalar_to_string(&v).ok_or_else(|| FrontmatterError::UnsupportedValue {
                    key: key.to_string(),
                })?;
                map.push((k, v));
            }
            Ok(FieldValue::Map(map))
        }
        serde_yaml::Value::Tagged(_) => Err(FrontmatterError::UnsupportedValue {
            key: key.to_string(),
        }),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
