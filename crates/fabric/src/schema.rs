//! Schema descriptions and the generic document builder.
//!
//! Each resource kind declares its wire shape once as a [`Schema`]: an ordered
//! list of slash-separated field paths with a kind and an optional flag.
//! Compilers only fill a flat [`Record`]; [`Schema::build`] owns nesting,
//! ordering, and omission of absent optional fields.
//!
//! ```
//! use fabric::schema::{Field, FieldKind, Record, Schema};
//!
//! static ADDRESS: Schema = Schema {
//!     name: "address",
//!     fields: &[
//!         Field::required("ip/address/primary/address", FieldKind::Str),
//!         Field::required("ip/address/primary/mask", FieldKind::Str),
//!         Field::optional("description", FieldKind::Str),
//!     ],
//! };
//!
//! let doc = ADDRESS
//!     .build(
//!         &Record::new()
//!             .set("ip/address/primary/address", "10.0.0.1")
//!             .set("ip/address/primary/mask", "255.255.255.255"),
//!     )
//!     .unwrap();
//! assert_eq!(
//!     doc.to_string(),
//!     r#"{"ip":{"address":{"primary":{"address":"10.0.0.1","mask":"255.255.255.255"}}}}"#
//! );
//! ```

use serde_json::{Map, Value};

use crate::ident::Marker;

/// Errors raised when a record does not fit its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A required field was not set.
    #[error("{schema}: missing required field '{field}'")]
    MissingField {
        /// Schema name.
        schema: &'static str,
        /// Field path.
        field: &'static str,
    },

    /// A field was set with a value of the wrong kind.
    #[error("{schema}: field '{field}' expects {expected}")]
    TypeMismatch {
        /// Schema name.
        schema: &'static str,
        /// Field path.
        field: &'static str,
        /// Expected kind.
        expected: &'static str,
    },

    /// A record set a field the schema does not declare.
    #[error("{schema}: unknown field '{field}'")]
    UnknownField {
        /// Schema name.
        schema: &'static str,
        /// Field path.
        field: &'static str,
    },

    /// A required list was empty.
    #[error("{schema}: list '{field}' must not be empty")]
    EmptyList {
        /// Schema name.
        schema: &'static str,
        /// Field path.
        field: &'static str,
    },

    /// A field path runs through a leaf written by an earlier field.
    #[error("{schema}: field '{field}' collides with a leaf on its path")]
    PathConflict {
        /// Schema name.
        schema: &'static str,
        /// Field path.
        field: &'static str,
    },
}

/// Value kind of a schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// JSON string.
    Str,
    /// JSON integer.
    Int,
    /// JSON boolean.
    Bool,
    /// Flag leaf rendered with the given presence marker.
    Presence(Marker),
    /// Array of entries, each built from the nested schema.
    List(&'static Schema),
    /// Array of integers.
    IntList,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            Self::Str => "a string",
            Self::Int => "an integer",
            Self::Bool => "a boolean",
            Self::Presence(_) => "a presence flag",
            Self::List(_) => "a list of entries",
            Self::IntList => "a list of integers",
        }
    }
}

/// One leaf or list in a schema.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Slash-separated location in the document.
    pub path: &'static str,
    /// Value kind.
    pub kind: FieldKind,
    /// Whether the field may be absent.
    pub optional: bool,
}

impl Field {
    /// A field that must always be set.
    #[must_use]
    pub const fn required(path: &'static str, kind: FieldKind) -> Self {
        Self {
            path,
            kind,
            optional: false,
        }
    }

    /// A field omitted from the document when unset.
    #[must_use]
    pub const fn optional(path: &'static str, kind: FieldKind) -> Self {
        Self {
            path,
            kind,
            optional: true,
        }
    }
}

/// Ordered description of a document or list entry.
#[derive(Debug)]
pub struct Schema {
    /// Name used in error messages.
    pub name: &'static str,
    /// Fields in emission order.
    pub fields: &'static [Field],
}

/// A value assigned to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Presence flag.
    Flag,
    /// List entries.
    List(Vec<Record>),
    /// Integer list.
    IntList(Vec<i64>),
}

impl From<String> for Leaf {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Leaf {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<&String> for Leaf {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<i64> for Leaf {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Leaf {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u16> for Leaf {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for Leaf {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<Record>> for Leaf {
    fn from(v: Vec<Record>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<i64>> for Leaf {
    fn from(v: Vec<i64>) -> Self {
        Self::IntList(v)
    }
}

/// Flat field assignments for one schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(&'static str, Leaf)>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `path`, replacing any earlier value.
    pub fn set(mut self, path: &'static str, value: impl Into<Leaf>) -> Self {
        let value = value.into();
        match self.values.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => slot.1 = value,
            None => self.values.push((path, value)),
        }
        self
    }

    /// Assign `path` only when `value` is present.
    pub fn set_opt<V: Into<Leaf>>(self, path: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(path, v),
            None => self,
        }
    }

    /// Mark a presence flag.
    pub fn flag(self, path: &'static str) -> Self {
        self.set(path, Leaf::Flag)
    }

    /// Mark a presence flag when `present` holds.
    pub fn flag_if(self, path: &'static str, present: bool) -> Self {
        if present { self.flag(path) } else { self }
    }

    /// Value assigned to `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Leaf> {
        self.values.iter().find(|(p, _)| *p == path).map(|(_, v)| v)
    }

    /// Whether nothing has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Schema {
    /// Build the nested document for `record`.
    pub fn build(&self, record: &Record) -> Result<Value, SchemaError> {
        if let Some((path, _)) = record
            .values
            .iter()
            .find(|(path, _)| !self.fields.iter().any(|f| f.path == *path))
        {
            return Err(SchemaError::UnknownField {
                schema: self.name,
                field: *path,
            });
        }

        let mut root = Map::new();
        for field in self.fields {
            let Some(leaf) = record.get(field.path) else {
                if field.optional {
                    continue;
                }
                return Err(SchemaError::MissingField {
                    schema: self.name,
                    field: field.path,
                });
            };
            if let Some(value) = self.render(field, leaf)? {
                self.insert(&mut root, field.path, value)?;
            }
        }
        Ok(Value::Object(root))
    }

    /// Whether `path` is declared by this schema.
    #[must_use]
    pub fn declares(&self, path: &str) -> bool {
        self.fields.iter().any(|f| f.path == path)
    }

    fn render(&self, field: &Field, leaf: &Leaf) -> Result<Option<Value>, SchemaError> {
        let value = match (field.kind, leaf) {
            (FieldKind::Str, Leaf::Str(s)) => Value::from(s.as_str()),
            (FieldKind::Int, Leaf::Int(i)) => Value::from(*i),
            (FieldKind::Bool, Leaf::Bool(b)) => Value::from(*b),
            (FieldKind::Presence(marker), Leaf::Flag) => marker.to_value(),
            (FieldKind::List(entry), Leaf::List(items)) => {
                if items.is_empty() {
                    return self.empty_list(field);
                }
                Value::Array(
                    items
                        .iter()
                        .map(|item| entry.build(item))
                        .collect::<Result<_, _>>()?,
                )
            }
            (FieldKind::IntList, Leaf::IntList(items)) => {
                if items.is_empty() {
                    return self.empty_list(field);
                }
                Value::from(items.clone())
            }
            (kind, _) => {
                return Err(SchemaError::TypeMismatch {
                    schema: self.name,
                    field: field.path,
                    expected: kind.name(),
                });
            }
        };
        Ok(Some(value))
    }

    fn empty_list(&self, field: &Field) -> Result<Option<Value>, SchemaError> {
        if field.optional {
            Ok(None)
        } else {
            Err(SchemaError::EmptyList {
                schema: self.name,
                field: field.path,
            })
        }
    }

    fn insert(
        &self,
        root: &mut Map<String, Value>,
        path: &'static str,
        value: Value,
    ) -> Result<(), SchemaError> {
        let conflict = || SchemaError::PathConflict {
            schema: self.name,
            field: path,
        };

        let mut segments = path.split('/').peekable();
        let mut node = root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.insert(segment.to_string(), value);
                return Ok(());
            }
            node = node
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or_else(conflict)?;
        }
        Ok(())
    }
}
