use std::fmt::Display;

/// The kind of an index.
///
/// Only single-field indexes exist today; the enum leaves room for compound
/// and hashed kinds without changing the `create_index` signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexType {
    /// An ordered index over one field path.
    SingleField,
}

impl Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::SingleField => write!(f, "single-field"),
        }
    }
}

/// Describes a declared index: the field path it covers and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexDescriptor {
    field: String,
    index_type: IndexType,
}

impl IndexDescriptor {
    pub fn new(field: &str, index_type: IndexType) -> Self {
        IndexDescriptor {
            field: field.to_string(),
            index_type,
        }
    }

    /// The field path this index covers.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.index_type, self.field)
    }
}
