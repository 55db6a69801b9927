use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Position of a row inside its formset. Changes on every renumbering pass.
index_newtype!(RowIndex);
// Registry identity of a row. Stable for the row's whole lifetime.
index_newtype!(RowHandle);

name_newtype!(Prefix);
name_newtype!(FieldKey);

impl RowIndex {
    /// One-based number shown to the user next to the row.
    pub fn serial(self) -> usize {
        self.0 + 1
    }
}

/// Which identifier attribute of an element a structured identifier renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentRole {
    Name,
    Id,
    For,
}

impl IdentRole {
    pub const ALL: [IdentRole; 3] = [IdentRole::Name, IdentRole::Id, IdentRole::For];

    pub fn attr_name(self) -> &'static str {
        match self {
            IdentRole::Name => "name",
            IdentRole::Id => "id",
            IdentRole::For => "for",
        }
    }

    pub fn from_attr_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(IdentRole::Name),
            "id" => Some(IdentRole::Id),
            "for" => Some(IdentRole::For),
            _ => None,
        }
    }

    /// Element ids and label targets carry the `id_` marker; field names do not.
    pub fn id_marker(self) -> &'static str {
        match self {
            IdentRole::Name => "",
            IdentRole::Id | IdentRole::For => "id_",
        }
    }
}

/// Lifecycle of a row inside a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Instantiated,
    Mounted,
    Indexed,
    Removed,
}
