//! Structured `(prefix, index, key)` identifiers and their string form.
//!
//! Field identifiers only exist as strings at the render boundary. Inside the
//! controller every `name`, `id` and `for` attribute that belongs to a row is a
//! [`FieldIdent`], so a renumbering pass only has to change the row's index.

use shared::domain::{FieldKey, IdentRole, Prefix, RowIndex};

const ID_MARKER: &str = "id_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldIdent {
    pub role: IdentRole,
    /// Whether the rendered form starts with `id_`.
    pub id_marker: bool,
    /// `None` for identifiers of the row itself, such as `id="item-2"`.
    pub key: Option<FieldKey>,
}

impl FieldIdent {
    /// Identifier of a field, using the marker Django gives that attribute.
    pub fn field(role: IdentRole, key: impl Into<FieldKey>) -> Self {
        Self {
            role,
            id_marker: !role.id_marker().is_empty(),
            key: Some(key.into()),
        }
    }

    pub fn render(&self, prefix: &Prefix, index: RowIndex) -> String {
        self.render_slot(prefix, &index.to_string())
    }

    pub fn render_slot(&self, prefix: &Prefix, slot: &str) -> String {
        let marker = if self.id_marker { ID_MARKER } else { "" };
        match &self.key {
            Some(key) => format!("{marker}{prefix}-{slot}-{key}"),
            None => format!("{marker}{prefix}-{slot}"),
        }
    }
}

/// What stands right after `<prefix>-` in an identifier.
#[derive(Debug, Clone, Copy)]
pub enum IndexSlot<'a> {
    /// The template's placeholder token.
    Placeholder(&'a str),
    /// A concrete integer, as in server-rendered rows.
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdent {
    pub ident: FieldIdent,
    /// `None` when the slot held the placeholder.
    pub index: Option<RowIndex>,
}

/// Parses an identifier attribute value of the shape
/// `[id_]<prefix>-<slot>[-<key>]`.
pub fn parse_ident(
    role: IdentRole,
    prefix: &Prefix,
    value: &str,
    slot: IndexSlot<'_>,
) -> Option<ParsedIdent> {
    let (id_marker, rest) = match value.strip_prefix(ID_MARKER) {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let rest = rest.strip_prefix(prefix.as_str())?.strip_prefix('-')?;

    let (index, rest) = match slot {
        IndexSlot::Placeholder(token) => (None, rest.strip_prefix(token)?),
        IndexSlot::Integer => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            let index = rest[..digits].parse().ok().map(RowIndex)?;
            (Some(index), &rest[digits..])
        }
    };

    let key = if rest.is_empty() {
        None
    } else {
        let key = rest.strip_prefix('-')?;
        if key.is_empty() {
            return None;
        }
        Some(FieldKey::new(key))
    };

    Some(ParsedIdent {
        ident: FieldIdent {
            role,
            id_marker,
            key,
        },
        index,
    })
}
