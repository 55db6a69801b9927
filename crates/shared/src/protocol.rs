use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Prefix, RowIndex};

/// Upper bound the server assumes when a formset has no `max_num`.
pub const DEFAULT_MAX_NUM_FORMS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagementField {
    TotalForms,
    InitialForms,
    MinNumForms,
    MaxNumForms,
}

impl ManagementField {
    pub const ALL: [ManagementField; 4] = [
        ManagementField::TotalForms,
        ManagementField::InitialForms,
        ManagementField::MinNumForms,
        ManagementField::MaxNumForms,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            ManagementField::TotalForms => "TOTAL_FORMS",
            ManagementField::InitialForms => "INITIAL_FORMS",
            ManagementField::MinNumForms => "MIN_NUM_FORMS",
            ManagementField::MaxNumForms => "MAX_NUM_FORMS",
        }
    }

    pub fn field_name(self, prefix: &Prefix) -> String {
        format!("{prefix}-{}", self.suffix())
    }

    pub fn element_id(self, prefix: &Prefix) -> String {
        format!("id_{}", self.field_name(prefix))
    }
}

/// Hidden inputs the server reads next to the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementForm {
    pub total_forms: usize,
    pub initial_forms: usize,
    pub min_num_forms: usize,
    pub max_num_forms: usize,
}

impl ManagementForm {
    pub fn value(&self, field: ManagementField) -> usize {
        match field {
            ManagementField::TotalForms => self.total_forms,
            ManagementField::InitialForms => self.initial_forms,
            ManagementField::MinNumForms => self.min_num_forms,
            ManagementField::MaxNumForms => self.max_num_forms,
        }
    }

    pub fn to_fields(&self, prefix: &Prefix) -> BTreeMap<String, String> {
        ManagementField::ALL
            .into_iter()
            .map(|field| (field.field_name(prefix), self.value(field).to_string()))
            .collect()
    }
}

/// What the server receives when the parent form is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub prefix: Prefix,
    pub management: ManagementForm,
    pub fields: BTreeMap<String, String>,
}

impl Submission {
    /// Management inputs and row fields merged into one flat form body.
    pub fn form_data(&self) -> BTreeMap<String, String> {
        let mut data = self.management.to_fields(&self.prefix);
        data.extend(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        data
    }

    /// Every row index referenced by a submitted field name.
    pub fn row_indices(&self) -> BTreeSet<RowIndex> {
        self.fields
            .keys()
            .filter_map(|name| parse_row_index(&self.prefix, name))
            .collect()
    }

    /// True when the indices form exactly `0..total_forms`.
    pub fn is_dense(&self) -> bool {
        let indices = self.row_indices();
        indices.len() == self.management.total_forms
            && indices
                .iter()
                .enumerate()
                .all(|(position, index)| index.0 == position)
    }
}

/// Extracts `<n>` from a field name of the form `<prefix>-<n>-<key>`.
pub fn parse_row_index(prefix: &Prefix, name: &str) -> Option<RowIndex> {
    let rest = name.strip_prefix(prefix.as_str())?.strip_prefix('-')?;
    let (digits, key) = rest.split_once('-')?;
    if key.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(RowIndex)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn submission(total_forms: usize, names: &[&str]) -> Submission {
        Submission {
            prefix: Prefix::new("item"),
            management: ManagementForm {
                total_forms,
                initial_forms: 0,
                min_num_forms: 0,
                max_num_forms: DEFAULT_MAX_NUM_FORMS,
            },
            fields: names
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        }
    }

    #[test]
    fn management_field_names_are_scoped_by_prefix() {
        let prefix = Prefix::new("lines");
        assert_eq!(
            ManagementField::TotalForms.field_name(&prefix),
            "lines-TOTAL_FORMS"
        );
        assert_eq!(
            ManagementField::MaxNumForms.element_id(&prefix),
            "id_lines-MAX_NUM_FORMS"
        );
    }

    #[test]
    fn parses_row_index_only_under_own_prefix() {
        let prefix = Prefix::new("item");
        assert_eq!(parse_row_index(&prefix, "item-3-qty"), Some(RowIndex(3)));
        assert_eq!(parse_row_index(&prefix, "item-TOTAL_FORMS"), None);
        assert_eq!(parse_row_index(&prefix, "other-3-qty"), None);
        assert_eq!(parse_row_index(&prefix, "item-__prefix__-qty"), None);
        assert_eq!(parse_row_index(&prefix, "item-3-"), None);
    }

    #[test]
    fn dense_submission_requires_contiguous_indices() {
        assert!(submission(2, &["item-0-qty", "item-1-qty"]).is_dense());
        assert!(!submission(2, &["item-0-qty", "item-2-qty"]).is_dense());
        assert!(!submission(3, &["item-0-qty", "item-1-qty"]).is_dense());
    }

    #[test]
    fn form_data_includes_management_inputs() {
        let data = submission(1, &["item-0-qty"]).form_data();
        assert_eq!(data.get("item-TOTAL_FORMS").map(String::as_str), Some("1"));
        assert_eq!(data.get("item-MAX_NUM_FORMS").map(String::as_str), Some("1000"));
        assert!(data.contains_key("item-0-qty"));
    }
}
