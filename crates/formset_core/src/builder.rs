//! Standard row markup for a list of fields.
//!
//! Produces both the empty-row template (indices replaced by the placeholder)
//! and concrete server-style rows, in either a stacked or a tabular layout.

use serde::{Deserialize, Serialize};
use shared::domain::{FieldKey, IdentRole, Prefix, RowIndex};

use crate::{
    config::FormsetConfig,
    ident::FieldIdent,
    markup::{Element, Node},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Email,
    Date,
    Checkbox,
    Hidden,
    Textarea,
}

impl InputKind {
    fn input_type(self) -> Option<&'static str> {
        match self {
            InputKind::Text => Some("text"),
            InputKind::Number => Some("number"),
            InputKind::Email => Some("email"),
            InputKind::Date => Some("date"),
            InputKind::Checkbox => Some("checkbox"),
            InputKind::Hidden => Some("hidden"),
            InputKind::Textarea => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub input: InputKind,
}

impl FieldSpec {
    pub fn new(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: Some(label.into()),
            input: InputKind::Text,
        }
    }

    pub fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    prefix: Prefix,
    placeholder: String,
    row_class: String,
    serial_class: String,
    remove_class: String,
    fields: Vec<FieldSpec>,
    tabular: bool,
    remove_text: String,
}

impl TemplateBuilder {
    pub fn new(config: &FormsetConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            placeholder: config.placeholder.clone(),
            row_class: config.classes.row.clone(),
            serial_class: config.classes.serial.clone(),
            remove_class: config.classes.remove.clone(),
            fields: Vec::new(),
            tabular: false,
            remove_text: "Remove".into(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn tabular(mut self, tabular: bool) -> Self {
        self.tabular = tabular;
        self
    }

    pub fn remove_text(mut self, text: impl Into<String>) -> Self {
        self.remove_text = text.into();
        self
    }

    /// The empty-row template, carrying the placeholder wherever an index goes.
    pub fn empty_form(&self) -> Node {
        self.build(&self.placeholder)
    }

    /// A row as the server would render it at `index`.
    pub fn form(&self, index: RowIndex) -> Node {
        self.build(&index.to_string())
    }

    fn build(&self, slot: &str) -> Node {
        let (row_tag, cell_tag) = if self.tabular { ("tr", "td") } else { ("div", "div") };

        let row_id = FieldIdent {
            role: IdentRole::Id,
            id_marker: false,
            key: None,
        }
        .render_slot(&self.prefix, slot);

        let mut row = Element::new(row_tag)
            .attr("class", &self.row_class)
            .attr("id", row_id)
            .child(
                Element::new(cell_tag).child(
                    Element::new("span")
                        .attr("class", &self.serial_class)
                        .with_text("#"),
                ),
            );

        for field in &self.fields {
            row = row.child(self.field_cell(cell_tag, field, slot));
        }

        row.child(
            Element::new(cell_tag).child(
                Element::new("button")
                    .attr("type", "button")
                    .attr("class", &self.remove_class)
                    .with_text(&self.remove_text),
            ),
        )
        .into()
    }

    fn field_cell(&self, cell_tag: &str, field: &FieldSpec, slot: &str) -> Element {
        let render = |role| FieldIdent::field(role, field.key.clone()).render_slot(&self.prefix, slot);

        let mut cell = Element::new(cell_tag);
        // Tabular rows carry their labels in the table header instead.
        if let (Some(label), false) = (&field.label, self.tabular) {
            cell = cell.child(
                Element::new("label")
                    .attr("for", render(IdentRole::For))
                    .with_text(label),
            );
        }

        let input = match field.input.input_type() {
            Some(input_type) => Element::new("input").attr("type", input_type),
            None => Element::new("textarea"),
        };
        cell.child(
            input
                .attr("name", render(IdentRole::Name))
                .attr("id", render(IdentRole::Id)),
        )
    }

    /// Header row for tabular layouts.
    pub fn header(&self) -> Node {
        let mut row = Element::new("tr").child(Element::new("th").with_text("#"));
        for field in &self.fields {
            let label = field.label.clone().unwrap_or_else(|| field.key.to_string());
            row = row.child(Element::new("th").with_text(label));
        }
        row.child(Element::new("th")).into()
    }
}
