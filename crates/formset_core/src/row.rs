//! Rows and their compiled markup.
//!
//! A row's markup is kept as a [`RowNode`] tree: plain attributes and text are
//! stored as-is, identifier attributes as [`FieldIdent`]s, and the serial
//! display and remove control are tagged so the controller can project them
//! from the row's current index and protection state.

use shared::{
    domain::{FieldKey, IdentRole, Prefix, RowHandle, RowIndex, RowState},
    error::MarkupError,
};

use crate::{
    config::ControlClasses,
    ident::{parse_ident, FieldIdent, IndexSlot},
    markup::{Attr, Element, Node},
};

/// Element that the controller fills in or hides on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Serial,
    RemoveControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAttr {
    Plain(Attr),
    Ident(FieldIdent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowElement {
    pub tag: String,
    pub attrs: Vec<RowAttr>,
    pub children: Vec<RowNode>,
    pub slot: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowNode {
    Element(RowElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMarkup {
    root: RowNode,
}

/// Whether a row stands for an object that already exists on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// Counted in `INITIAL_FORMS`.
    Initial,
    /// A new row, whether rendered blank by the server or added by the user.
    Extra,
}

struct Compiler<'a> {
    prefix: &'a Prefix,
    classes: &'a ControlClasses,
    slot: IndexSlot<'a>,
    substitution: Option<(&'a str, String)>,
    seen: Option<RowIndex>,
    conflict: Option<(RowIndex, RowIndex)>,
}

impl Compiler<'_> {
    fn node(&mut self, node: &Node) -> RowNode {
        match node {
            Node::Text { text } => RowNode::Text(self.substitute(text)),
            Node::Element(element) => RowNode::Element(self.element(element)),
        }
    }

    fn element(&mut self, element: &Element) -> RowElement {
        let slot = if element.has_class(&self.classes.serial) {
            Some(Slot::Serial)
        } else if element.has_class(&self.classes.remove) {
            Some(Slot::RemoveControl)
        } else {
            None
        };

        let attrs = element.attrs.iter().map(|attr| self.attr(attr)).collect();
        // Serial displays are rewritten on every refresh; their content is not kept.
        let children = match slot {
            Some(Slot::Serial) => Vec::new(),
            _ => element.children.iter().map(|child| self.node(child)).collect(),
        };

        RowElement {
            tag: element.tag.clone(),
            attrs,
            children,
            slot,
        }
    }

    fn attr(&mut self, attr: &Attr) -> RowAttr {
        let parsed = IdentRole::from_attr_name(&attr.name)
            .and_then(|role| parse_ident(role, self.prefix, &attr.value, self.slot));

        match parsed {
            Some(parsed) => {
                if let Some(index) = parsed.index {
                    self.record(index);
                }
                let mut ident = parsed.ident;
                // The key is frozen at instantiation, so placeholders nested
                // after the slot (inner formsets) are resolved here.
                if self.substitution.is_some() {
                    ident.key = ident
                        .key
                        .map(|key| FieldKey::new(self.substitute(key.as_str())));
                }
                RowAttr::Ident(ident)
            }
            None => RowAttr::Plain(Attr {
                name: attr.name.clone(),
                value: self.substitute(&attr.value),
            }),
        }
    }

    fn record(&mut self, index: RowIndex) {
        match self.seen {
            None => self.seen = Some(index),
            Some(first) if first != index && self.conflict.is_none() => {
                self.conflict = Some((first, index));
            }
            Some(_) => {}
        }
    }

    fn substitute(&self, value: &str) -> String {
        match &self.substitution {
            Some((token, replacement)) => value.replace(token, replacement),
            None => value.to_string(),
        }
    }
}

impl RowMarkup {
    /// Stamps a fresh row out of `template`, replacing every occurrence of
    /// `placeholder` with `index`.
    pub fn instantiate(
        template: &Node,
        prefix: &Prefix,
        classes: &ControlClasses,
        placeholder: &str,
        index: RowIndex,
    ) -> Self {
        let mut compiler = Compiler {
            prefix,
            classes,
            slot: IndexSlot::Placeholder(placeholder),
            substitution: Some((placeholder, index.to_string())),
            seen: None,
            conflict: None,
        };
        Self {
            root: compiler.node(template),
        }
    }

    /// Takes over a server-rendered row, recovering its index from the
    /// identifiers it carries.
    pub fn adopt(
        node: &Node,
        prefix: &Prefix,
        classes: &ControlClasses,
        position: usize,
    ) -> Result<(Self, RowIndex), MarkupError> {
        let mut compiler = Compiler {
            prefix,
            classes,
            slot: IndexSlot::Integer,
            substitution: None,
            seen: None,
            conflict: None,
        };
        let root = compiler.node(node);

        if let Some((first, second)) = compiler.conflict {
            return Err(MarkupError::MixedRowIndices {
                position,
                first,
                second,
            });
        }
        let index = compiler.seen.ok_or_else(|| MarkupError::RowWithoutIdentifier {
            prefix: prefix.clone(),
            position,
        })?;

        Ok((Self { root }, index))
    }

    /// Concrete markup for the row at `index`.
    pub fn project(&self, prefix: &Prefix, index: RowIndex, removable: bool) -> Option<Node> {
        project_node(&self.root, prefix, index, removable)
    }

    /// Submitted `name -> value` pairs of the row's fields at `index`.
    pub fn fields(&self, prefix: &Prefix, index: RowIndex) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_fields(&self.root, prefix, index, &mut out);
        out
    }

    /// Sets the `value` attribute of the field named by `key`. Returns false
    /// when the row has no such field.
    pub fn set_value(&mut self, key: &FieldKey, value: &str) -> bool {
        set_field_value(&mut self.root, key, value)
    }

    pub fn has_slot(&self, slot: Slot) -> bool {
        node_has_slot(&self.root, slot)
    }
}

fn project_node(node: &RowNode, prefix: &Prefix, index: RowIndex, removable: bool) -> Option<Node> {
    let element = match node {
        RowNode::Text(text) => return Some(Node::text(text.clone())),
        RowNode::Element(element) => element,
    };

    if element.slot == Some(Slot::RemoveControl) && !removable {
        return None;
    }

    let attrs = element
        .attrs
        .iter()
        .map(|attr| match attr {
            RowAttr::Plain(attr) => attr.clone(),
            RowAttr::Ident(ident) => Attr {
                name: ident.role.attr_name().to_string(),
                value: ident.render(prefix, index),
            },
        })
        .collect();

    let children = match element.slot {
        Some(Slot::Serial) => vec![Node::text(index.serial().to_string())],
        _ => element
            .children
            .iter()
            .filter_map(|child| project_node(child, prefix, index, removable))
            .collect(),
    };

    Some(Node::Element(Element {
        tag: element.tag.clone(),
        attrs,
        children,
    }))
}

fn field_key(element: &RowElement) -> Option<&FieldKey> {
    element.attrs.iter().find_map(|attr| match attr {
        RowAttr::Ident(FieldIdent {
            role: IdentRole::Name,
            key: Some(key),
            ..
        }) => Some(key),
        _ => None,
    })
}

fn plain_value(element: &RowElement, name: &str) -> Option<String> {
    element.attrs.iter().find_map(|attr| match attr {
        RowAttr::Plain(attr) if attr.name == name => Some(attr.value.clone()),
        _ => None,
    })
}

fn collect_fields(
    node: &RowNode,
    prefix: &Prefix,
    index: RowIndex,
    out: &mut Vec<(String, String)>,
) {
    let RowNode::Element(element) = node else {
        return;
    };
    if let Some(key) = field_key(element) {
        let name = FieldIdent::field(IdentRole::Name, key.clone()).render(prefix, index);
        out.push((name, plain_value(element, "value").unwrap_or_default()));
    }
    for child in &element.children {
        collect_fields(child, prefix, index, out);
    }
}

fn set_field_value(node: &mut RowNode, key: &FieldKey, value: &str) -> bool {
    let RowNode::Element(element) = node else {
        return false;
    };
    if field_key(element) == Some(key) {
        let existing = element.attrs.iter_mut().find_map(|attr| match attr {
            RowAttr::Plain(attr) if attr.name == "value" => Some(attr),
            _ => None,
        });
        match existing {
            Some(attr) => attr.value = value.to_string(),
            None => element.attrs.push(RowAttr::Plain(Attr {
                name: "value".into(),
                value: value.to_string(),
            })),
        }
        return true;
    }
    element
        .children
        .iter_mut()
        .any(|child| set_field_value(child, key, value))
}

fn node_has_slot(node: &RowNode, slot: Slot) -> bool {
    match node {
        RowNode::Text(_) => false,
        RowNode::Element(element) => {
            element.slot == Some(slot)
                || element.children.iter().any(|child| node_has_slot(child, slot))
        }
    }
}

/// One mounted sub-form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    handle: RowHandle,
    index: RowIndex,
    state: RowState,
    origin: RowOrigin,
    markup: RowMarkup,
}

impl Row {
    pub(crate) fn new(
        handle: RowHandle,
        index: RowIndex,
        origin: RowOrigin,
        markup: RowMarkup,
    ) -> Self {
        Self {
            handle,
            index,
            state: RowState::Instantiated,
            origin,
            markup,
        }
    }

    pub fn handle(&self) -> RowHandle {
        self.handle
    }

    pub fn index(&self) -> RowIndex {
        self.index
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn origin(&self) -> RowOrigin {
        self.origin
    }

    pub fn markup(&self) -> &RowMarkup {
        &self.markup
    }

    pub(crate) fn markup_mut(&mut self) -> &mut RowMarkup {
        &mut self.markup
    }

    /// Moves the row to `index`. Returns true if the index changed.
    pub(crate) fn reindex(&mut self, index: RowIndex) -> bool {
        let changed = self.index != index;
        self.index = index;
        changed
    }

    pub(crate) fn set_state(&mut self, state: RowState) {
        self.state = state;
    }

    pub fn project(&self, prefix: &Prefix, removable: bool) -> Option<Node> {
        self.markup.project(prefix, self.index, removable)
    }

    pub fn fields(&self, prefix: &Prefix) -> Vec<(String, String)> {
        self.markup.fields(prefix, self.index)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn template() -> Node {
        Element::new("div")
            .attr("class", "formset-row")
            .attr("id", "item-__prefix__")
            .child(Element::new("span").attr("class", "formset-serial").with_text("#"))
            .child(
                Element::new("label")
                    .attr("for", "id_item-__prefix__-qty")
                    .with_text("Quantity"),
            )
            .child(
                Element::new("input")
                    .attr("name", "item-__prefix__-qty")
                    .attr("id", "id_item-__prefix__-qty")
                    .attr("data-row", "__prefix__"),
            )
            .child(
                Element::new("button")
                    .attr("class", "formset-remove")
                    .with_text("Remove __prefix__"),
            )
            .into()
    }

    fn attr_values(node: &Node, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        node.for_each_element(&mut |element| {
            if let Some(value) = element.get_attr(name) {
                out.push(value.to_string());
            }
        });
        out
    }

    #[test]
    fn instantiate_substitutes_every_placeholder() {
        let prefix = Prefix::new("item");
        let markup = RowMarkup::instantiate(
            &template(),
            &prefix,
            &ControlClasses::default(),
            "__prefix__",
            RowIndex(3),
        );
        let node = markup.project(&prefix, RowIndex(3), true).expect("projected");

        assert!(!node.contains("__prefix__"));
        assert_eq!(attr_values(&node, "name"), vec!["item-3-qty"]);
        assert_eq!(attr_values(&node, "id"), vec!["item-3", "id_item-3-qty"]);
        assert_eq!(attr_values(&node, "for"), vec!["id_item-3-qty"]);
        assert_eq!(attr_values(&node, "data-row"), vec!["3"]);
        assert!(node.text_content().contains("Remove 3"));
        assert!(node.text_content().starts_with('4'));
    }

    #[test]
    fn instantiate_substitutes_placeholder_inside_field_key() {
        let prefix = Prefix::new("item");
        let template: Node = Element::new("div")
            .child(
                Element::new("input")
                    .attr("name", "item-__prefix__-sub-__prefix__-x")
                    .attr("id", "id_item-__prefix__-sub-__prefix__-x"),
            )
            .into();
        let markup = RowMarkup::instantiate(
            &template,
            &prefix,
            &ControlClasses::default(),
            "__prefix__",
            RowIndex(3),
        );
        let node = markup.project(&prefix, RowIndex(3), true).expect("projected");

        assert!(!node.contains("__prefix__"));
        assert_eq!(attr_values(&node, "name"), vec!["item-3-sub-3-x"]);
        assert_eq!(attr_values(&node, "id"), vec!["id_item-3-sub-3-x"]);

        // Only the outer slot follows renumbering; the inner index stays frozen.
        let moved = markup.project(&prefix, RowIndex(1), true).expect("projected");
        assert_eq!(attr_values(&moved, "name"), vec!["item-1-sub-3-x"]);
    }

    #[test]
    fn identifiers_follow_reprojection_at_new_index() {
        let prefix = Prefix::new("item");
        let markup = RowMarkup::instantiate(
            &template(),
            &prefix,
            &ControlClasses::default(),
            "__prefix__",
            RowIndex(3),
        );
        let node = markup.project(&prefix, RowIndex(1), true).expect("projected");
        assert_eq!(attr_values(&node, "name"), vec!["item-1-qty"]);
        assert_eq!(attr_values(&node, "for"), vec!["id_item-1-qty"]);
    }

    #[test]
    fn protected_projection_drops_remove_control() {
        let prefix = Prefix::new("item");
        let markup = RowMarkup::instantiate(
            &template(),
            &prefix,
            &ControlClasses::default(),
            "__prefix__",
            RowIndex(0),
        );
        assert!(markup.has_slot(Slot::RemoveControl));
        let node = markup.project(&prefix, RowIndex(0), false).expect("projected");
        let mut buttons = 0;
        node.for_each_element(&mut |element| {
            if element.tag == "button" {
                buttons += 1;
            }
        });
        assert_eq!(buttons, 0);
    }

    #[test]
    fn adopt_recovers_index_from_server_markup() {
        let prefix = Prefix::new("item");
        let node: Node = Element::new("div")
            .child(Element::new("input").attr("name", "item-2-qty").attr("value", "5"))
            .into();
        let (markup, index) =
            RowMarkup::adopt(&node, &prefix, &ControlClasses::default(), 0).expect("adopted");
        assert_eq!(index, RowIndex(2));
        assert_eq!(
            markup.fields(&prefix, RowIndex(0)),
            vec![("item-0-qty".to_string(), "5".to_string())]
        );
    }

    #[test]
    fn adopt_rejects_mixed_indices() {
        let prefix = Prefix::new("item");
        let node: Node = Element::new("div")
            .child(Element::new("input").attr("name", "item-2-qty"))
            .child(Element::new("input").attr("name", "item-4-price"))
            .into();
        let err = RowMarkup::adopt(&node, &prefix, &ControlClasses::default(), 1)
            .expect_err("mixed indices");
        assert_eq!(
            err,
            MarkupError::MixedRowIndices {
                position: 1,
                first: RowIndex(2),
                second: RowIndex(4)
            }
        );
    }

    #[test]
    fn adopt_rejects_rows_without_identifiers() {
        let prefix = Prefix::new("item");
        let node: Node = Element::new("div").with_text("empty").into();
        assert!(matches!(
            RowMarkup::adopt(&node, &prefix, &ControlClasses::default(), 0),
            Err(MarkupError::RowWithoutIdentifier { position: 0, .. })
        ));
    }

    #[test]
    fn set_value_adds_or_replaces_value_attribute() {
        let prefix = Prefix::new("item");
        let mut markup = RowMarkup::instantiate(
            &template(),
            &prefix,
            &ControlClasses::default(),
            "__prefix__",
            RowIndex(0),
        );
        let key = FieldKey::new("qty");
        assert!(markup.set_value(&key, "2"));
        assert!(markup.set_value(&key, "7"));
        assert!(!markup.set_value(&FieldKey::new("missing"), "1"));
        assert_eq!(
            markup.fields(&prefix, RowIndex(0)),
            vec![("item-0-qty".to_string(), "7".to_string())]
        );
    }
}
