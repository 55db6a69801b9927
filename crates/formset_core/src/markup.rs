//! Minimal element tree standing in for the container's DOM subtree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Element(Element),
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text { .. } => None,
        }
    }

    /// True if `needle` occurs in any attribute value or text node of the subtree.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Node::Text { text } => text.contains(needle),
            Node::Element(element) => {
                element.attrs.iter().any(|attr| attr.value.contains(needle))
                    || element.children.iter().any(|child| child.contains(needle))
            }
        }
    }

    /// Depth-first visit of every element in the subtree, including `self`.
    pub fn for_each_element<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        if let Node::Element(element) = self {
            visit(element);
            for child in &element.children {
                child.for_each_element(visit);
            }
        }
    }

    /// Concatenated text content of the subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text } => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.child(Node::text(text))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr { name, value }),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Element::new("div")
            .attr("class", "formset-row highlighted")
            .child(
                Element::new("input")
                    .attr("name", "form-__prefix__-city")
                    .attr("value", ""),
            )
            .child(Element::new("span").with_text("row __prefix__"))
            .into()
    }

    #[test]
    fn class_lookup_splits_on_whitespace() {
        let node = sample();
        let element = node.as_element().expect("element");
        assert!(element.has_class("formset-row"));
        assert!(element.has_class("highlighted"));
        assert!(!element.has_class("formset"));
    }

    #[test]
    fn contains_searches_attributes_and_text() {
        let node = sample();
        assert!(node.contains("__prefix__"));
        assert!(node.contains("row "));
        assert!(!node.contains("absent"));
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut element = Element::new("input").attr("name", "a").attr("value", "1");
        element.set_attr("name", "b");
        assert_eq!(element.attrs[0].name, "name");
        assert_eq!(element.get_attr("name"), Some("b"));
        element.set_attr("hidden", "");
        assert_eq!(element.attrs.len(), 3);
        assert_eq!(element.get_attr("value"), Some("1"));
    }

    #[test]
    fn deserializes_tagged_nodes_from_json() {
        let node: Node = serde_json::from_str(
            r#"{"kind":"element","tag":"label","attrs":[{"name":"for","value":"id_x-0-y"}],
                "children":[{"kind":"text","text":"Y"}]}"#,
        )
        .expect("parse node");
        let element = node.as_element().expect("element");
        assert_eq!(element.get_attr("for"), Some("id_x-0-y"));
        assert_eq!(node.text_content(), "Y");
    }
}
