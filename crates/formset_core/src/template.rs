//! The shared empty-row fragment new rows are stamped from.

use shared::{
    domain::{Prefix, RowIndex},
    error::MarkupError,
};

use crate::{config::ControlClasses, markup::Node, row::RowMarkup};

/// Read-only source markup holding the placeholder token in place of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: Node,
    prefix: Prefix,
    placeholder: String,
    classes: ControlClasses,
}

impl Template {
    pub fn new(
        source: Node,
        prefix: Prefix,
        placeholder: impl Into<String>,
        classes: ControlClasses,
    ) -> Result<Self, MarkupError> {
        let placeholder = placeholder.into();
        if !source.contains(&placeholder) {
            return Err(MarkupError::TemplateMissingPlaceholder {
                prefix,
                placeholder,
            });
        }
        Ok(Self {
            source,
            prefix,
            placeholder,
            classes,
        })
    }

    pub fn source(&self) -> &Node {
        &self.source
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Independent copy of the template with every placeholder bound to `index`.
    pub fn instantiate(&self, index: RowIndex) -> RowMarkup {
        RowMarkup::instantiate(
            &self.source,
            &self.prefix,
            &self.classes,
            &self.placeholder,
            index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Element;

    #[test]
    fn rejects_template_without_placeholder() {
        let source: Node = Element::new("div")
            .child(Element::new("input").attr("name", "item-0-qty"))
            .into();
        let err = Template::new(
            source,
            Prefix::new("item"),
            "__prefix__",
            ControlClasses::default(),
        )
        .expect_err("missing placeholder");
        assert!(matches!(err, MarkupError::TemplateMissingPlaceholder { .. }));
    }

    #[test]
    fn instantiation_leaves_source_untouched() {
        let source: Node = Element::new("div")
            .child(Element::new("input").attr("name", "item-__prefix__-qty"))
            .into();
        let template = Template::new(
            source.clone(),
            Prefix::new("item"),
            "__prefix__",
            ControlClasses::default(),
        )
        .expect("template");

        let first = template.instantiate(RowIndex(0));
        let second = template.instantiate(RowIndex(1));

        assert_eq!(template.source(), &source);
        assert_ne!(
            first.fields(&Prefix::new("item"), RowIndex(0)),
            second.fields(&Prefix::new("item"), RowIndex(1))
        );
    }
}
