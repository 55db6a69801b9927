//! HTML serialization of the controller's projected state.

use shared::protocol::ManagementField;

use crate::{
    markup::{Element, Node},
    FormsetController,
};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Lay rows out as table rows instead of stacked blocks.
    pub tabular: bool,
    /// Label of the add control; defaults to "Add another".
    pub add_button_text: Option<String>,
    /// Header row placed above tabular rows.
    pub header: Option<Node>,
}

pub fn render_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

/// Renders the whole container: management form, rows, template and add control.
pub fn render_container(controller: &FormsetController, options: &RenderOptions) -> String {
    let prefix = controller.prefix();
    let classes = &controller.config().classes;
    let management = controller.management_form();

    let mut container = Element::new("div")
        .attr("class", "formset")
        .attr("data-formset-prefix", prefix.as_str());

    for field in ManagementField::ALL {
        container = container.child(
            Element::new("input")
                .attr("type", "hidden")
                .attr("name", field.field_name(prefix))
                .attr("id", field.element_id(prefix))
                .attr("value", management.value(field).to_string()),
        );
    }

    let rows = controller.project_rows();
    let row_list = if options.tabular {
        let mut table = Element::new("table").attr("class", "formset-rows");
        if let Some(header) = &options.header {
            table = table.child(Element::new("thead").child(header.clone()));
        }
        let mut body = Element::new("tbody");
        body.children = rows;
        table.child(body)
    } else {
        let mut list = Element::new("div").attr("class", "formset-rows");
        list.children = rows;
        list
    };
    container = container.child(row_list);

    container = container.child(
        Element::new("template")
            .attr("class", "formset-template")
            .child(controller.template().source().clone()),
    );

    let text = options
        .add_button_text
        .clone()
        .unwrap_or_else(|| "Add another".to_string());
    let mut add = Element::new("button")
        .attr("type", "button")
        .attr("class", &classes.add)
        .with_text(text);
    if !controller.affordances().add_visible {
        add.set_attr("hidden", "");
    }

    render_node(&container.child(add).into())
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text { text } => escape_into(out, text, false),
        Node::Element(element) => write_element(out, element),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag);
    for attr in &element.attrs {
        if attr.value.is_empty() && attr.name == "hidden" {
            out.push(' ');
            out.push_str(&attr.name);
            continue;
        }
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_into(out, &attr.value, true);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
        return;
    }
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
