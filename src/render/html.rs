//! Minimal typed HTML tree.
//!
//! Text and attribute values are escaped when the tree is serialized. The only
//! way to emit unescaped markup is [`Node::markup`], which takes a
//! `&'static str`, so backend data can never reach the page unescaped.

use std::fmt::Write as _;

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Fragment(Vec<Node>),
    Markup(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

pub fn el(tag: &'static str) -> Element {
    Element {
        tag,
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}

pub fn fragment(nodes: impl IntoIterator<Item = Node>) -> Node {
    Node::Fragment(nodes.into_iter().collect())
}

impl Element {
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn attr_if(self, cond: bool, name: &'static str, value: impl Into<String>) -> Self {
        if cond {
            self.attr(name, value)
        } else {
            self
        }
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn id(self, value: impl Into<String>) -> Self {
        self.attr("id", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn child_opt(self, node: Option<impl Into<Node>>) -> Self {
        match node {
            Some(node) => self.child(node),
            None => self,
        }
    }

    pub fn children<N: Into<Node>>(mut self, nodes: impl IntoIterator<Item = N>) -> Self {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::Text(value.into()))
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Node {
    pub fn markup(value: &'static str) -> Self {
        Node::Markup(value)
    }

    pub fn empty() -> Self {
        Node::Fragment(Vec::new())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Node::Text(value) => escape_into(value, out),
            Node::Markup(value) => out.push_str(value),
            Node::Fragment(nodes) => nodes.iter().for_each(|n| n.write_to(out)),
            Node::Element(element) => {
                out.push('<');
                out.push_str(element.tag);
                for (name, value) in &element.attrs {
                    let _ = write!(out, " {name}=\"");
                    escape_into(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&element.tag) {
                    return;
                }
                for child in &element.children {
                    child.write_to(out);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
        }
    }

    /// Concatenated text content, unescaped.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(value) => out.push_str(value),
            Node::Markup(_) => {}
            Node::Fragment(nodes) => nodes.iter().for_each(|n| n.collect_text(out)),
            Node::Element(element) => element.children.iter().for_each(|n| n.collect_text(out)),
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Fragment(value)
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_into(value, &mut out);
    out
}

fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_attributes_are_escaped() {
        let node: Node = el("div")
            .attr("title", "a \"quoted\" 'value'")
            .text("<script>alert(1)</script> & more")
            .into();
        assert_eq!(
            node.render(),
            "<div title=\"a &quot;quoted&quot; &#39;value&#39;\">&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</div>"
        );
    }

    #[test]
    fn markup_is_emitted_verbatim() {
        let node: Node = el("span").child(Node::markup("&#9654;")).into();
        assert_eq!(node.render(), "<span>&#9654;</span>");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node: Node = el("input").attr("type", "text").into();
        assert_eq!(node.render(), "<input type=\"text\">");
    }

    #[test]
    fn text_content_skips_markup() {
        let node: Node = el("p")
            .child(Node::markup("<b>"))
            .text("a<b")
            .child(el("i").text("c"))
            .into();
        assert_eq!(node.text_content(), "a<bc");
    }
}
