use crate::parser::NodeRef;
use html5ever::{LocalName, QualName};
use kuchikikiki::{Attributes, ElementData, NodeData};
use std::cell::RefCell;

/// DOM-navigation and element-manipulation helpers implemented on [`NodeRef`].
///
/// This trait is automatically in scope when you import from
/// [`crate::parser`].
pub trait NodeExt {
    /// Return the local tag name of this node if it is an element (e.g.
    /// `"div"`, `"span"`), or `None` for text / comment / document nodes.
    fn element_name(&self) -> Option<&str>;

    /// Look up an attribute by name and return its value, or `None` if the
    /// attribute is absent or this is not an element node.
    fn attr_value(&self, name: &str) -> Option<String>;

    /// Return `true` if the element's `class` attribute lists `class_name`.
    fn has_class(&self, class_name: &str) -> bool;

    /// Collect the direct *element* children (skipping text and comment nodes)
    /// into a `Vec`.
    fn element_children(&self) -> Vec<NodeRef>;

    /// Serialise the *children* of this node to an HTML string (the node's
    /// own open/close tags are **not** included).
    fn inner_html(&self) -> String;

    /// Splice this node's children into its parent in its place, then
    /// detach the node itself.
    fn unwrap_element(&self);

    /// Insert `replacements` (in order) where this node is and detach it.
    fn replace_with(&self, replacements: Vec<NodeRef>);

    /// Create an element named `tag_name`, move this node's children into
    /// it, splice it into the tree in this node's position and detach
    /// `self`.  Attributes are not carried over.  Returns the new node, or
    /// `None` (leaving the tree untouched) if `self` is not an element.
    fn rename_element(&self, tag_name: &str) -> Option<NodeRef>;
}

/// Create a new, detached HTML element node with the given tag name and no
/// attributes or children.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::parser::{new_html_element, NodeExt};
///
/// let b = new_html_element("b");
/// assert_eq!(b.element_name(), Some("b"));
/// assert!(b.parent().is_none());
/// ```
pub fn new_html_element(tag_name: &str) -> NodeRef {
    let name = QualName::new(None, html5ever::ns!(html), LocalName::from(tag_name));
    let attributes = Attributes {
        map: Default::default(),
    };
    NodeRef::new(NodeData::Element(ElementData {
        name,
        attributes: RefCell::new(attributes),
        template_contents: None,
    }))
}

/// Like [`new_html_element`], with a single text child.
pub fn new_element_with_text(tag_name: &str, text: &str) -> NodeRef {
    let node = new_html_element(tag_name);
    node.append(NodeRef::new_text(text));
    node
}

impl NodeExt for NodeRef {
    fn element_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.name.local.as_ref())
    }

    fn attr_value(&self, name: &str) -> Option<String> {
        self.as_element()
            .and_then(|e| e.attributes.borrow().get(name).map(|v| v.to_string()))
    }

    fn has_class(&self, class_name: &str) -> bool {
        self.attr_value("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }

    fn element_children(&self) -> Vec<NodeRef> {
        self.children()
            .filter(|c| c.as_element().is_some())
            .collect()
    }

    fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            out.push_str(&child.to_string());
        }
        out
    }

    fn unwrap_element(&self) {
        while let Some(child) = self.first_child() {
            self.insert_before(child);
        }
        self.detach();
    }

    fn replace_with(&self, replacements: Vec<NodeRef>) {
        for node in replacements {
            self.insert_before(node);
        }
        self.detach();
    }

    fn rename_element(&self, tag_name: &str) -> Option<NodeRef> {
        self.as_element()?;
        let new_node = new_html_element(tag_name);
        while let Some(child) = self.first_child() {
            new_node.append(child);
        }
        self.insert_before(new_node.clone());
        self.detach();
        Some(new_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;

    #[test]
    fn rename_element_non_element_is_a_no_op() {
        let doc = parse_html("<div>text</div>");
        let div = doc.select_first("div").unwrap();
        let text_node = div.as_node().first_child().unwrap();
        assert!(text_node.rename_element("b").is_none());
        assert_eq!(div.as_node().text_contents(), "text");
    }

    #[test]
    fn rename_element_moves_children_and_drops_attributes() {
        let doc = parse_html(r#"<div><span class="post-b" style="x">a<i>b</i></span></div>"#);
        let span = doc.select_first("span").unwrap().as_node().clone();
        let b = span.rename_element("b").unwrap();
        assert_eq!(b.element_name(), Some("b"));
        assert_eq!(b.attr_value("class"), None);
        assert_eq!(b.inner_html(), "a<i>b</i>");
        assert!(doc.select_first("span").is_err());
    }

    #[test]
    fn unwrap_element_keeps_children_in_place() {
        let doc = parse_html("<div>1<span>2<b>3</b></span>4</div>");
        let span = doc.select_first("span").unwrap().as_node().clone();
        span.unwrap_element();
        let div = doc.select_first("div").unwrap();
        assert_eq!(div.as_node().inner_html(), "12<b>3</b>4");
    }

    #[test]
    fn has_class_matches_whole_tokens_only() {
        let doc = parse_html(r#"<div class="sp-wrap extra"></div>"#);
        let div = doc.select_first("div").unwrap().as_node().clone();
        assert!(div.has_class("sp-wrap"));
        assert!(div.has_class("extra"));
        assert!(!div.has_class("sp"));
    }

    #[test]
    fn custom_elements_are_built_without_parsing() {
        let node = new_element_with_text("tg-spoiler", "hidden");
        assert_eq!(node.element_name(), Some("tg-spoiler"));
        assert_eq!(node.to_string(), "<tg-spoiler>hidden</tg-spoiler>");
    }
}
