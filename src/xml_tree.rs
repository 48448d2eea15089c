//! Element-tree adapter
//!
//! The converter walks a `roxmltree` document; this module adds the small
//! accessors it needs everywhere: trimmed text values, typed attribute
//! lookups, and 1-based line numbers for diagnostics.

use roxmltree::Node;

/// Convenience accessors on tree nodes.
pub trait ElementExt {
    /// Local tag name.
    fn name(&self) -> &str;
    /// Trimmed text content, empty string if none.
    fn value(&self) -> String;
    /// Text content parsed as an integer, if it parses.
    fn int_value(&self) -> Option<i32>;
    /// Text content parsed as a float, if it parses.
    fn float_value(&self) -> Option<f32>;
    /// Attribute value by name.
    fn attr(&self, name: &str) -> Option<&str>;
    /// Attribute parsed as an integer, if present and parseable.
    fn int_attr(&self, name: &str) -> Option<i32>;
    /// Attribute parsed as a float, if present and parseable.
    fn float_attr(&self, name: &str) -> Option<f32>;
    /// 1-based line of the element's start tag in the source text.
    fn line(&self) -> usize;
}

impl<'a, 'input> ElementExt for Node<'a, 'input> {
    fn name(&self) -> &str {
        self.tag_name().name()
    }

    fn value(&self) -> String {
        self.text().unwrap_or("").trim().to_string()
    }

    fn int_value(&self) -> Option<i32> {
        self.value().parse().ok()
    }

    fn float_value(&self) -> Option<f32> {
        self.value().parse().ok()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attribute(name)
    }

    fn int_attr(&self, name: &str) -> Option<i32> {
        self.attribute(name).and_then(|v| v.trim().parse().ok())
    }

    fn float_attr(&self, name: &str) -> Option<f32> {
        self.attribute(name).and_then(|v| v.trim().parse().ok())
    }

    fn line(&self) -> usize {
        self.document().text_pos_at(self.range().start).row as usize
    }
}
