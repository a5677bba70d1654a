//! HTML subset reader and writer for [`Document`].
//!
//! The reader is lenient in the way editor content needs: unknown closing
//! tags are ignored, unclosed elements are closed at the end of input, and
//! comments and doctype-like declarations are dropped.

use std::fmt::{self, Write as _};

use htmlize::unescape;
use markdown_weaver_escape::{FmtWriter, escape_html, escape_html_body_text};
use smol_str::SmolStr;

use crate::document::{Document, ElementData, NodeData, is_void_element};
use crate::types::NodeId;

impl Document {
    /// Parse an HTML fragment into a fresh document.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        parse_into(&mut doc, root, html);
        doc
    }

    /// Parse an HTML fragment into detached nodes owned by this document.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let container = self.create_element("div");
        parse_into(self, container, html);
        let nodes = self.children(container).to_vec();
        for &node in &nodes {
            // Children of a fresh container always detach cleanly.
            let _ = self.detach(node);
        }
        nodes
    }

    /// Serialized content of the root container.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            // Writing into a String cannot fail.
            let _ = self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let _ = self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) -> fmt::Result {
        match self.data(id) {
            Some(NodeData::Text(text)) => escape_html_body_text(FmtWriter(&mut *out), text),
            Some(NodeData::Element(el)) => {
                write!(out, "<{}", el.tag)?;
                for (name, value) in &el.attrs {
                    write!(out, " {}=\"", name)?;
                    escape_html(FmtWriter(&mut *out), value)?;
                    out.push('"');
                }
                out.push('>');
                if el.is_void() {
                    return Ok(());
                }
                for &child in self.children(id) {
                    self.write_node(child, out)?;
                }
                write!(out, "</{}>", el.tag)
            }
            None => Ok(()),
        }
    }
}

/// Escape plain text for use as element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html_body_text(FmtWriter(&mut out), text);
    out
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let _ = escape_html(FmtWriter(&mut out), value);
    out
}

/// Parse `html` and append the resulting nodes to `parent`.
pub fn parse_into(doc: &mut Document, parent: NodeId, html: &str) {
    let mut reader = Reader {
        src: html,
        pos: 0,
        stack: vec![parent],
    };
    reader.run(doc);
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    stack: Vec<NodeId>,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn top(&self) -> NodeId {
        // The stack never pops below the parent passed to `parse_into`.
        self.stack[self.stack.len() - 1]
    }

    fn run(&mut self, doc: &mut Document) {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if let Some(after) = rest.strip_prefix("<!--") {
                self.pos += 4 + after.find("-->").map(|i| i + 3).unwrap_or(after.len());
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            } else if rest.starts_with("</") {
                self.close_tag(doc);
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.open_tag(doc);
            } else {
                self.text(doc);
            }
        }
    }

    fn text(&mut self, doc: &mut Document) {
        let rest = self.rest();
        // A '<' that does not start markup is plain text.
        let skip = if rest.starts_with('<') { 1 } else { 0 };
        let len = rest[skip..]
            .find('<')
            .map(|i| i + skip)
            .unwrap_or(rest.len());
        let raw = &rest[..len];
        self.pos += len;

        let decoded = unescape(raw);
        let parent = self.top();
        let previous_text = doc
            .last_child(parent)
            .and_then(|prev| doc.text(prev).map(|t| (prev, t)));
        if let Some((prev, existing)) = previous_text {
            let merged = format!("{existing}{decoded}");
            let _ = doc.set_text(prev, merged);
            return;
        }
        let node = doc.create_text(decoded.into_owned());
        let _ = doc.append_child(parent, node);
    }

    fn close_tag(&mut self, doc: &mut Document) {
        let rest = self.rest();
        let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
        let name = rest[2..end]
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        self.pos += end;

        if let Some(depth) = self
            .stack
            .iter()
            .rposition(|&id| doc.element(id).is_some_and(|el| el.is(&name)))
        {
            // Never pop the container we were asked to fill.
            if depth > 0 {
                self.stack.truncate(depth);
            }
        }
    }

    fn open_tag(&mut self, doc: &mut Document) {
        let rest = self.rest();
        let name_len = rest[1..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len() - 1);
        let tag: SmolStr = rest[1..1 + name_len].to_ascii_lowercase().into();
        self.pos += 1 + name_len;

        let mut element = ElementData::new(tag);
        let mut self_closing = false;
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                break;
            }
            if let Some(after) = trimmed.strip_prefix("/>") {
                self.pos = self.src.len() - after.len();
                self_closing = true;
                break;
            }
            if trimmed.starts_with('>') {
                self.pos += 1;
                break;
            }
            if trimmed.starts_with('/') {
                self.pos += 1;
                continue;
            }
            if let Some((name, value)) = self.attribute() {
                element.attrs.push((name, value));
            }
        }

        let void = is_void_element(&element.tag);
        let node = doc.create_element_with(element);
        let _ = doc.append_child(self.top(), node);
        if !void && !self_closing {
            self.stack.push(node);
        }
    }

    fn attribute(&mut self) -> Option<(SmolStr, String)> {
        let rest = self.rest();
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        if name_len == 0 {
            // Stray '=' or similar; skip one char so the tag loop advances.
            let skip = rest.chars().next().map(char::len_utf8).unwrap_or(0);
            self.pos += skip;
            return None;
        }
        let name: SmolStr = rest[..name_len].to_ascii_lowercase().into();
        self.pos += name_len;

        let rest = self.rest();
        let trimmed = rest.trim_start();
        let Some(after_eq) = trimmed.strip_prefix('=') else {
            return Some((name, String::new()));
        };
        let value_src = after_eq.trim_start();
        self.pos = self.src.len() - value_src.len();

        let raw = match value_src.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &value_src[1..];
                let len = body.find(quote).unwrap_or(body.len());
                self.pos += 1 + len + usize::from(len < body.len());
                &body[..len]
            }
            _ => {
                let len = value_src
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(value_src.len());
                self.pos += len;
                &value_src[..len]
            }
        };
        Some((name, unescape(raw).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_round_trips_through_parser() {
        let escaped = escape_text("<3 & co");
        assert!(!escaped.contains('<'));
        let doc = Document::from_html(&escaped);
        assert_eq!(doc.text_content(doc.root()), "<3 & co");
        assert!(!escape_attr(r#"a "b""#).contains('"'));
    }

    #[test]
    fn test_parse_and_serialize() {
        let html = r#"<p>hello <span contenteditable="false" class="tag">@John Doe</span> there</p>"#;
        let doc = Document::from_html(html);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_void_and_self_closing() {
        let doc = Document::from_html("<p>a<br/>b<img class=emoji-img data-emoji=\"😀\"></p>");
        assert_eq!(
            doc.to_html(),
            r#"<p>a<br>b<img class="emoji-img" data-emoji="😀"></p>"#
        );
    }

    #[test]
    fn test_entities_round_trip() {
        let doc = Document::from_html("<p>1 &lt; 2 &amp;&amp; &quot;x&quot;</p>");
        assert_eq!(doc.text_content(doc.root()), "1 < 2 && \"x\"");
        insta::assert_snapshot!(doc.to_html(), @r#"<p>1 &lt; 2 &amp;&amp; "x"</p>"#);
    }

    #[test]
    fn test_lenient_markup() {
        let doc = Document::from_html("<!-- note --><p>one</b> two<p>three");
        insta::assert_snapshot!(doc.to_html(), @"<p>one two<p>three</p></p>");
    }

    #[test]
    fn test_boolean_and_unquoted_attributes() {
        let doc = Document::from_html("<input disabled value=x>");
        let input = doc.first_child(doc.root()).unwrap();
        let el = doc.element(input).unwrap();
        assert_eq!(el.attr("disabled"), Some(""));
        assert_eq!(el.attr("value"), Some("x"));
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let doc = Document::from_html("a < b <3");
        assert_eq!(doc.text_content(doc.root()), "a < b <3");
        assert_eq!(doc.children(doc.root()).len(), 1);
    }

    #[test]
    fn test_parse_fragment_detached() {
        let mut doc = Document::from_html("<p>x</p>");
        let nodes = doc.parse_fragment("<b>y</b> z");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|&n| doc.parent(n).is_none()));
        assert_eq!(doc.to_html(), "<p>x</p>");
    }
}
