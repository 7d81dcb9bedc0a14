//! Markup writer

use quick_xml::escape::{escape, partial_escape};

use super::{Document, NodeData, NodeId, VOID_ELEMENTS};

/// Serialize a node and its subtree
pub fn serialize(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serialize only the children of a node
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.data(node) {
        NodeData::Document => {
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        NodeData::Text(text) => out.push_str(&partial_escape(text)),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.name.as_str()) {
                return;
            }

            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    #[test]
    fn test_serialize_round_trips_simple_markup() {
        let markup = r#"<div class="post"><p>Hello <b>world</b></p><br><!--note--></div>"#;
        let doc = parse(markup).unwrap();

        assert_eq!(serialize(&doc, doc.root()), markup);
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.element_mut(span)
            .unwrap()
            .set_attr("title", "say \"hi\" & <go>");
        let text = doc.create_text("1 < 2 & 3 > 2");
        doc.append_child(span, text).unwrap();
        doc.append_child(doc.root(), span).unwrap();

        assert_eq!(
            serialize(&doc, span),
            "<span title=\"say &quot;hi&quot; &amp; &lt;go&gt;\">1 &lt; 2 &amp; 3 &gt; 2</span>"
        );
        assert_eq!(serialize_children(&doc, span), "1 &lt; 2 &amp; 3 &gt; 2");
    }
}
