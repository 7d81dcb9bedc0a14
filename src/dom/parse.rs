//! Tolerant markup reader
//!
//! Builds a [`Document`] from page markup using quick-xml's event reader.
//! Real pages are rarely well-formed XML, so the builder recovers instead of
//! failing: void elements never take children, unknown end tags are ignored,
//! and an end tag closes every element opened after its match. A `<` that
//! cannot open markup is text, and character references resolve against the
//! HTML5 entity table, with unknown ones kept as written.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Document, DomError, NodeData, NodeId, VOID_ELEMENTS};

/// Parse markup into a new document
pub fn parse(markup: &str) -> Result<Document, DomError> {
    let markup = escape_stray_lt(markup);
    let mut reader = Reader::from_str(&markup);
    reader
        .trim_text(false)
        .check_end_names(false)
        .expand_empty_elements(false);

    let mut doc = Document::new();
    let mut open: Vec<(NodeId, String)> = Vec::new();

    loop {
        let parent = open.last().map(|(id, _)| *id).unwrap_or_else(|| doc.root());
        match reader.read_event()? {
            Event::Start(start) => {
                let (node, name) = create_element(&mut doc, &start);
                doc.append_child(parent, node)?;
                if !is_void(&name) {
                    open.push((node, name));
                }
            }
            Event::Empty(start) => {
                let (node, _) = create_element(&mut doc, &start);
                doc.append_child(parent, node)?;
            }
            Event::End(end) => {
                let name = lowercase_name(end.name().as_ref());
                if let Some(index) = open.iter().rposition(|(_, open_name)| *open_name == name) {
                    open.truncate(index);
                }
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                append_text(&mut doc, parent, decode(&raw).into_owned())?;
            }
            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(&cdata).into_owned();
                append_text(&mut doc, parent, content)?;
            }
            Event::Comment(comment) => {
                let node = doc.create_comment(String::from_utf8_lossy(&comment).into_owned());
                doc.append_child(parent, node)?;
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    Ok(doc)
}

fn create_element(doc: &mut Document, start: &BytesStart<'_>) -> (NodeId, String) {
    let name = lowercase_name(start.name().as_ref());
    let node = doc.create_element(name.clone());

    let attrs: Vec<(String, String)> = start
        .html_attributes()
        .with_checks(false)
        .filter_map(|attr| attr.ok())
        .map(|attr| {
            let key = lowercase_name(attr.key.as_ref());
            let raw = String::from_utf8_lossy(&attr.value);
            (key, decode(&raw).into_owned())
        })
        .collect();

    if let Some(el) = doc.element_mut(node) {
        for (key, value) in attrs {
            el.set_attr(key, value);
        }
    }
    (node, name)
}

/// Longest reference looked at when decoding leniently, `&` and `;` included
const MAX_REFERENCE_LEN: usize = 34;

/// Resolve character references; any that do not resolve stay as written
fn decode(raw: &str) -> Cow<'_, str> {
    if let Ok(decoded) = unescape(raw) {
        return decoded;
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let reference = tail
            .find(';')
            .filter(|&end| end < MAX_REFERENCE_LEN)
            .map(|end| &tail[..=end]);

        match reference.and_then(|r| unescape(r).ok().map(|value| (r.len(), value))) {
            Some((len, value)) => {
                out.push_str(&value);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Rewrite every `<` that cannot start a tag, comment or declaration as
/// `&lt;`; comment bodies are left alone
fn escape_stray_lt(markup: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut from = 0;

    while let Some(found) = markup[from..].find('<') {
        let at = from + found;
        let next = &markup.as_bytes()[at + 1..];
        if next.starts_with(b"!--") {
            from = markup[at..]
                .find("-->")
                .map_or(markup.len(), |end| at + end + 3);
            continue;
        }
        if !opens_markup(next) {
            let buf = out.get_or_insert_with(|| String::with_capacity(markup.len() + 8));
            buf.push_str(&markup[copied..at]);
            buf.push_str("&lt;");
            copied = at + 1;
        }
        from = at + 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&markup[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(markup),
    }
}

fn opens_markup(next: &[u8]) -> bool {
    match next {
        [b'/', c, ..] => c.is_ascii_alphabetic(),
        [c, ..] => c.is_ascii_alphabetic() || *c == b'!' || *c == b'?',
        [] => false,
    }
}

/// Append text, coalescing with a trailing text sibling
fn append_text(doc: &mut Document, parent: NodeId, content: String) -> Result<(), DomError> {
    if content.is_empty() {
        return Ok(());
    }
    if let Some(&last) = doc.children(parent).last() {
        if let NodeData::Text(existing) = doc.data(last) {
            let merged = format!("{}{}", existing, content);
            return doc.set_text(last, merged);
        }
    }
    let node = doc.create_text(content);
    doc.append_child(parent, node)
}

fn lowercase_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_markup() {
        let doc = parse("<div id=\"main\"><p>Hello <b>bold</b> world</p></div>").unwrap();

        let div = doc.children(doc.root())[0];
        assert_eq!(doc.element(div).unwrap().attr("id"), Some("main"));
        assert_eq!(doc.text_content(div), "Hello bold world");
    }

    #[test]
    fn test_parse_void_elements_take_no_children() {
        let doc = parse("<p>line one<br>line two<img src=\"a.png\"></p>").unwrap();

        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 4);
        assert_eq!(doc.text_content(p), "line oneline two");
    }

    #[test]
    fn test_parse_recovers_from_mismatched_tags() {
        let doc = parse("<div><p>open<span>inner</div><p>after</p>").unwrap();

        let top: Vec<_> = doc.children(doc.root()).to_vec();
        assert_eq!(top.len(), 2);
        assert_eq!(doc.text_content(top[1]), "after");
    }

    #[test]
    fn test_parse_unescapes_entities() {
        let doc = parse("<p>fish &amp; chips</p>").unwrap();
        assert_eq!(doc.text_content(doc.root()), "fish & chips");
    }

    #[test]
    fn test_parse_resolves_html_entities() {
        let doc = parse("<p title=\"it&rsquo;s\">a&nbsp;b &mdash; c&#33;</p>").unwrap();

        let p = doc.children(doc.root())[0];
        assert_eq!(doc.text_content(p), "a\u{a0}b \u{2014} c!");
        assert_eq!(doc.element(p).unwrap().attr("title"), Some("it\u{2019}s"));
        assert_eq!(
            crate::dom::serialize_children(&doc, doc.root()),
            "<p title=\"it\u{2019}s\">a\u{a0}b \u{2014} c!</p>"
        );
    }

    #[test]
    fn test_parse_keeps_unknown_entities_verbatim() {
        let doc = parse("<p>AT&T &bogus; &amp; more</p>").unwrap();
        assert_eq!(doc.text_content(doc.root()), "AT&T &bogus; & more");
    }

    #[test]
    fn test_parse_stray_less_than_is_text() {
        let doc = parse("<p>if a < b then<br>x <= y</p><!-- a < b -->").unwrap();

        let top = doc.children(doc.root());
        assert_eq!(top.len(), 2);
        assert_eq!(doc.text_content(top[0]), "if a < b thenx <= y");
        assert_eq!(doc.children(top[0]).len(), 3);
        assert_eq!(
            crate::dom::serialize_children(&doc, doc.root()),
            "<p>if a &lt; b then<br>x &lt;= y</p><!-- a < b -->"
        );
    }
}
