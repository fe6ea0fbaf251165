//! Lenient markup parser.
//!
//! Turns Vuetify template markup into a tree of elements, text and comments.
//! Recovery over rejection: unclosed tags are closed at end of input,
//! unmatched end tags are dropped, and a `<` that does not open a tag is
//! literal text. Nothing the user types can make `parse` fail.

use memchr::memchr;

use crate::dom::{AttrValue, Element, Node};

/* =============================== Core sets =============================== */

fn is_void(name: &str) -> bool {
    matches_ignore_ascii_case(
        name,
        &[
            "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
            "source", "track", "wbr",
        ],
    )
}

/// Elements whose content is raw text up to the matching end tag.
fn is_raw_text(name: &str) -> bool {
    matches_ignore_ascii_case(name, &["script", "style", "textarea", "title", "xmp"])
}

fn matches_ignore_ascii_case(name: &str, set: &[&str]) -> bool {
    set.iter().any(|s| name.eq_ignore_ascii_case(s))
}

/* ============================ Utility predicates ========================= */

#[inline]
fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

#[inline]
fn is_tag_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Attribute names take any byte the HTML syntax allows, which covers the
/// Vue spellings this tool cares about (`:model-value`, `@click`, `v-slot:top`).
#[inline]
fn is_attr_name_char(b: u8) -> bool {
    !is_ws(b) && b != b'/' && b != b'>' && b != b'=' && b != b'"' && b != b'\''
}

/* =============================== Tag parsing ============================= */

/// Find the '>' for a tag starting at `i` (src[i] == '<'), being quote-aware.
fn find_tag_end(src: &[u8], mut i: usize) -> Option<usize> {
    let n = src.len();
    i += 1;
    let mut quote: u8 = 0;
    while i < n {
        let b = src[i];
        if quote != 0 {
            if b == quote {
                quote = 0;
            }
        } else if b == b'"' || b == b'\'' {
            quote = b;
        } else if b == b'>' {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn classify_value(name: &str, value: Option<&str>) -> AttrValue {
    match value {
        None => AttrValue::Flag,
        Some("") => AttrValue::Flag,
        Some(v) if name == "class" => {
            AttrValue::Tokens(v.split_whitespace().map(str::to_string).collect())
        }
        Some(v) => AttrValue::Literal(v.to_string()),
    }
}

struct RawTag<'a> {
    name: &'a str,
    attrs: Vec<(String, AttrValue)>,
    self_closing: bool,
}

/// Extract name and attributes from raw `<...>` text, in insertion order.
fn parse_start_tag(tag: &str) -> RawTag<'_> {
    let bytes = tag.as_bytes();
    let n = bytes.len();
    let mut i = 1;

    let name_start = i;
    while i < n && is_tag_name_char(bytes[i]) {
        i += 1;
    }
    let name = &tag[name_start..i];

    let mut attrs = Vec::new();
    let mut self_closing = false;
    while i < n && bytes[i] != b'>' {
        // skip whitespace and slashes between attributes; a slash counts as
        // self-closing only when nothing but whitespace separates it from '>'
        while i < n && (is_ws(bytes[i]) || bytes[i] == b'/') {
            if bytes[i] == b'/' {
                let mut k = i + 1;
                while k < n && is_ws(bytes[k]) {
                    k += 1;
                }
                self_closing = k >= n || bytes[k] == b'>';
            }
            i += 1;
        }
        if i >= n || bytes[i] == b'>' {
            break;
        }
        if !is_attr_name_char(bytes[i]) {
            // Not a valid name start; advance to avoid infinite loops.
            i += 1;
            continue;
        }
        let attr_start = i;
        while i < n && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let attr_name = &tag[attr_start..i];

        while i < n && is_ws(bytes[i]) {
            i += 1;
        }

        let mut value: Option<&str> = None;
        if i < n && bytes[i] == b'=' {
            i += 1;
            while i < n && is_ws(bytes[i]) {
                i += 1;
            }
            if i < n && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let q = bytes[i];
                i += 1;
                let v_start = i;
                while i < n && bytes[i] != q {
                    i += 1;
                }
                value = Some(&tag[v_start..i]);
                if i < n {
                    i += 1;
                }
            } else {
                let v_start = i;
                while i < n && !is_ws(bytes[i]) && bytes[i] != b'>' {
                    i += 1;
                }
                value = Some(&tag[v_start..i]);
            }
        }

        attrs.push((attr_name.to_string(), classify_value(attr_name, value)));
    }

    RawTag {
        name,
        attrs,
        self_closing,
    }
}

/// Tag name of an end tag `</name ...>`, given the index of '<' and of '>'.
fn end_tag_name(input: &str, from: usize, to: usize) -> &str {
    let bytes = input.as_bytes();
    let mut k = from + 2;
    while k < to && is_ws(bytes[k]) {
        k += 1;
    }
    let start = k;
    while k < to && is_tag_name_char(bytes[k]) {
        k += 1;
    }
    &input[start..k]
}

/* ============================== Tree building ============================ */

fn append(root: &mut Vec<Node>, stack: &mut Vec<Element>, node: Node) {
    let children = match stack.last_mut() {
        Some(open) => &mut open.children,
        None => root,
    };
    // Merge adjacent text nodes so direct text spans a literal '<'.
    if let Node::Text(text) = &node {
        if let Some(Node::Text(prev)) = children.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    children.push(node);
}

/// Close the innermost open element named `name`; intermediate open elements
/// are implicitly closed. An end tag matching nothing is dropped.
fn close_element(root: &mut Vec<Node>, stack: &mut Vec<Element>, name: &str) {
    let Some(depth) = stack
        .iter()
        .rposition(|el| el.name.eq_ignore_ascii_case(name))
    else {
        return;
    };
    while stack.len() > depth {
        let Some(el) = stack.pop() else { break };
        append(root, stack, Node::Element(el));
    }
}

/// Index of the first '-' of the comment terminator "-->" at or after `i`.
fn find_comment_end(src: &[u8], mut i: usize) -> Option<usize> {
    while let Some(p) = memchr(b'-', &src[i..]) {
        let j = i + p;
        if j + 2 < src.len() && src[j + 1] == b'-' && src[j + 2] == b'>' {
            return Some(j);
        }
        i = j + 1;
        if i >= src.len() {
            break;
        }
    }
    None
}

/// Content of a raw-text element: everything up to its matching end tag.
/// Returns the content slice and the index just past the end tag.
fn raw_text_span<'a>(input: &'a str, from: usize, name: &str) -> (&'a str, usize) {
    let src = input.as_bytes();
    let n = src.len();
    let mut j = from;
    while let Some(p) = memchr(b'<', &src[j..]) {
        let pos = j + p;
        if pos + 1 < n && src[pos + 1] == b'/' {
            if let Some(end) = find_tag_end(src, pos) {
                if end_tag_name(input, pos, end).eq_ignore_ascii_case(name) {
                    return (&input[from..pos], end + 1);
                }
            }
        }
        j = pos + 1;
    }
    (&input[from..], n)
}

/// Parse markup into its root nodes, in document order.
pub fn parse(input: &str) -> Vec<Node> {
    let src = input.as_bytes();
    let n = src.len();
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut i = 0usize;

    while i < n {
        if src[i] == b'<' {
            // Comments
            if src[i..].starts_with(b"<!--") {
                match find_comment_end(src, i + 4) {
                    Some(j) => {
                        append(&mut root, &mut stack, Node::Comment(input[i + 4..j].to_string()));
                        i = j + 3;
                    }
                    None => {
                        // unterminated comment runs to end of input
                        append(&mut root, &mut stack, Node::Comment(input[i + 4..].to_string()));
                        i = n;
                    }
                }
                continue;
            }

            // Declarations (<!DOCTYPE ...>, <![CDATA[...]]>)
            if src[i..].starts_with(b"<!") {
                let (decl, next) = match memchr(b'>', &src[i..]) {
                    Some(p) => (&input[i + 2..i + p], i + p + 1),
                    None => (&input[i + 2..], n),
                };
                append(&mut root, &mut stack, Node::Doctype(decl.trim().to_string()));
                i = next;
                continue;
            }

            // Processing instructions (<?xml ...?>)
            if src[i..].starts_with(b"<?") {
                let (pi, next) = match memchr(b'>', &src[i..]) {
                    Some(p) => (&input[i + 2..i + p], i + p + 1),
                    None => (&input[i + 2..], n),
                };
                let pi = pi.strip_suffix('?').unwrap_or(pi);
                append(
                    &mut root,
                    &mut stack,
                    Node::ProcessingInstruction(pi.trim().to_string()),
                );
                i = next;
                continue;
            }

            // End tags
            if i + 1 < n && src[i + 1] == b'/' {
                match find_tag_end(src, i) {
                    Some(j) => {
                        let name = end_tag_name(input, i, j);
                        close_element(&mut root, &mut stack, name);
                        i = j + 1;
                    }
                    None => {
                        // unterminated tag to end of input: literal text
                        append(&mut root, &mut stack, Node::Text(input[i..].to_string()));
                        i = n;
                    }
                }
                continue;
            }

            // Start tags
            if i + 1 < n && src[i + 1].is_ascii_alphabetic() {
                match find_tag_end(src, i) {
                    Some(j) => {
                        let raw = parse_start_tag(&input[i..=j]);
                        let mut el = Element::new(raw.name);
                        el.attrs = raw.attrs;
                        i = j + 1;
                        if raw.self_closing || is_void(raw.name) {
                            append(&mut root, &mut stack, Node::Element(el));
                        } else if is_raw_text(raw.name) {
                            let (text, next) = raw_text_span(input, i, raw.name);
                            if !text.is_empty() {
                                el.children.push(Node::Text(text.to_string()));
                            }
                            append(&mut root, &mut stack, Node::Element(el));
                            i = next;
                        } else {
                            stack.push(el);
                        }
                    }
                    None => {
                        append(&mut root, &mut stack, Node::Text(input[i..].to_string()));
                        i = n;
                    }
                }
                continue;
            }

            // A '<' that opens nothing is literal text.
            append(&mut root, &mut stack, Node::Text("<".to_string()));
            i += 1;
            continue;
        }

        // Text run
        let next_lt = memchr(b'<', &src[i..]).map(|p| i + p).unwrap_or(n);
        append(&mut root, &mut stack, Node::Text(input[i..next_lt].to_string()));
        i = next_lt;
    }

    // input ended with elements still open
    while let Some(el) = stack.pop() {
        append(&mut root, &mut stack, Node::Element(el));
    }

    tracing::debug!(roots = root.len(), "parsed markup");
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_element(nodes: &[Node]) -> &Element {
        let elements: Vec<&Element> = nodes
            .iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .collect();
        assert_eq!(elements.len(), 1, "expected one element in {nodes:?}");
        elements[0]
    }

    #[test]
    fn attribute_order_is_preserved() {
        let tree = parse(r#"<v-btn color="red" size="small" rounded></v-btn>"#);
        let el = only_element(&tree);
        let names: Vec<&str> = el.attrs.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["color", "size", "rounded"]);
    }

    #[test]
    fn value_classification() {
        let tree = parse(r#"<v-btn rounded disabled="" class="ma-2 pa-1" href="/x"></v-btn>"#);
        let el = only_element(&tree);
        assert_eq!(el.attrs[0].1, AttrValue::Flag);
        assert_eq!(el.attrs[1].1, AttrValue::Flag);
        assert_eq!(
            el.attrs[2].1,
            AttrValue::Tokens(vec!["ma-2".to_string(), "pa-1".to_string()])
        );
        assert_eq!(el.attrs[3].1, AttrValue::Literal("/x".to_string()));
    }

    #[test]
    fn binding_attribute_names_survive() {
        let tree = parse(r#"<v-slider :model-value="speed" @click="go"></v-slider>"#);
        let el = only_element(&tree);
        assert_eq!(el.attrs[0].0, ":model-value");
        assert_eq!(el.attrs[1].0, "@click");
    }

    #[test]
    fn nesting_and_text() {
        let tree = parse("<v-card><v-btn>Go</v-btn></v-card>");
        let card = only_element(&tree);
        assert_eq!(card.name, "v-card");
        let btn = only_element(&card.children);
        assert_eq!(btn.direct_text(), Some("Go"));
    }

    #[test]
    fn unclosed_tags_close_at_eof() {
        let tree = parse("<v-card><v-btn>Go");
        let card = only_element(&tree);
        let btn = only_element(&card.children);
        assert_eq!(btn.direct_text(), Some("Go"));
    }

    #[test]
    fn unmatched_end_tag_is_dropped() {
        let tree = parse("</div><v-btn>Go</v-btn>");
        let el = only_element(&tree);
        assert_eq!(el.name, "v-btn");
    }

    #[test]
    fn implicit_close_of_intermediates() {
        let tree = parse("<v-card><v-row><v-col>x</v-card><v-btn>Go</v-btn>");
        assert_eq!(tree.len(), 2);
        let Node::Element(card) = &tree[0] else {
            panic!("expected element");
        };
        assert_eq!(card.name, "v-card");
        let Node::Element(btn) = &tree[1] else {
            panic!("expected element");
        };
        assert_eq!(btn.name, "v-btn");
    }

    #[test]
    fn stray_lt_is_literal_text() {
        let tree = parse("<v-btn>a < b</v-btn>");
        let el = only_element(&tree);
        assert_eq!(el.direct_text(), Some("a < b"));
    }

    #[test]
    fn self_closing_elements_take_no_children() {
        let tree = parse("<v-spacer/><v-divider vertical/>");
        assert_eq!(tree.len(), 2);
        for node in &tree {
            let Node::Element(el) = node else {
                panic!("expected element");
            };
            assert!(el.children.is_empty());
        }
    }

    #[test]
    fn unquoted_value_ending_in_slash_is_not_self_closing() {
        let tree = parse("<v-btn href=/x/>Go</v-btn>");
        let el = only_element(&tree);
        assert_eq!(el.attrs[0].1, AttrValue::Literal("/x/".to_string()));
        assert_eq!(el.direct_text(), Some("Go"));
    }

    #[test]
    fn void_elements_take_no_children() {
        let tree = parse("<br><v-btn>Go</v-btn>");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn comments_and_declarations() {
        let tree = parse("<!-- note --><!DOCTYPE html><?xml version=\"1.0\"?>");
        assert_eq!(tree[0], Node::Comment(" note ".to_string()));
        assert_eq!(tree[1], Node::Doctype("DOCTYPE html".to_string()));
        assert_eq!(
            tree[2],
            Node::ProcessingInstruction("xml version=\"1.0\"".to_string())
        );
    }

    #[test]
    fn unterminated_comment_runs_to_eof() {
        let tree = parse("<!-- dangling");
        assert_eq!(tree, vec![Node::Comment(" dangling".to_string())]);
    }

    #[test]
    fn raw_text_content_is_not_parsed() {
        let tree = parse("<script>if (a < b) { go(); }</script>");
        let el = only_element(&tree);
        assert_eq!(el.direct_text(), Some("if (a < b) { go(); }"));
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let tree = parse(r#"<v-btn title="a > b">Go</v-btn>"#);
        let el = only_element(&tree);
        assert_eq!(el.attrs[0].1, AttrValue::Literal("a > b".to_string()));
        assert_eq!(el.direct_text(), Some("Go"));
    }
}
