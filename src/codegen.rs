//! Tree-to-code transpiler.
//!
//! Walks the parsed tree depth-first, pre-order, emitting one trame construct
//! per element: a `with Tag(...):` block opener when the element has element
//! children, a bare `Tag(...)` call otherwise. Child lines sit one nesting
//! depth below their parent; blocks close by dedent, no terminator token.

use crate::dom::{AttrValue, Element, Node};
use crate::ConvertError;

/// One emitted line: nesting depth and literal text.
pub type Line = (usize, String);

/// kebab-case tag name → PascalCase widget name.
///
/// Uppercase the first character; every hyphen followed by a word character
/// is deleted and that character uppercased. A hyphen followed by anything
/// else stays put.
pub fn translate_tag(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    let mut upper_next = true;
    while let Some(c) = chars.next() {
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
            continue;
        }
        if c == '-' {
            if let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    upper_next = true;
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Attribute → `key=value` fragments, input order preserved.
///
/// Fixed rule order per attribute:
/// 1. hyphens in the name become underscores;
/// 2. a name that is now exactly `class` becomes `classes`;
/// 3. a leading `:` (binding marker) is stripped and the attribute marked
///    dynamic — after the `class` check, so `:class` is NOT renamed;
/// 4. the value renders as `true` for a flag, a quoted token join for a
///    token list, a quoted literal otherwise;
/// 5. dynamic values are wrapped in a single-element tuple, `("expr",)`,
///    which the target framework evaluates as a reactive binding.
pub fn translate_attributes(attrs: &[(String, AttrValue)]) -> Vec<String> {
    let mut fragments = Vec::with_capacity(attrs.len());
    for (raw_name, value) in attrs {
        let mut name = raw_name.replace('-', "_");
        if name == "class" {
            name = "classes".to_string();
        }
        let mut dynamic = false;
        if let Some(stripped) = name.strip_prefix(':') {
            name = stripped.to_string();
            dynamic = true;
        }

        let mut rendered = match value {
            AttrValue::Flag => "true".to_string(),
            AttrValue::Tokens(tokens) => format!("\"{}\"", tokens.join(" ")),
            AttrValue::Literal(text) => format!("\"{text}\""),
        };
        if dynamic {
            rendered = format!("({rendered},)");
        }

        fragments.push(format!("{name}={rendered}"));
    }
    fragments
}

/// Joined argument list for one element: direct text first as a positional
/// string, then the attribute fragments. More than three fragments get a
/// trailing comma so the formatter lays one argument per line.
fn call_arguments(el: &Element) -> String {
    let mut fragments = translate_attributes(&el.attrs);
    if let Some(text) = el.direct_text() {
        fragments.insert(0, format!("\"{text}\""));
    }
    let mut args = fragments.join(", ");
    if fragments.len() > 3 {
        args.push(',');
    }
    args
}

/// Comment node → `# ...` line text; None when insignificant. Newline runs
/// inside the comment collapse to a single space so the line stays a line.
fn comment_line(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let text = if trimmed.contains('\n') {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        trimmed.to_string()
    };
    Some(format!("# {text}"))
}

fn unknown_node(node: &Node) -> ConvertError {
    ConvertError::Structural {
        kind: node.kind(),
        rendered: node.rendered(),
    }
}

/// Emit the whole document from its root nodes.
///
/// Text at the root stops the walk immediately; lines emitted so far stand.
/// Leading whitespace in the input therefore yields empty output.
pub fn emit_document(nodes: &[Node]) -> Result<Vec<Line>, ConvertError> {
    let mut buf = Vec::new();
    for node in nodes {
        match node {
            Node::Element(el) => emit_element(el, 0, &mut buf)?,
            Node::Text(_) => break,
            Node::Comment(text) => {
                if let Some(line) = comment_line(text) {
                    buf.push((0, line));
                }
            }
            other => return Err(unknown_node(other)),
        }
    }
    Ok(buf)
}

fn emit_element(el: &Element, depth: usize, buf: &mut Vec<Line>) -> Result<(), ConvertError> {
    let tag = translate_tag(&el.name);
    let args = call_arguments(el);
    let opens_block = el.has_element_children();

    if opens_block {
        buf.push((depth, format!("with {tag}({args}):")));
    } else {
        buf.push((depth, format!("{tag}({args})")));
    }

    for child in &el.children {
        match child {
            Node::Element(child_el) => emit_element(child_el, depth + 1, buf)?,
            Node::Text(_) => {}
            Node::Comment(text) => {
                // A leaf element emits exactly one line; its comments drop.
                if opens_block {
                    if let Some(line) = comment_line(text) {
                        buf.push((depth + 1, line));
                    }
                }
            }
            other => return Err(unknown_node(other)),
        }
    }
    Ok(())
}

/// Join emitted lines into raw code, four spaces per depth level.
pub fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    for (idx, (depth, text)) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for _ in 0..*depth {
            out.push_str("    ");
        }
        out.push_str(text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn lit(s: &str) -> AttrValue {
        AttrValue::Literal(s.to_string())
    }

    #[test]
    fn tag_translation() {
        assert_eq!(translate_tag("v-app-bar"), "VAppBar");
        assert_eq!(translate_tag("v-text-field"), "VTextField");
        assert_eq!(translate_tag("x"), "X");
        assert_eq!(translate_tag("div"), "Div");
        assert_eq!(translate_tag("my-widget"), "MyWidget");
        // hyphen not followed by a word character stays
        assert_eq!(translate_tag("v--btn"), "V-Btn");
        // digits count as word characters
        assert_eq!(translate_tag("grid-2col"), "Grid2col");
    }

    #[test]
    fn attribute_rules() {
        let attrs = vec![
            ("hide-details".to_string(), AttrValue::Flag),
            ("class".to_string(), AttrValue::Tokens(vec!["ma-2".into(), "pa-1".into()])),
            (":loading".to_string(), lit("isBusy")),
            ("color".to_string(), lit("primary")),
        ];
        assert_eq!(
            translate_attributes(&attrs),
            vec![
                "hide_details=true",
                "classes=\"ma-2 pa-1\"",
                "loading=(\"isBusy\",)",
                "color=\"primary\"",
            ]
        );
    }

    #[test]
    fn dynamic_class_is_not_renamed() {
        // the class→classes rename runs before the binding marker strip
        let attrs = vec![(":class".to_string(), lit("dynCls"))];
        assert_eq!(translate_attributes(&attrs), vec!["class=(\"dynCls\",)"]);
    }

    #[test]
    fn dynamic_hyphenated_name() {
        let attrs = vec![(":model-value".to_string(), lit("speed"))];
        assert_eq!(
            translate_attributes(&attrs),
            vec!["model_value=(\"speed\",)"]
        );
    }

    #[test]
    fn order_is_preserved() {
        let attrs = vec![
            ("a".to_string(), lit("1")),
            ("b".to_string(), lit("2")),
            ("c".to_string(), lit("3")),
        ];
        assert_eq!(
            translate_attributes(&attrs),
            vec!["a=\"1\"", "b=\"2\"", "c=\"3\""]
        );
    }

    #[test]
    fn leaf_element_emits_one_line() {
        let tree = parse(r#"<v-btn color="primary">Click</v-btn>"#);
        let lines = emit_document(&tree).unwrap();
        assert_eq!(
            lines,
            vec![(0, "VBtn(\"Click\", color=\"primary\")".to_string())]
        );
    }

    #[test]
    fn block_element_nests_children() {
        let tree = parse("<v-card><v-btn>Go</v-btn></v-card>");
        let lines = emit_document(&tree).unwrap();
        assert_eq!(
            lines,
            vec![
                (0, "with VCard():".to_string()),
                (1, "VBtn(\"Go\")".to_string()),
            ]
        );
    }

    #[test]
    fn four_fragments_get_trailing_comma() {
        let tree = parse(r#"<v-btn a="1" b="2" c="3" d="4"></v-btn>"#);
        let lines = emit_document(&tree).unwrap();
        assert_eq!(
            lines[0].1,
            "VBtn(a=\"1\", b=\"2\", c=\"3\", d=\"4\",)"
        );
    }

    #[test]
    fn direct_text_counts_toward_trailing_comma() {
        let tree = parse(r#"<v-btn a="1" b="2" c="3">Go</v-btn>"#);
        let lines = emit_document(&tree).unwrap();
        assert_eq!(
            lines[0].1,
            "VBtn(\"Go\", a=\"1\", b=\"2\", c=\"3\",)"
        );
    }

    #[test]
    fn mixed_content_loses_text() {
        // text beside an element child is not the element's direct text
        let tree = parse("<v-card>Hello <v-btn>Go</v-btn></v-card>");
        let lines = emit_document(&tree).unwrap();
        assert_eq!(
            lines,
            vec![
                (0, "with VCard():".to_string()),
                (1, "VBtn(\"Go\")".to_string()),
            ]
        );
    }

    #[test]
    fn comment_children_emit_inside_blocks() {
        let tree = parse("<v-card><v-btn>A</v-btn><!-- actions --></v-card>");
        let lines = emit_document(&tree).unwrap();
        assert_eq!(lines[2], (1, "# actions".to_string()));
    }

    #[test]
    fn comment_inside_leaf_is_dropped() {
        let tree = parse("<v-btn><!-- hidden --></v-btn>");
        let lines = emit_document(&tree).unwrap();
        assert_eq!(lines, vec![(0, "VBtn()".to_string())]);
    }

    #[test]
    fn root_text_halts_emission() {
        let tree = parse("<v-btn>A</v-btn>stray<v-btn>B</v-btn>");
        let lines = emit_document(&tree).unwrap();
        assert_eq!(lines, vec![(0, "VBtn(\"A\")".to_string())]);
    }

    #[test]
    fn doctype_is_a_structural_error() {
        let tree = parse("<!DOCTYPE html><v-app></v-app>");
        let err = emit_document(&tree).unwrap_err();
        assert!(matches!(err, ConvertError::Structural { kind: "doctype", .. }));
    }

    #[test]
    fn nested_unknown_node_is_a_structural_error() {
        let tree = parse("<v-card><v-btn>A</v-btn><?pi?></v-card>");
        let err = emit_document(&tree).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Structural {
                kind: "processing instruction",
                ..
            }
        ));
    }

    #[test]
    fn render_indents_by_depth() {
        let lines = vec![
            (0, "with VCard():".to_string()),
            (1, "VBtn(\"Go\")".to_string()),
        ];
        assert_eq!(render(&lines), "with VCard():\n    VBtn(\"Go\")");
    }
}
