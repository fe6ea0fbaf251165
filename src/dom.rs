//! Parsed markup tree.
//!
//! A strict forest: every node is owned by its parent, and the whole tree is
//! owned by the conversion call that built it. Attribute order is insertion
//! order from the source markup.

/// One node in the parsed tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// `<!...>` declarations (doctype, CDATA). The emitter has no rule for
    /// these; reaching one is a structural error.
    Doctype(String),
    /// `<?...?>` processing instructions. Same as [`Node::Doctype`].
    ProcessingInstruction(String),
}

impl Node {
    /// Short noun naming the node kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Element(_) => "element",
            Node::Text(_) => "text",
            Node::Comment(_) => "comment",
            Node::Doctype(_) => "doctype",
            Node::ProcessingInstruction(_) => "processing instruction",
        }
    }

    /// Source-ish rendering of the node, for error messages.
    pub fn rendered(&self) -> String {
        match self {
            Node::Element(el) => format!("<{}>", el.name),
            Node::Text(text) => text.clone(),
            Node::Comment(text) => format!("<!--{text}-->"),
            Node::Doctype(decl) => format!("<!{decl}>"),
            Node::ProcessingInstruction(pi) => format!("<?{pi}?>"),
        }
    }
}

/// Attribute value, classified at parse time.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// A plain string value.
    Literal(String),
    /// Attribute present with no value (or `=""`): a boolean flag prop.
    Flag,
    /// Whitespace-separated token list (`class`).
    Tokens(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, AttrValue)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The element's immediate text content: present only when the element
    /// has exactly one child, that child is text, and it is non-empty after
    /// trimming. Mixed or nested content yields none.
    pub fn direct_text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Node::Text(text)] => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Whether the element opens a nested block: only element children
    /// qualify, text and comments do not.
    pub fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, Node::Element(_)))
    }
}
