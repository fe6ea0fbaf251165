//! Canonical reflow of the emitted code.
//!
//! The emitted language is a small Python subset: comment lines, call
//! statements `Name(args)`, and block openers `with Name(args):` whose body
//! is indented four spaces. This module is the validation gate for the whole
//! pipeline — the transpiler itself never checks syntax — so anything that
//! does not fit that shape is a hard [`FormatError`], never a best-effort
//! rewrite.
//!
//! Reflow rules match black's: an argument list goes on one line when it
//! fits the width limit; a list that does not fit, or that carries a
//! trailing ("magic") comma, is laid out one argument per line with the
//! closing parenthesis on its own line.

use thiserror::Error;

/// The raw emitted text is not well-formed code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct FormatError {
    pub line: usize,
    pub message: String,
}

impl FormatError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        FormatError {
            line,
            message: message.into(),
        }
    }
}

const INDENT: &str = "    ";

enum Stmt<'a> {
    Comment(&'a str),
    Call {
        name: &'a str,
        args: Vec<String>,
        /// trailing comma in the source list: always explode
        exploded: bool,
        /// `with ...:` block opener
        block: bool,
    },
}

/// Split an argument region at top-level commas, quote- and bracket-aware.
/// Returns the arguments and whether the list ended in a trailing comma.
fn split_arguments(src: &str) -> Result<(Vec<String>, bool), String> {
    let mut args: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;

    for (idx, c) in src.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return Err("invalid syntax".to_string());
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                args.push(src[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth != 0 {
        return Err("invalid syntax".to_string());
    }

    let mut trailing = false;
    let last = src[start..].trim();
    if last.is_empty() {
        trailing = !args.is_empty();
    } else {
        args.push(last.to_string());
    }
    if args.iter().any(String::is_empty) {
        return Err("invalid syntax".to_string());
    }
    Ok((args, trailing))
}

fn is_identifier(src: &str) -> bool {
    let bytes = src.as_bytes();
    matches!(bytes.first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_')
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

/// A value in the emitted grammar: a complete quoted string, an identifier
/// (`true`), or a parenthesized tuple of such values. Anything else —
/// `@click`, adjacent string pieces from an unescaped inner quote — is not
/// well-formed and must not pass the gate.
fn is_valid_value(src: &str) -> bool {
    let src = src.trim();
    let bytes = src.as_bytes();
    match bytes.first() {
        Some(b'"') | Some(b'\'') => {
            let quote = bytes[0] as char;
            src.len() >= 2
                && src.ends_with(quote)
                && !src[1..src.len() - 1].contains(quote)
        }
        Some(b'(') => {
            if !src.ends_with(')') {
                return false;
            }
            match split_arguments(&src[1..src.len() - 1]) {
                Ok((parts, _)) if !parts.is_empty() => parts.iter().all(|p| is_valid_value(p)),
                _ => false,
            }
        }
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => is_identifier(src),
        _ => false,
    }
}

/// One argument: `identifier=value` or a bare value.
fn is_valid_argument(src: &str) -> bool {
    let bytes = src.as_bytes();
    let mut i = 0usize;
    if matches!(bytes.first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_') {
        i = 1;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i > 0 && bytes.get(i) == Some(&b'=') && bytes.get(i + 1) != Some(&b'=') {
        return is_valid_value(&src[i + 1..]);
    }
    is_valid_value(src)
}

fn parse_stmt(line_no: usize, content: &str) -> Result<Stmt<'_>, FormatError> {
    if content.starts_with('#') {
        return Ok(Stmt::Comment(content));
    }

    let (block, body) = match content.strip_prefix("with ") {
        Some(rest) => match rest.strip_suffix(':') {
            Some(inner) => (true, inner),
            None => return Err(FormatError::new(line_no, "expected ':' after with statement")),
        },
        None => (false, content),
    };

    let bytes = body.as_bytes();
    let mut i = 0usize;
    if matches!(bytes.first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_') {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i == 0 || bytes.get(i) != Some(&b'(') || !body.ends_with(')') || i + 1 > body.len() - 1 {
        return Err(FormatError::new(line_no, "invalid syntax"));
    }
    let name = &body[..i];
    let arg_region = &body[i + 1..body.len() - 1];
    let (args, exploded) =
        split_arguments(arg_region).map_err(|message| FormatError::new(line_no, message))?;
    if !args.iter().all(|arg| is_valid_argument(arg)) {
        return Err(FormatError::new(line_no, "invalid syntax"));
    }

    Ok(Stmt::Call {
        name,
        args,
        exploded,
        block,
    })
}

/// Reflow raw emitted code to the canonical style at `width` columns.
pub fn format(raw: &str, width: usize) -> Result<String, FormatError> {
    let mut parsed: Vec<(usize, Stmt<'_>)> = Vec::new();
    let mut prev_level = 0usize;
    // line number of a `with` opener still waiting for its block
    let mut pending_with: Option<usize> = None;
    // open blocks: (opener line, body level, body has a statement yet).
    // A block whose body is comments only is as invalid as an empty one.
    let mut blocks: Vec<(usize, usize, bool)> = Vec::new();

    for (idx, full_line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let line = full_line.trim_end();
        if line.is_empty() {
            continue;
        }

        let content = line.trim_start_matches(' ');
        let spaces = line.len() - content.len();
        if content.starts_with('\t') {
            return Err(FormatError::new(line_no, "invalid indentation"));
        }
        if spaces % 4 != 0 {
            return Err(FormatError::new(line_no, "unexpected indent"));
        }
        let level = spaces / 4;

        if let Some(with_line) = pending_with {
            if level != prev_level + 1 {
                return Err(FormatError::new(
                    with_line,
                    "expected an indented block after 'with' statement",
                ));
            }
            pending_with = None;
        } else if parsed.is_empty() {
            if level != 0 {
                return Err(FormatError::new(line_no, "unexpected indent"));
            }
        } else if level > prev_level {
            return Err(FormatError::new(line_no, "unexpected indent"));
        }

        // dedent closes blocks; each must have held a real statement
        while let Some(&(with_line, body_level, has_stmt)) = blocks.last() {
            if level >= body_level {
                break;
            }
            if !has_stmt {
                return Err(FormatError::new(
                    with_line,
                    "expected an indented block after 'with' statement",
                ));
            }
            blocks.pop();
        }

        let stmt = parse_stmt(line_no, content)?;
        if !matches!(stmt, Stmt::Comment(_)) {
            if let Some(top) = blocks.last_mut() {
                if top.1 == level {
                    top.2 = true;
                }
            }
        }
        if matches!(stmt, Stmt::Call { block: true, .. }) {
            pending_with = Some(line_no);
            blocks.push((line_no, level + 1, false));
        }
        parsed.push((level, stmt));
        prev_level = level;
    }

    if let Some(with_line) = pending_with {
        return Err(FormatError::new(
            with_line,
            "expected an indented block after 'with' statement",
        ));
    }
    if let Some(&(with_line, _, false)) = blocks.iter().find(|(_, _, has_stmt)| !has_stmt) {
        return Err(FormatError::new(
            with_line,
            "expected an indented block after 'with' statement",
        ));
    }

    let mut out = String::new();
    for (level, stmt) in &parsed {
        let indent = INDENT.repeat(*level);
        match stmt {
            Stmt::Comment(text) => {
                out.push_str(&indent);
                out.push_str(text);
                out.push('\n');
            }
            Stmt::Call {
                name,
                args,
                exploded,
                block,
            } => {
                let (prefix, suffix) = if *block { ("with ", ":") } else { ("", "") };
                let flat = format!("{indent}{prefix}{name}({}){suffix}", args.join(", "));
                if args.is_empty() || (!*exploded && flat.chars().count() <= width) {
                    out.push_str(&flat);
                    out.push('\n');
                } else {
                    out.push_str(&indent);
                    out.push_str(prefix);
                    out.push_str(name);
                    out.push_str("(\n");
                    for arg in args {
                        out.push_str(&indent);
                        out.push_str(INDENT);
                        out.push_str(arg);
                        out.push_str(",\n");
                    }
                    out.push_str(&indent);
                    out.push(')');
                    out.push_str(suffix);
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}
