//! Message text formatting.
//!
//! Pure functions turning plain reply text into paragraph/list blocks and
//! escaped HTML. Rendering adapters that do not speak HTML can consume the
//! [`Block`]s directly.

/// A structural block of a formatted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    List(Vec<String>),
}

/// Split text into blocks.
///
/// Each non-blank line is one block. Lines starting with `-` or `•` become
/// list items, and consecutive items share one list.
pub fn format_blocks(text: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('•'))
        {
            let item = rest.trim_start().to_string();
            match blocks.last_mut() {
                Some(Block::List(items)) => items.push(item),
                _ => blocks.push(Block::List(vec![item])),
            }
        } else {
            blocks.push(Block::Paragraph(trimmed.to_string()));
        }
    }

    blocks
}

/// Render text to escaped HTML.
///
/// Text with no visible lines still renders as a single (possibly empty)
/// paragraph so every message has a body.
pub fn format_message(text: &str) -> String {
    let blocks = format_blocks(text);
    if blocks.is_empty() {
        return format!("<p>{}</p>", escape_html(text));
    }

    let mut html = String::with_capacity(text.len() + 16);
    for block in &blocks {
        match block {
            Block::Paragraph(p) => {
                html.push_str("<p>");
                html.push_str(&escape_html(p));
                html.push_str("</p>");
            }
            Block::List(items) => {
                html.push_str("<ul class=\"message-list\">");
                for item in items {
                    html.push_str("<li>");
                    html.push_str(&escape_html(item));
                    html.push_str("</li>");
                }
                html.push_str("</ul>");
            }
        }
    }
    html
}

/// Escape the characters that could open markup or break out of an attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Split text into reveal tokens: each run of non-whitespace keeps the
/// whitespace that follows it. Leading whitespace is dropped.
pub fn reveal_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_trailing_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if current.is_empty() {
                continue;
            }
            in_trailing_space = true;
            current.push(c);
        } else {
            if in_trailing_space {
                tokens.push(std::mem::take(&mut current));
                in_trailing_space = false;
            }
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
