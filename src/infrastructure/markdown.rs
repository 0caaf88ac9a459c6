//! HTML-tree-to-Markdown conversion.
//!
//! Walks a content subtree and renders Markdown according to
//! [`ConvertOptions`]: ATX headings, fenced code blocks, `-` bullets and
//! `_` emphasis by default. Tags on the strip list render as nothing at
//! all. The output is body text only; document framing (front-matter,
//! role headings, rules) belongs to the assembler.

use crate::application::{ConvertOptions, MarkdownConvert};
use crate::domain::NodeRef;

/// Stateless converter over the in-memory tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomMarkdownConverter;

impl DomMarkdownConverter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownConvert for DomMarkdownConverter {
    fn convert(&self, node: &NodeRef, options: &ConvertOptions) -> String {
        let mut out = String::new();
        if node.is_text() {
            push_inline_text(&node.text_content(), &mut out);
        } else {
            let tag = node.tag();
            if !options.strip_tags.contains(&tag.as_str()) {
                render_block(node, &tag, options, &mut out);
            }
        }
        let trimmed = out.trim();
        let mut result = String::with_capacity(trimmed.len());
        // Drop trailing whitespace per line; keep blank lines themselves.
        for (i, line) in trimmed.lines().enumerate() {
            if i > 0 {
                result.push('\n');
            }
            result.push_str(line.trim_end());
        }
        result
    }
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_block(tag: &str) -> bool {
    heading_level(tag).is_some()
        || matches!(
            tag,
            "p" | "div"
                | "section"
                | "article"
                | "main"
                | "aside"
                | "header"
                | "footer"
                | "ul"
                | "ol"
                | "li"
                | "pre"
                | "blockquote"
                | "hr"
                | "table"
        )
}

/// Render the children of a container node as a block sequence. Runs of
/// text and inline elements coalesce into paragraphs; block children
/// flush the pending paragraph and render on their own.
fn render_blocks(node: &NodeRef, options: &ConvertOptions, out: &mut String) {
    let mut paragraph = String::new();
    for child in node.children() {
        if child.is_text() {
            push_inline_text(&child.text_content(), &mut paragraph);
            continue;
        }
        let tag = child.tag();
        if options.strip_tags.contains(&tag.as_str()) {
            continue;
        }
        if is_block(&tag) {
            flush_paragraph(&mut paragraph, out);
            render_block(&child, &tag, options, out);
        } else {
            paragraph.push_str(&render_inline(&child, options));
        }
    }
    flush_paragraph(&mut paragraph, out);
}

fn flush_paragraph(paragraph: &mut String, out: &mut String) {
    let text = paragraph.trim();
    if !text.is_empty() {
        out.push_str(text);
        out.push_str("\n\n");
    }
    paragraph.clear();
}

fn render_block(node: &NodeRef, tag: &str, options: &ConvertOptions, out: &mut String) {
    if let Some(level) = heading_level(tag) {
        let text = inline_content(node, options);
        if !text.is_empty() {
            for _ in 0..level {
                out.push(options.heading_marker);
            }
            out.push(' ');
            out.push_str(&text);
            out.push_str("\n\n");
        }
        return;
    }
    match tag {
        "hr" => out.push_str("---\n\n"),
        "pre" => {
            out.push_str(options.code_fence);
            out.push('\n');
            let code = node.text_content();
            out.push_str(code.trim_matches('\n'));
            out.push('\n');
            out.push_str(options.code_fence);
            out.push_str("\n\n");
        }
        "blockquote" => {
            let mut inner = String::new();
            render_blocks(node, options, &mut inner);
            for line in inner.trim_end().lines() {
                if line.is_empty() {
                    out.push_str(">\n");
                } else {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        "ul" | "ol" => {
            render_list(node, tag == "ol", 0, options, out);
            out.push('\n');
        }
        // Generic containers recurse; li outside a list degrades to this.
        _ => render_blocks(node, options, out),
    }
}

fn render_list(
    node: &NodeRef,
    ordered: bool,
    depth: usize,
    options: &ConvertOptions,
    out: &mut String,
) {
    let mut index = 0usize;
    for child in node.children() {
        if !child.is_element() || child.tag() != "li" {
            continue;
        }
        index += 1;
        for _ in 0..depth {
            out.push_str("  ");
        }
        if ordered {
            out.push_str(&format!("{index}. "));
        } else {
            out.push(options.bullet_marker);
            out.push(' ');
        }
        out.push_str(&item_text(&child, options));
        out.push('\n');
        for nested in child.children() {
            if nested.is_element() && matches!(nested.tag().as_str(), "ul" | "ol") {
                render_list(&nested, nested.tag() == "ol", depth + 1, options, out);
            }
        }
    }
}

/// Inline content of a list item, excluding nested lists.
fn item_text(node: &NodeRef, options: &ConvertOptions) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            push_inline_text(&child.text_content(), &mut out);
        } else if !matches!(child.tag().as_str(), "ul" | "ol") {
            out.push_str(&render_inline(&child, options));
        }
    }
    out.trim().to_string()
}

/// Inline content of an element, children rendered in order.
fn inline_content(node: &NodeRef, options: &ConvertOptions) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            push_inline_text(&child.text_content(), &mut out);
        } else {
            out.push_str(&render_inline(&child, options));
        }
    }
    out.trim().to_string()
}

fn render_inline(node: &NodeRef, options: &ConvertOptions) -> String {
    let tag = node.tag();
    if options.strip_tags.contains(&tag.as_str()) {
        return String::new();
    }
    match tag.as_str() {
        "br" => "\n".to_string(),
        "strong" | "b" => {
            let inner = inline_content(node, options);
            if inner.is_empty() {
                inner
            } else {
                format!("**{inner}**")
            }
        }
        "em" | "i" => {
            let inner = inline_content(node, options);
            if inner.is_empty() {
                inner
            } else {
                format!("{d}{inner}{d}", d = options.em_delimiter)
            }
        }
        "code" => {
            let inner = node.text_content();
            let inner = inner.trim();
            if inner.is_empty() {
                String::new()
            } else {
                format!("`{inner}`")
            }
        }
        "a" => {
            let inner = inline_content(node, options);
            match node.attr("href") {
                Some(href) if !inner.is_empty() => format!("[{inner}]({href})"),
                _ => inner,
            }
        }
        // Block element in inline position: fall back to its text.
        _ if is_block(&tag) => {
            let mut out = String::new();
            render_blocks(node, options, &mut out);
            out
        }
        // span and other unknown inline tags are transparent.
        _ => inline_content(node, options),
    }
}

/// Append text with whitespace runs collapsed, preserving a single
/// boundary space where the source had one.
fn push_inline_text(text: &str, out: &mut String) {
    if text.trim().is_empty() {
        if !out.is_empty() && !out.ends_with(char::is_whitespace) && !text.is_empty() {
            out.push(' ');
        }
        return;
    }
    if text.starts_with(char::is_whitespace)
        && !out.is_empty()
        && !out.ends_with(char::is_whitespace)
    {
        out.push(' ');
    }
    out.push_str(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Node;

    fn convert(node: &NodeRef) -> String {
        DomMarkdownConverter::new().convert(node, &ConvertOptions::default())
    }

    fn el(tag: &str) -> NodeRef {
        Node::new_element(tag)
    }

    fn text_el(tag: &str, text: &str) -> NodeRef {
        let node = el(tag);
        node.append_child(&Node::new_text(text));
        node
    }

    #[test]
    fn headings_use_atx_markers() {
        let root = el("div");
        root.append_child(&text_el("h1", "Title"));
        root.append_child(&text_el("h3", "Section"));
        root.append_child(&text_el("p", "Body text."));
        assert_eq!(convert(&root), "# Title\n\n### Section\n\nBody text.");
    }

    #[test]
    fn pre_becomes_fenced_code_block() {
        let root = el("div");
        root.append_child(&text_el("pre", "let x = 1;\nlet y = 2;"));
        assert_eq!(convert(&root), "```\nlet x = 1;\nlet y = 2;\n```");
    }

    #[test]
    fn inline_code_uses_backticks() {
        let p = el("p");
        p.append_child(&Node::new_text("run "));
        p.append_child(&text_el("code", "cargo doc"));
        p.append_child(&Node::new_text(" first"));
        assert_eq!(convert(&p), "run `cargo doc` first");
    }

    #[test]
    fn unordered_list_uses_dash_marker() {
        let ul = el("ul");
        ul.append_child(&text_el("li", "first"));
        ul.append_child(&text_el("li", "second"));
        assert_eq!(convert(&ul), "- first\n- second");
    }

    #[test]
    fn ordered_list_numbers_items() {
        let ol = el("ol");
        ol.append_child(&text_el("li", "alpha"));
        ol.append_child(&text_el("li", "beta"));
        assert_eq!(convert(&ol), "1. alpha\n2. beta");
    }

    #[test]
    fn nested_list_indents() {
        let ul = el("ul");
        let li = text_el("li", "outer");
        let inner = el("ul");
        inner.append_child(&text_el("li", "inner"));
        li.append_child(&inner);
        ul.append_child(&li);
        assert_eq!(convert(&ul), "- outer\n  - inner");
    }

    #[test]
    fn emphasis_and_strong_delimiters() {
        let p = el("p");
        p.append_child(&text_el("strong", "bold"));
        p.append_child(&Node::new_text(" and "));
        p.append_child(&text_el("em", "leaning"));
        assert_eq!(convert(&p), "**bold** and _leaning_");
    }

    #[test]
    fn links_render_with_href() {
        let p = el("p");
        p.append_child(&Node::new_text("see "));
        let a = text_el("a", "the docs");
        a.set_attr("href", "https://example.test/docs");
        p.append_child(&a);
        assert_eq!(convert(&p), "see [the docs](https://example.test/docs)");
    }

    #[test]
    fn link_without_href_keeps_text_only() {
        let a = text_el("a", "plain");
        let p = el("p");
        p.append_child(&a);
        assert_eq!(convert(&p), "plain");
    }

    #[test]
    fn script_style_noscript_render_as_nothing() {
        let root = el("div");
        root.append_child(&text_el("p", "keep"));
        root.append_child(&text_el("script", "alert(1)"));
        root.append_child(&text_el("style", ".x{color:red}"));
        root.append_child(&text_el("noscript", "enable js"));
        assert_eq!(convert(&root), "keep");
    }

    #[test]
    fn blockquote_prefixes_lines() {
        let root = el("div");
        let bq = el("blockquote");
        bq.append_child(&text_el("p", "quoted line"));
        root.append_child(&bq);
        assert_eq!(convert(&root), "> quoted line");
    }

    #[test]
    fn br_breaks_line_within_paragraph() {
        let p = el("p");
        p.append_child(&Node::new_text("one"));
        p.append_child(&el("br"));
        p.append_child(&Node::new_text("two"));
        assert_eq!(convert(&p), "one\ntwo");
    }

    #[test]
    fn consecutive_divs_become_paragraphs() {
        let root = el("div");
        root.append_child(&text_el("div", "first block"));
        root.append_child(&text_el("div", "second block"));
        assert_eq!(convert(&root), "first block\n\nsecond block");
    }
}
