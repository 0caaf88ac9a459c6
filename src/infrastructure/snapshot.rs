//! Saved-page snapshots.
//!
//! Exports normally run against a live tree; for offline runs and
//! inspection the CLI loads an HTML snapshot from disk instead. Parsing
//! goes through `scraper` and the result is rebuilt as our own tree so
//! the whole pipeline downstream is identical to the live case.

use std::fs;
use std::path::Path;

use scraper::Html;

use crate::domain::{Document, ExportError, NodeRef, Result};

/// Load and parse a snapshot file. The document URL is derived from the
/// file path.
pub fn load_snapshot(path: &Path) -> Result<Document> {
    let html = fs::read_to_string(path)
        .map_err(|e| ExportError::io(format!("reading {}", path.display()), e))?;
    let url = format!("file://{}", path.display());
    parse_snapshot(&html, &url)
}

/// Parse snapshot HTML into a fresh document with the given URL.
///
/// Comments, doctypes and whitespace-only text are dropped; everything
/// else maps one to one. Parse errors do not fail the load, the tree the
/// parser recovered is used as-is.
pub fn parse_snapshot(html: &str, url: &str) -> Result<Document> {
    let parsed = Html::parse_document(html);
    let doc = Document::new(url);

    let mut mapped_root = false;
    for child in parsed.tree.root().children() {
        if let scraper::Node::Element(el) = child.value() {
            if el.name() == "html" {
                for (name, value) in el.attrs() {
                    doc.root().set_attr(name, value);
                }
                for grandchild in child.children() {
                    copy_node(&doc, grandchild, doc.root());
                }
                mapped_root = true;
            }
        }
    }
    if !mapped_root {
        // Fragment without an html wrapper; hang everything off our root.
        for child in parsed.tree.root().children() {
            copy_node(&doc, child, doc.root());
        }
    }

    // The parser synthesizes an html/head/body skeleton even for empty
    // input, so presence of children proves nothing. Content means a text
    // node (whitespace-only ones were dropped above) or any element beyond
    // the skeleton.
    let has_content = doc.root().descendants().into_iter().any(|n| {
        n.is_text() || !matches!(n.tag().as_str(), "head" | "body")
    });
    if !has_content {
        return Err(ExportError::Snapshot {
            message: format!("no content parsed from {url}"),
        });
    }
    Ok(doc)
}

fn copy_node(doc: &Document, src: ego_tree::NodeRef<'_, scraper::Node>, parent: &NodeRef) {
    match src.value() {
        scraper::Node::Element(el) => {
            let node = doc.create_element(el.name());
            for (name, value) in el.attrs() {
                node.set_attr(name, value);
            }
            parent.append_child(&node);
            for child in src.children() {
                copy_node(doc, child, &node);
            }
        }
        scraper::Node::Text(text) => {
            if !text.trim().is_empty() {
                parent.append_child(&doc.create_text(&text));
            }
        }
        // Comments, doctypes and processing instructions carry no content.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Notebook</title><style>.x{}</style></head>
<body>
  <!-- chrome comment -->
  <div role="main">
    <div class="message"><p>what is in the sources</p></div>
    <div class="message"><p>the sources describe three things</p></div>
  </div>
</body>
</html>"#;

    #[test]
    fn parses_elements_attributes_and_text() {
        let doc = parse_snapshot(SAMPLE, "file:///tmp/page.html").unwrap();
        assert_eq!(doc.url(), "file:///tmp/page.html");
        assert_eq!(doc.root().attr("lang").as_deref(), Some("en"));

        let main = doc
            .root()
            .descendants()
            .into_iter()
            .find(|n| n.attr("role").as_deref() == Some("main"))
            .unwrap();
        let messages: Vec<_> = main
            .descendants()
            .into_iter()
            .filter(|n| n.has_class("message"))
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].normalized_text(), "what is in the sources");
    }

    #[test]
    fn comments_and_whitespace_text_are_dropped() {
        let doc = parse_snapshot(SAMPLE, "file:///tmp/page.html").unwrap();
        let all_text: String = doc.root().text_content();
        assert!(!all_text.contains("chrome comment"));
        for node in doc.root().descendants() {
            if node.is_text() {
                assert!(!node.text_content().trim().is_empty());
            }
        }
    }

    #[test]
    fn empty_input_is_a_snapshot_error() {
        let err = parse_snapshot("", "file:///tmp/empty.html").unwrap_err();
        assert!(matches!(err, ExportError::Snapshot { .. }));
    }

    #[test]
    fn skeleton_only_input_is_a_snapshot_error() {
        // The parser invents html/head/body for inputs like these, so the
        // guard has to look past the skeleton, not count root children.
        for html in ["   \n\t  ", "<html><head></head><body>  </body></html>"] {
            let err = parse_snapshot(html, "file:///tmp/blank.html").unwrap_err();
            assert!(matches!(err, ExportError::Snapshot { .. }), "input: {html:?}");
        }
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let err = load_snapshot(Path::new("/nonexistent/snapshot.html")).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn fragment_without_html_wrapper_still_parses() {
        let doc =
            parse_snapshot("<div class=\"messages\"><p>hi</p></div>", "file:///f.html");
        // html5ever wraps fragments in html/body during document parsing,
        // either shape is fine as long as the content is reachable.
        let doc = doc.unwrap();
        assert!(doc.root().text_content().contains("hi"));
    }
}
