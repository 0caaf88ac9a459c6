//! Markdown assembly.
//!
//! Turns extracted units into a single Markdown document with front-matter.
//! The HTML-to-Markdown text transformation itself is delegated to an
//! injectable collaborator; this module owns document structure, filename
//! derivation and whitespace normalization.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::domain::{NodeRef, Transcript};

/// Fixed configuration handed to the conversion collaborator.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Heading marker for ATX-style headings.
    pub heading_marker: char,
    /// Fence used around code blocks.
    pub code_fence: &'static str,
    /// Bullet marker for unordered lists.
    pub bullet_marker: char,
    /// Delimiter for emphasis spans.
    pub em_delimiter: char,
    /// Tags whose content is replaced with empty output.
    pub strip_tags: &'static [&'static str],
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            heading_marker: '#',
            code_fence: "```",
            bullet_marker: '-',
            em_delimiter: '_',
            strip_tags: &["script", "style", "noscript"],
        }
    }
}

/// HTML-to-Markdown conversion collaborator.
pub trait MarkdownConvert {
    /// Convert a content subtree to Markdown body text.
    fn convert(&self, node: &NodeRef, options: &ConvertOptions) -> String;
}

/// Maximum length of a filename slug, in characters.
const SLUG_MAX_CHARS: usize = 50;

/// Assembles transcripts and single items into exportable documents.
pub struct MarkdownAssembler {
    source_label: String,
    file_prefix: String,
    options: ConvertOptions,
    newline_runs: Option<Regex>,
}

impl MarkdownAssembler {
    #[must_use]
    pub fn new(source_label: &str, file_prefix: &str) -> Self {
        Self {
            source_label: source_label.to_string(),
            file_prefix: file_prefix.to_string(),
            options: ConvertOptions::default(),
            newline_runs: Regex::new(r"\n{3,}").ok(),
        }
    }

    /// Assemble a conversation transcript: front-matter, document heading,
    /// one `##` heading per unit naming its role, horizontal rules between
    /// units but not after the last.
    #[must_use]
    pub fn assemble(
        &self,
        convert: &dyn MarkdownConvert,
        transcript: &Transcript,
        now: DateTime<Utc>,
    ) -> String {
        let mut out = self.front_matter(now, None);
        out.push_str(&format!("# {} Conversation\n\n", self.source_label));
        out.push_str(&format!(
            "Exported: {}\n\n---\n\n",
            now.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let count = transcript.len();
        for (index, unit) in transcript.iter().enumerate() {
            out.push_str(&format!("## {}\n\n", unit.role));
            let body = convert.convert(&unit.content, &self.options);
            out.push_str(body.trim());
            out.push_str("\n\n");
            if index + 1 < count {
                out.push_str("---\n\n");
            }
        }

        self.collapse(&out)
    }

    /// Assemble a single Studio item: front-matter carrying the raw title,
    /// the title as top heading, then the converted body directly.
    #[must_use]
    pub fn assemble_single_item(
        &self,
        convert: &dyn MarkdownConvert,
        title: &str,
        content: &NodeRef,
        now: DateTime<Utc>,
    ) -> String {
        let mut out = self.front_matter(now, Some(title));
        out.push_str(&format!("# {title}\n\n"));
        out.push_str(&format!(
            "Exported: {}\n\n",
            now.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(convert.convert(content, &self.options).trim());
        out.push('\n');
        self.collapse(&out)
    }

    /// Filename for a chat export.
    #[must_use]
    pub fn chat_filename(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}-chat-{}-{}.md",
            self.file_prefix,
            now.format("%Y-%m-%d"),
            now.format("%H-%M-%S")
        )
    }

    /// Filename for a Studio item export.
    #[must_use]
    pub fn studio_filename(&self, title: &str, now: DateTime<Utc>) -> String {
        let mut slug = slugify(title);
        if slug.is_empty() {
            slug.push_str("untitled");
        }
        format!(
            "{}-studio-{}-{}.md",
            self.file_prefix,
            slug,
            now.format("%Y-%m-%d")
        )
    }

    fn front_matter(&self, now: DateTime<Utc>, title: Option<&str>) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!(
            "exported: {}\n",
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        out.push_str(&format!("source: {}\n", self.source_label));
        if let Some(title) = title {
            out.push_str(&format!("title: {title}\n"));
        }
        out.push_str("---\n\n");
        out
    }

    /// Collapse runs of 3+ newlines to exactly 2; the conversion
    /// collaborator leaves whitespace artifacts behind.
    fn collapse(&self, text: &str) -> String {
        self.newline_runs
            .as_ref()
            .map_or_else(|| text.to_string(), |re| re.replace_all(text, "\n\n").into_owned())
    }
}

/// Derive a filename slug: lower-case, map every run of characters outside
/// `[a-z0-9]` (CJK ideographs preserved) to a single dash, trim edge dashes,
/// truncate to 50 characters.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        let keep = c.is_ascii_lowercase() || c.is_ascii_digit() || is_cjk(c);
        if keep {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out.chars().take(SLUG_MAX_CHARS).collect()
}

/// CJK Unified Ideographs block, preserved in slugs.
const fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}')
}
