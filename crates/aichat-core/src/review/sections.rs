//! Splitting of review text into labeled sections.
//!
//! The backend's review prompt asks the model for bold headers in a fixed
//! order. A single scan finds every header and tracks the open section:
//! each header closes the open section and opens its own, and the last one
//! is closed at the end. Text before the first header is a preamble.
//!
//! Header order is not checked. Out-of-order headers still produce one
//! section each, in source order.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

/// Review section kinds, in the order the backend asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    BusinessLogic,
    Bugs,
    Performance,
    Security,
    BestPractices,
    Suggestions,
    OverallRating,
}

impl SectionKind {
    /// Returns all kinds in their expected order.
    pub fn all() -> &'static [SectionKind] {
        &[
            SectionKind::BusinessLogic,
            SectionKind::Bugs,
            SectionKind::Performance,
            SectionKind::Security,
            SectionKind::BestPractices,
            SectionKind::Suggestions,
            SectionKind::OverallRating,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::BusinessLogic => "BUSINESS LOGIC VALIDATION",
            SectionKind::Bugs => "BUGS & LOGICAL ERRORS",
            SectionKind::Performance => "PERFORMANCE ISSUES",
            SectionKind::Security => "SECURITY CONCERNS",
            SectionKind::BestPractices => "BEST PRACTICES",
            SectionKind::Suggestions => "SUGGESTIONS",
            SectionKind::OverallRating => "OVERALL RATING",
        }
    }

    /// Opening tag of the HTML block for this section.
    fn open_tag(&self) -> &'static str {
        match self {
            SectionKind::BusinessLogic => {
                r#"<div class="review-section" style="border-left-color: #7950f2; background: #f3f0ff;">"#
            }
            SectionKind::Bugs => r#"<div class="review-section bugs">"#,
            SectionKind::Performance => r#"<div class="review-section performance">"#,
            SectionKind::Security => r#"<div class="review-section security">"#,
            SectionKind::BestPractices => r#"<div class="review-section best-practices">"#,
            SectionKind::Suggestions => r#"<div class="review-section suggestions">"#,
            SectionKind::OverallRating => r#"<div class="review-section rating">"#,
        }
    }

    /// Regex fragment matching the header text between `**` and `:**`.
    fn header_pattern(&self) -> &'static str {
        match self {
            SectionKind::BusinessLogic => "BUSINESS LOGIC VALIDATION",
            SectionKind::Bugs => "BUGS & LOGICAL ERRORS",
            // Models like to decorate this one with an emoji.
            SectionKind::Performance => r"[^\w\n]*\s*PERFORMANCE ISSUES",
            SectionKind::Security => "SECURITY CONCERNS",
            SectionKind::BestPractices => "BEST PRACTICES",
            SectionKind::Suggestions => "SUGGESTIONS",
            SectionKind::OverallRating => "OVERALL RATING",
        }
    }
}

/// One capture group per kind, in `SectionKind::all()` order.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = SectionKind::all()
        .iter()
        .map(|kind| format!("({})", kind.header_pattern()))
        .collect();
    let pattern = format!(r"\*\*(?:{}):\*\*", alternatives.join("|"));
    Regex::new(&pattern).expect("review header pattern is valid")
});

/// A run of review text under one header (or before any header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewBlock<'a> {
    /// `None` for the preamble before the first header
    pub kind: Option<SectionKind>,
    pub body: &'a str,
}

/// Splits review text into blocks in source order.
///
/// The preamble is only included when non-empty. Every header yields
/// exactly one block, even when its body is empty.
pub fn split_sections(raw: &str) -> Vec<ReviewBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<SectionKind> = None;
    let mut body_start = 0;

    for caps in HEADER_RE.captures_iter(raw) {
        let Some(header) = caps.get(0) else {
            continue;
        };
        let kind = SectionKind::all()
            .iter()
            .enumerate()
            .find_map(|(i, kind)| caps.get(i + 1).map(|_| *kind));

        push_block(&mut blocks, open, &raw[body_start..header.start()]);
        open = kind;
        body_start = header.end();
    }
    push_block(&mut blocks, open, &raw[body_start..]);

    blocks
}

fn push_block<'a>(blocks: &mut Vec<ReviewBlock<'a>>, kind: Option<SectionKind>, body: &'a str) {
    if kind.is_none() && body.is_empty() {
        return;
    }
    blocks.push(ReviewBlock { kind, body });
}

/// Formats review text as HTML with one styled block per section.
///
/// Text is HTML-escaped and newlines become `<br>`.
pub fn format_review_sections(raw: &str) -> String {
    let mut html = String::with_capacity(raw.len() + 256);
    for block in split_sections(raw) {
        match block.kind {
            Some(kind) => {
                html.push_str(kind.open_tag());
                let _ = write!(html, "<h3>{}</h3>", escape_html(kind.title()));
                html.push_str(&text_to_html(block.body));
                html.push_str("</div>");
            }
            None => html.push_str(&text_to_html(block.body)),
        }
    }
    html
}

/// Formats review text for a terminal: one title line per section.
pub fn format_review_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 128);
    for block in split_sections(raw) {
        let body = block.body.trim_matches('\n');
        if let Some(kind) = block.kind {
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = writeln!(out, "== {} ==", kind.title());
        }
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }
    }
    out
}

/// Escapes text for HTML element content.
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

fn text_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}
