use super::classify::{classify, derive_id, Category};

/// Marker that opens a second-level heading.
const HEADING_MARKER: &str = "\n## ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub content: String,
}

impl Section {
    pub fn id(&self) -> String {
        derive_id(&self.title)
    }

    pub fn category(&self) -> Category {
        classify(&self.title)
    }
}

/// Split a markdown document into `## ` sections, in document order.
///
/// Everything before the first marker is framing text and is dropped. The
/// first line of each fragment is the title; the rest, trimmed, is the content.
pub fn extract_sections(markdown: &str) -> Vec<Section> {
    markdown
        .split(HEADING_MARKER)
        .skip(1)
        .map(|fragment| {
            let (title, body) = fragment.split_once('\n').unwrap_or((fragment, ""));
            Section {
                title: title.trim().to_string(),
                content: body.trim().to_string(),
            }
        })
        .collect()
}

// ── Tests ──
