//! Page metadata extraction from raw diagram XML (PRD-84).
//!
//! Scans a serialized `<mxfile>` document for `<diagram ...>` page boundary
//! markers and produces ordered page descriptors. This is advisory metadata,
//! not integrity-critical: extraction never fails, and a document with no
//! recognizable markers (including the empty string) degrades to a single
//! synthesized default page.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_PAGE_NAME: &str = "Page";
const DEFAULT_PAGE_ID_PREFIX: &str = "page-";

/// One page boundary found in a document, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: String,
    pub name: String,
    pub index: usize,
}

/// Derived page metadata captured on a version row at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub page_count: i32,
    pub page_names: Vec<String>,
    pub pages: Vec<PageInfo>,
}

fn diagram_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<diagram\b([^>]*)>").expect("diagram tag regex"))
}

fn id_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("id attr regex"))
}

fn name_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("name attr regex")
    })
}

/// Decode the five predefined XML entities. Pure string substitution; any
/// other `&...;` sequence passes through unchanged.
fn decode_xml_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn extract_attribute(attrs: &str, re: &Regex) -> Option<String> {
    re.captures(attrs).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}

fn normalize_page_id(raw: Option<String>, index: usize) -> String {
    match raw {
        Some(raw) => {
            let decoded = decode_xml_entities(&raw);
            let trimmed = decoded.trim();
            if trimmed.is_empty() {
                format!("{DEFAULT_PAGE_ID_PREFIX}{}", index + 1)
            } else {
                trimmed.to_string()
            }
        }
        None => format!("{DEFAULT_PAGE_ID_PREFIX}{}", index + 1),
    }
}

fn normalize_page_name(raw: Option<String>, index: usize) -> String {
    match raw {
        Some(raw) => {
            let decoded = decode_xml_entities(&raw);
            let trimmed = decoded.trim();
            if trimmed.is_empty() {
                format!("{DEFAULT_PAGE_NAME} {}", index + 1)
            } else {
                trimmed.to_string()
            }
        }
        None => format!("{DEFAULT_PAGE_NAME} {}", index + 1),
    }
}

/// Extract page descriptors from raw document XML, in document order.
///
/// Attribute order and quote style are irrelevant; missing or empty `id` /
/// `name` attributes are synthesized positionally. Returns an empty vector
/// when no boundary markers are present.
pub fn extract_pages(xml: &str) -> Vec<PageInfo> {
    if xml.trim().is_empty() {
        return Vec::new();
    }

    diagram_tag_regex()
        .captures_iter(xml)
        .enumerate()
        .map(|(index, caps)| {
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            PageInfo {
                id: normalize_page_id(extract_attribute(attrs, id_attr_regex()), index),
                name: normalize_page_name(extract_attribute(attrs, name_attr_regex()), index),
                index,
            }
        })
        .collect()
}

/// Build the full page metadata summary for a document.
///
/// The single fallback path: zero markers yield exactly one synthesized
/// default page. Never fails.
pub fn build_page_metadata(xml: &str) -> PageMetadata {
    let pages = extract_pages(xml);
    if pages.is_empty() {
        let default_page = PageInfo {
            id: "page-1".to_string(),
            name: "Page 1".to_string(),
            index: 0,
        };
        return PageMetadata {
            page_count: 1,
            page_names: vec![default_page.name.clone()],
            pages: vec![default_page],
        };
    }

    PageMetadata {
        page_count: pages.len() as i32,
        page_names: pages.iter().map(|p| p.name.clone()).collect(),
        pages,
    }
}

/// Merge caller-supplied page metadata overrides with extracted metadata.
///
/// `user_page_count` must be at least 1 when present. `user_page_names` must
/// contain no blank entries; names (user-supplied or extracted) are truncated
/// to the resolved page count.
pub fn resolve_page_metadata(
    xml: &str,
    user_page_count: Option<i32>,
    user_page_names: Option<&[String]>,
) -> Result<PageMetadata, CoreError> {
    let mut meta = build_page_metadata(xml);

    let page_count = match user_page_count {
        Some(count) if count < 1 => {
            return Err(CoreError::InvalidPageCount(format!(
                "page count must be at least 1, got {count}"
            )));
        }
        Some(count) => count,
        None => meta.page_count,
    };

    let page_names = match user_page_names {
        Some(names) => {
            for (index, name) in names.iter().enumerate() {
                if name.trim().is_empty() {
                    return Err(CoreError::InvalidPageNames(format!(
                        "page name at index {index} must not be blank"
                    )));
                }
            }
            names.iter().take(page_count as usize).cloned().collect()
        }
        None => meta
            .page_names
            .iter()
            .take(page_count as usize)
            .cloned()
            .collect(),
    };

    meta.page_count = page_count;
    meta.page_names = page_names;
    Ok(meta)
}
