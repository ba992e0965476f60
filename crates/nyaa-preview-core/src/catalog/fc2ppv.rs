//! fc2ppvdb.com scraper
//!
//! Articles live at `/articles/{numeric id}`. The preview image is the
//! `img` whose `alt` is the id; tags are links under `/tags/`.

use crate::fetcher::RemoteFetcher;
use crate::source::{DataSource, SourceState};
use crate::types::CatalogDocument;

use super::{anchor_texts, fill_template, first_attribute, VIDEO_ID_PLACEHOLDER};

/// Article URL template
pub const URL_TEMPLATE: &str = "https://fc2ppvdb.com/articles/__VIDEO_ID__";

const IMAGE_SELECTOR: &str = r#"main section img[alt="__VIDEO_ID__"]"#;
const TAGS_SELECTOR: &str = "main section a[href]";
const TAG_PATH_PREFIX: &str = "/tags/";

/// Extract the numeric FC2 id from text such as `FC2-PPV-1234567`.
///
/// Text that is already purely numeric is returned unchanged, so ids taken
/// from earlier lookups normalize to themselves.
///
/// # Examples
/// ```
/// use nyaa_preview_core::catalog::normalize_fc2_id;
///
/// assert_eq!(normalize_fc2_id(" FC2-PPV-1234567 ").as_deref(), Some("1234567"));
/// assert_eq!(normalize_fc2_id("fc2ppv 99").as_deref(), None);
/// assert_eq!(normalize_fc2_id("1234567").as_deref(), Some("1234567"));
/// ```
pub fn normalize_fc2_id(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return Some(text.to_string());
    }

    let re = regex_lite::Regex::new(r"(?i)FC2-?PPV-?([0-9]+)").ok()?;
    let caps = re.captures(text)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Data source for fc2ppvdb.com
#[derive(Debug)]
pub struct Fc2PpvSource {
    state: SourceState,
    url_template: String,
}

impl Fc2PpvSource {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self::with_url_template(fetcher, URL_TEMPLATE)
    }

    pub fn with_url_template(fetcher: RemoteFetcher, url_template: &str) -> Self {
        Self {
            state: SourceState::new("fc2ppv", fetcher),
            url_template: url_template.to_string(),
        }
    }
}

impl DataSource for Fc2PpvSource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn normalize_id(&self, raw: &str) -> Option<String> {
        normalize_fc2_id(raw)
    }

    fn source_url(&self, video_id: &str) -> String {
        fill_template(&self.url_template, video_id)
    }

    fn extract_image_url(&self, document: &CatalogDocument, video_id: &str) -> Option<String> {
        let selector = IMAGE_SELECTOR.replace(VIDEO_ID_PLACEHOLDER, video_id);
        let src = first_attribute(&document.html(), &selector, "src")?;
        document.resolve(&src)
    }

    fn extract_tags(&self, document: &CatalogDocument, _video_id: &str) -> Vec<String> {
        anchor_texts(&document.html(), TAGS_SELECTOR, |href| {
            href.starts_with(TAG_PATH_PREFIX)
        })
    }
}
