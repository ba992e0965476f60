//! javdatabase.com scraper

use crate::fetcher::RemoteFetcher;
use crate::source::{DataSource, SourceState};
use crate::types::CatalogDocument;

use super::{anchor_texts, fill_template, first_attribute};

/// Movie page URL template
pub const URL_TEMPLATE: &str = "https://www.javdatabase.com/movies/__VIDEO_ID__/";

const IMAGE_SELECTOR: &str = "#poster-container img";
const TAGS_SELECTOR: &str = "a[href]";
const GENRE_PATH: &str = "/genres/";

/// Extract a studio-style catalog code such as `ABCD-1234`.
///
/// The code is an uppercase label of at least two letters, a dash, and
/// three to six digits, standing as a whole word.
///
/// # Examples
/// ```
/// use nyaa_preview_core::catalog::normalize_catalog_id;
///
/// assert_eq!(normalize_catalog_id("[HD] ABCD-1234 uncut").as_deref(), Some("ABCD-1234"));
/// assert_eq!(normalize_catalog_id("ABCD-12"), None);
/// ```
pub fn normalize_catalog_id(text: &str) -> Option<String> {
    let re = regex_lite::Regex::new(r"\b([A-Z]{2,}-[0-9]{3,6})\b").ok()?;
    let caps = re.captures(text)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Data source for javdatabase.com
#[derive(Debug)]
pub struct JavDatabaseSource {
    state: SourceState,
    url_template: String,
}

impl JavDatabaseSource {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self::with_url_template(fetcher, URL_TEMPLATE)
    }

    pub fn with_url_template(fetcher: RemoteFetcher, url_template: &str) -> Self {
        Self {
            state: SourceState::new("jav-database", fetcher),
            url_template: url_template.to_string(),
        }
    }
}

impl DataSource for JavDatabaseSource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn normalize_id(&self, raw: &str) -> Option<String> {
        normalize_catalog_id(raw)
    }

    fn source_url(&self, video_id: &str) -> String {
        fill_template(&self.url_template, video_id)
    }

    fn extract_image_url(&self, document: &CatalogDocument, _video_id: &str) -> Option<String> {
        let src = first_attribute(&document.html(), IMAGE_SELECTOR, "src")?;
        document.resolve(&src)
    }

    fn extract_tags(&self, document: &CatalogDocument, _video_id: &str) -> Vec<String> {
        anchor_texts(&document.html(), TAGS_SELECTOR, |href| href.contains(GENRE_PATH))
    }
}
