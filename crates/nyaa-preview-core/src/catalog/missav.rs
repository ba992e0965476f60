//! missav.ai scraper
//!
//! Watch pages carry no cover image; the player's `data-poster` serves as
//! the preview instead.

use crate::fetcher::RemoteFetcher;
use crate::source::{DataSource, SourceState};
use crate::types::CatalogDocument;

use super::{anchor_texts, fill_template, first_attribute};

/// Watch page URL template
pub const URL_TEMPLATE: &str = "https://missav.ai/ja/__VIDEO_ID__";

const PLAYER_SELECTOR: &str = "video.player";
const POSTER_ATTRIBUTE: &str = "data-poster";
const TAGS_SELECTOR: &str = "a[href]";
const GENRE_PATH: &str = "/genres/";

/// Extract a catalog code in the site's lowercase URL form, e.g. `abcd-123`.
pub fn normalize_missav_id(text: &str) -> Option<String> {
    let re = regex_lite::Regex::new(r"(?i)\b([A-Z]{2,}-[0-9]{3,6})\b").ok()?;
    let caps = re.captures(text)?;
    Some(caps.get(1)?.as_str().to_ascii_lowercase())
}

/// Data source for missav.ai
#[derive(Debug)]
pub struct MissAvSource {
    state: SourceState,
    url_template: String,
}

impl MissAvSource {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self::with_url_template(fetcher, URL_TEMPLATE)
    }

    pub fn with_url_template(fetcher: RemoteFetcher, url_template: &str) -> Self {
        Self {
            state: SourceState::new("missav", fetcher),
            url_template: url_template.to_string(),
        }
    }
}

impl DataSource for MissAvSource {
    fn state(&self) -> &SourceState {
        &self.state
    }

    fn normalize_id(&self, raw: &str) -> Option<String> {
        normalize_missav_id(raw)
    }

    fn source_url(&self, video_id: &str) -> String {
        fill_template(&self.url_template, video_id)
    }

    fn extract_image_url(&self, document: &CatalogDocument, _video_id: &str) -> Option<String> {
        let poster = first_attribute(&document.html(), PLAYER_SELECTOR, POSTER_ATTRIBUTE)?;
        document.resolve(&poster)
    }

    fn extract_tags(&self, document: &CatalogDocument, _video_id: &str) -> Vec<String> {
        anchor_texts(&document.html(), TAGS_SELECTOR, |href| href.contains(GENRE_PATH))
    }
}
