//! Catalog site scrapers
//!
//! One [`DataSource`] per supported catalog:
//! - `fc2ppv`: fc2ppvdb.com articles
//! - `javdatabase`: javdatabase.com movie pages
//! - `missav`: missav.ai watch pages
//!
//! [`SourceRegistry`] builds each of them at most once.

pub mod fc2ppv;
pub mod javdatabase;
pub mod missav;

use std::sync::{Arc, OnceLock};

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::fetcher::RemoteFetcher;
use crate::source::DataSource;

pub use fc2ppv::{normalize_fc2_id, Fc2PpvSource};
pub use javdatabase::{normalize_catalog_id, JavDatabaseSource};
pub use missav::{normalize_missav_id, MissAvSource};

/// Placeholder replaced by the video id in URL templates and selectors
pub const VIDEO_ID_PLACEHOLDER: &str = "__VIDEO_ID__";

/// Substitute a percent-encoded id into a template.
pub fn fill_template(template: &str, video_id: &str) -> String {
    template.replace(VIDEO_ID_PLACEHOLDER, &urlencoding::encode(video_id))
}

/// Value of `attribute` on the first element matching `selector`.
pub(crate) fn first_attribute(html: &Html, selector: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    html.select(&selector)
        .next()?
        .value()
        .attr(attribute)
        .map(str::to_string)
}

/// Text of every anchor matching `selector` whose `href` passes `keep`.
///
/// The href test decides what counts as a tag; the selector alone is often
/// as broad as `a[href]`.
pub(crate) fn anchor_texts(html: &Html, selector: &str, keep: impl Fn(&str) -> bool) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    html.select(&selector)
        .filter(|anchor| anchor.value().attr("href").is_some_and(&keep))
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// The closed set of supported catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Fc2Ppv,
    JavDatabase,
    MissAv,
}

/// URL templates per catalog, each containing [`VIDEO_ID_PLACEHOLDER`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub fc2_ppv: String,
    pub jav_database: String,
    pub miss_av: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            fc2_ppv: fc2ppv::URL_TEMPLATE.to_string(),
            jav_database: javdatabase::URL_TEMPLATE.to_string(),
            miss_av: missav::URL_TEMPLATE.to_string(),
        }
    }
}

/// Lazily built, one-per-kind data sources
///
/// Each kind owns a single popover, so handing out one shared instance per
/// kind keeps at most one popover per catalog.
pub struct SourceRegistry {
    fetcher: RemoteFetcher,
    urls: SourceUrls,
    fc2_ppv: OnceLock<Arc<dyn DataSource>>,
    jav_database: OnceLock<Arc<dyn DataSource>>,
    miss_av: OnceLock<Arc<dyn DataSource>>,
}

impl SourceRegistry {
    pub fn new(fetcher: RemoteFetcher, urls: SourceUrls) -> Self {
        Self {
            fetcher,
            urls,
            fc2_ppv: OnceLock::new(),
            jav_database: OnceLock::new(),
            miss_av: OnceLock::new(),
        }
    }

    /// The instance for `kind`, built on first use.
    pub fn get(&self, kind: SourceKind) -> Arc<dyn DataSource> {
        let slot = match kind {
            SourceKind::Fc2Ppv => &self.fc2_ppv,
            SourceKind::JavDatabase => &self.jav_database,
            SourceKind::MissAv => &self.miss_av,
        };
        Arc::clone(slot.get_or_init(|| self.build(kind)))
    }

    /// Whether the instance for `kind` has been built yet
    pub fn is_built(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Fc2Ppv => self.fc2_ppv.get().is_some(),
            SourceKind::JavDatabase => self.jav_database.get().is_some(),
            SourceKind::MissAv => self.miss_av.get().is_some(),
        }
    }

    fn build(&self, kind: SourceKind) -> Arc<dyn DataSource> {
        let fetcher = self.fetcher.clone();
        match kind {
            SourceKind::Fc2Ppv => Arc::new(Fc2PpvSource::with_url_template(fetcher, &self.urls.fc2_ppv)),
            SourceKind::JavDatabase => Arc::new(JavDatabaseSource::with_url_template(
                fetcher,
                &self.urls.jav_database,
            )),
            SourceKind::MissAv => Arc::new(MissAvSource::with_url_template(fetcher, &self.urls.miss_av)),
        }
    }
}
