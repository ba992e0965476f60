//! Data types for the hover preview engine
//!
//! This module contains the values exchanged with the host page: hovered rows,
//! pointer positions, clicks, navigation requests and popover snapshots.
//! Types crossing the host boundary implement Serialize and Deserialize.

use std::sync::Arc;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

/// Id of the container element every popover renders into
pub const POPOVER_ELEMENT_ID: &str = "sukebei-video-preview";
/// Id of the preview image element
pub const PREVIEW_IMAGE_ID: &str = "preview-image";
/// Id of the tag text element
pub const PREVIEW_TAGS_ID: &str = "preview-tags";
/// Id of the error text element
pub const PREVIEW_ERROR_ID: &str = "preview-error-message";

/// A viewport position in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Where a popover sits until it is placed for the first time.
    pub const OFFSCREEN: Point = Point {
        x: -10_000.0,
        y: -10_000.0,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One anchor of a hovered listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLink {
    /// Resolved `href` attribute
    pub href: String,
    /// `textContent` of the anchor
    pub text: String,
}

/// Anchors of the table row under the pointer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoveredRow {
    pub links: Vec<RowLink>,
}

impl HoveredRow {
    pub fn new(links: Vec<RowLink>) -> Self {
        Self { links }
    }

    /// The torrent title link, recognized by its `/view/` path.
    pub fn title_link(&self) -> Option<&RowLink> {
        self.links.iter().find(|link| link.href.contains("/view/"))
    }

    /// The row's magnet link, if it has one.
    pub fn magnet_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.href.starts_with("magnet:"))
            .map(|link| link.href.as_str())
    }
}

/// An auxiliary mouse click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxClick {
    /// `MouseEvent.button` (1 is the middle button)
    pub button: u8,
    /// Whether the modifier key (Ctrl) was held
    pub modifier: bool,
}

impl AuxClick {
    pub const MIDDLE_BUTTON: u8 = 1;

    pub fn is_middle(&self) -> bool {
        self.button == Self::MIDDLE_BUTTON
    }
}

/// Navigation the host should perform after a click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "url")]
pub enum Navigation {
    /// Replace the current location (magnet links hand off to the torrent client)
    SameTab(String),
    /// Open in a new tab
    NewTab(String),
}

/// A successful answer from the remote transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    /// Response body text
    pub body: Arc<str>,
}

/// A fetched catalog page kept in the cache
#[derive(Debug, Clone)]
pub struct CatalogDocument {
    base_url: Option<Url>,
    body: Arc<str>,
}

impl CatalogDocument {
    /// Build a document from a response, resolving links against its URL.
    pub fn from_response(response: &RemoteResponse) -> Self {
        Self {
            base_url: Url::parse(&response.url).ok(),
            body: Arc::clone(&response.body),
        }
    }

    /// Raw HTML text
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body into an HTML tree.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Resolve a possibly relative reference the way a browser resolves `img.src`.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        match &self.base_url {
            Some(base) => base.join(reference).ok().map(String::from),
            None => Url::parse(reference).ok().map(String::from),
        }
    }
}

/// What a popover currently displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PopoverContent {
    /// Waiting for the catalog page
    Loading,
    /// Image and tags resolved
    Preview {
        image_url: String,
        tags: String,
        link: String,
    },
    /// Lookup failed, message shown in the error element
    NotFound { message: String },
}

impl PopoverContent {
    /// Child elements of the popover container this content fills
    pub fn element_ids(&self) -> &'static [&'static str] {
        match self {
            PopoverContent::Loading => &[],
            PopoverContent::Preview { .. } => &[PREVIEW_IMAGE_ID, PREVIEW_TAGS_ID],
            PopoverContent::NotFound { .. } => &[PREVIEW_ERROR_ID],
        }
    }
}

/// Snapshot of a source's popover for the host to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopoverView {
    /// Container element id
    pub element_id: String,
    /// Child elements the content is rendered into, others stay empty
    pub content_element_ids: Vec<String>,
    /// Catalog source owning the popover
    pub source: String,
    /// Raw identifier the popover was last shown for
    pub video_id: Option<String>,
    pub visible: bool,
    pub position: Point,
    pub content: PopoverContent,
}
