//! Nyaa Hover Preview Core Library
//!
//! This crate provides the engine behind hover previews on sukebei.nyaa.si
//! torrent listings: hovered titles are matched against identifier
//! patterns, looked up on a catalog site, and rendered as a popover with a
//! cover image and tags.
//!
//! # Features
//! - Pattern-driven selection of the catalog source per title
//! - Catalog sources for fc2ppvdb.com, javdatabase.com and missav.ai
//! - Per-source cache with single-flight fetches and cancellation on hide
//! - Rate-limited HTTP transport
//! - Hover/leave/middle-click controller for the host page

pub mod catalog;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod matcher;
pub mod source;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use catalog::{SourceKind, SourceRegistry, SourceUrls};
pub use client::{ClientConfig, HttpTransport, RateLimiter, Transport};
pub use config::PreviewConfig;
pub use controller::{HoverController, HoverPhase, HoverState};
pub use error::{FetchError, FetchFailure, PreviewError, Result, StateError};
pub use fetcher::{PendingFetch, RemoteFetcher};
pub use matcher::{PatternConfig, PatternMatch, PatternMatcher};
pub use source::{DataSource, SourceState};
pub use types::{
    AuxClick, CatalogDocument, HoveredRow, Navigation, Point, PopoverContent, PopoverView,
    RemoteResponse, RowLink,
};
