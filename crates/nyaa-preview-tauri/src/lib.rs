//! Nyaa Hover Preview Tauri Integration
//!
//! This crate exposes the hover preview engine to a Tauri 2.0 webview. The
//! frontend forwards listing events (row hover, pointer move, anchor leave,
//! auxiliary click) and renders the popover snapshots it gets back.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nyaa_preview_tauri::PreviewState;
//! use tauri::Manager;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .setup(|app| {
//!             app.manage(PreviewState::new()?);
//!             Ok(())
//!         })
//!         .invoke_handler(tauri::generate_handler![
//!             nyaa_preview_tauri::commands::hover_row,
//!             nyaa_preview_tauri::commands::move_pointer,
//!             nyaa_preview_tauri::commands::leave_anchor,
//!             nyaa_preview_tauri::commands::aux_click,
//!         ])
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! # Commands
//! - `hover_row` - A listing row was hovered; returns the popover to draw
//! - `move_pointer` - Reposition the active popover
//! - `leave_anchor` - Hide the active popover
//! - `aux_click` - Resolve a middle-click into a navigation

pub mod commands;

use std::sync::Arc;

use nyaa_preview_core::{HoverController, PreviewConfig};

/// Shared hover controller managed by Tauri.
///
/// The controller synchronizes internally, so commands use it without an
/// outer lock.
pub struct PreviewState {
    controller: Arc<HoverController>,
}

impl PreviewState {
    /// Create a PreviewState with the default configuration.
    ///
    /// # Errors
    /// Returns an error string if the controller cannot be created.
    pub fn new() -> Result<Self, String> {
        Self::with_config(&PreviewConfig::default())
    }

    /// Create a PreviewState from a JSON configuration document.
    ///
    /// # Errors
    /// Returns an error string if the JSON is invalid or a pattern does not compile.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config = PreviewConfig::from_json(json).map_err(|e| e.to_string())?;
        Self::with_config(&config)
    }

    /// Create a PreviewState with a custom configuration.
    ///
    /// # Errors
    /// Returns an error string if the controller cannot be created.
    pub fn with_config(config: &PreviewConfig) -> Result<Self, String> {
        let controller = HoverController::new(config).map_err(|e| e.to_string())?;
        tracing::info!(patterns = config.patterns.len(), "hover preview ready");
        Ok(Self {
            controller: Arc::new(controller),
        })
    }

    /// Get a reference to the inner controller.
    pub fn controller(&self) -> &Arc<HoverController> {
        &self.controller
    }
}
