//! Tauri commands for the hover preview
//!
//! This module contains all Tauri commands that can be invoked from the frontend.

use serde::{Deserialize, Serialize};
use tauri::State;

use crate::PreviewState;
use nyaa_preview_core::{AuxClick, HoveredRow, Navigation, Point, PopoverView, RowLink};

/// A hovered listing row as sent by the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowHover {
    /// Every link in the row, in document order
    pub links: Vec<RowLink>,
    /// Pointer position in page coordinates
    pub x: f64,
    pub y: f64,
}

impl RowHover {
    fn row(&self) -> HoveredRow {
        HoveredRow::new(self.links.clone())
    }

    fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A listing row was hovered.
///
/// # Arguments
/// * `hover` - Links of the row and the pointer position
///
/// # Returns
/// * `Ok(Some(PopoverView))` with the popover to draw
/// * `Ok(None)` if the row is not a torrent row or its title has no known id
#[tauri::command]
pub async fn hover_row(
    state: State<'_, PreviewState>,
    hover: RowHover,
) -> Result<Option<PopoverView>, String> {
    let controller = state.controller();
    Ok(controller.on_row_hover(&hover.row(), hover.anchor()).await)
}

/// The pointer moved over the listing.
///
/// # Returns
/// * `Ok(Some(PopoverView))` with the repositioned popover
/// * `Ok(None)` if no row has been matched yet
#[tauri::command]
pub async fn move_pointer(
    state: State<'_, PreviewState>,
    x: f64,
    y: f64,
) -> Result<Option<PopoverView>, String> {
    Ok(state.controller().on_pointer_move(Point::new(x, y)))
}

/// The pointer left a row anchor. Hides the popover and cancels its fetch.
#[tauri::command]
pub async fn leave_anchor(state: State<'_, PreviewState>) -> Result<(), String> {
    state.controller().on_anchor_leave();
    Ok(())
}

/// An auxiliary mouse button was released.
///
/// # Arguments
/// * `button` - DOM button index (1 is the middle button)
/// * `modifier` - Whether Ctrl or Cmd was held
///
/// # Returns
/// * `Ok(Some(Navigation))` telling the frontend where to go
/// * `Ok(None)` if the click should be left to the page
#[tauri::command]
pub async fn aux_click(
    state: State<'_, PreviewState>,
    button: u8,
    modifier: bool,
) -> Result<Option<Navigation>, String> {
    Ok(state.controller().on_aux_click(AuxClick { button, modifier }))
}
