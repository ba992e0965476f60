//! The floating preview owned by a data source

use crate::types::{Point, PopoverContent, PopoverView, POPOVER_ELEMENT_ID};

/// Vertical gap between the anchor point and the popover's top edge
const VERTICAL_OFFSET: f64 = 30.0;

/// Visibility, placement and content of a source's single popover element.
#[derive(Debug, Clone, PartialEq)]
pub struct Popover {
    visible: bool,
    position: Point,
    target: Option<String>,
    content: PopoverContent,
}

impl Popover {
    /// A fresh popover, off-screen until placed.
    pub fn new() -> Self {
        Self {
            visible: false,
            position: Point::OFFSCREEN,
            target: None,
            content: PopoverContent::Loading,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn content(&self) -> &PopoverContent {
        &self.content
    }

    /// Make the popover visible for `video_id` while its data resolves.
    pub fn open(&mut self, video_id: &str) {
        if self.target.as_deref() != Some(video_id) {
            self.content = PopoverContent::Loading;
        }
        self.target = Some(video_id.to_string());
        self.visible = true;
    }

    /// Apply resolved content. Ignored when the popover has since been
    /// opened for another id, so the latest hover always wins.
    pub fn render(&mut self, video_id: &str, content: PopoverContent) -> bool {
        if self.target.as_deref() != Some(video_id) {
            return false;
        }
        self.content = content;
        true
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Place the popover just below `anchor`.
    pub fn place(&mut self, anchor: Point) {
        self.position = Point::new(anchor.x, anchor.y + VERTICAL_OFFSET);
    }

    pub fn view(&self, source: &str) -> PopoverView {
        PopoverView {
            element_id: POPOVER_ELEMENT_ID.to_string(),
            content_element_ids: self
                .content
                .element_ids()
                .iter()
                .map(|id| id.to_string())
                .collect(),
            source: source.to_string(),
            video_id: self.target.clone(),
            visible: self.visible,
            position: self.position,
            content: self.content.clone(),
        }
    }
}

impl Default for Popover {
    fn default() -> Self {
        Self::new()
    }
}
