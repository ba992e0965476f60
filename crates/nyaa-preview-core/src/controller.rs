//! Hover event controller
//!
//! Translates host page events into data source calls. The state the host
//! would otherwise keep in globals (active source, active id, magnet link)
//! lives in [`HoverState`], a plain state machine that can be driven
//! without a page:
//!
//! ```text
//! Idle --hover matching row--> Matched --popover rendered--> PopoverShown
//!   ^                            |  ^                              |
//!   +------ hover other row -----+  +---- hover matching row ------+
//!   +------------------------- mouse leaves anchor ----------------+
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::SourceRegistry;
use crate::client::{HttpTransport, Transport};
use crate::config::PreviewConfig;
use crate::error::Result;
use crate::fetcher::RemoteFetcher;
use crate::matcher::{PatternMatch, PatternMatcher};
use crate::source::{lock, DataSource};
use crate::types::{AuxClick, HoveredRow, Navigation, Point, PopoverView};

/// Where the hover interaction currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverPhase {
    #[default]
    Idle,
    Matched,
    PopoverShown,
}

/// The row the user last hovered that matched a catalog pattern
#[derive(Clone)]
pub struct ActiveTarget {
    pub pattern: String,
    pub video_id: String,
    pub source: Arc<dyn DataSource>,
}

impl ActiveTarget {
    fn same_source(&self, other: &ActiveTarget) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl From<PatternMatch> for ActiveTarget {
    fn from(found: PatternMatch) -> Self {
        Self {
            pattern: found.pattern,
            video_id: found.video_id,
            source: found.source,
        }
    }
}

impl fmt::Debug for ActiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveTarget")
            .field("pattern", &self.pattern)
            .field("video_id", &self.video_id)
            .field("source", &self.source.name())
            .finish()
    }
}

/// What an auxiliary click should do
#[derive(Debug, Clone)]
pub enum ClickAction {
    /// Navigate to the row's magnet link
    OpenMagnet(String),
    /// Open the active target's catalog page
    OpenCatalog(ActiveTarget),
    Ignore,
}

/// Hover/leave/click state, updated only through its transition methods
#[derive(Debug, Default)]
pub struct HoverState {
    phase: HoverPhase,
    active: Option<ActiveTarget>,
    magnet_link: Option<String>,
}

impl HoverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> HoverPhase {
        self.phase
    }

    pub fn active(&self) -> Option<&ActiveTarget> {
        self.active.as_ref()
    }

    pub fn magnet_link(&self) -> Option<&str> {
        self.magnet_link.as_deref()
    }

    /// A listing row was hovered.
    ///
    /// Returns the previously active source when its popover has to be hidden
    /// because the new row uses another source or none.
    pub fn hover(
        &mut self,
        magnet_link: Option<String>,
        target: Option<ActiveTarget>,
    ) -> Option<Arc<dyn DataSource>> {
        self.magnet_link = magnet_link;
        let previous = self.active.take();

        self.phase = if target.is_some() {
            HoverPhase::Matched
        } else {
            HoverPhase::Idle
        };
        self.active = target;

        let previous = previous?;
        match &self.active {
            Some(current) if current.same_source(&previous) => None,
            _ => Some(previous.source),
        }
    }

    /// The popover for `target` finished rendering.
    ///
    /// Ignored when another row has been hovered or the pointer left since.
    pub fn popover_shown(&mut self, target: &ActiveTarget) -> bool {
        let still_active = self
            .active
            .as_ref()
            .is_some_and(|active| active.same_source(target) && active.video_id == target.video_id);

        if still_active && self.phase == HoverPhase::Matched {
            self.phase = HoverPhase::PopoverShown;
            return true;
        }
        false
    }

    /// The pointer left an anchor. Returns the source whose popover to hide.
    ///
    /// The target stays known so a middle-click right after still opens it.
    pub fn leave(&mut self) -> Option<Arc<dyn DataSource>> {
        self.phase = HoverPhase::Idle;
        self.active.as_ref().map(|active| Arc::clone(&active.source))
    }

    pub fn active_source(&self) -> Option<Arc<dyn DataSource>> {
        self.active.as_ref().map(|active| Arc::clone(&active.source))
    }

    /// Decide what an auxiliary click does.
    pub fn click(&self, click: AuxClick) -> ClickAction {
        if !click.is_middle() {
            return ClickAction::Ignore;
        }
        if click.modifier {
            if let Some(magnet) = &self.magnet_link {
                return ClickAction::OpenMagnet(magnet.clone());
            }
        }
        match &self.active {
            Some(active) => ClickAction::OpenCatalog(active.clone()),
            None => ClickAction::Ignore,
        }
    }
}

/// Drives data sources from host page events
pub struct HoverController {
    matcher: PatternMatcher,
    state: Mutex<HoverState>,
}

impl HoverController {
    /// Create a controller backed by the HTTP transport.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created or a pattern
    /// does not compile.
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(&config.client)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a controller with a custom transport.
    ///
    /// # Errors
    /// Returns an error if a pattern does not compile.
    pub fn with_transport(config: &PreviewConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let registry = SourceRegistry::new(RemoteFetcher::new(transport), config.sources.clone());
        let matcher = PatternMatcher::new(&config.patterns, registry)?;
        Ok(Self {
            matcher,
            state: Mutex::new(HoverState::new()),
        })
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    pub fn phase(&self) -> HoverPhase {
        lock(&self.state).phase()
    }

    pub fn magnet_link(&self) -> Option<String> {
        lock(&self.state).magnet_link().map(str::to_string)
    }

    pub fn active_video_id(&self) -> Option<String> {
        lock(&self.state)
            .active()
            .map(|active| active.video_id.clone())
    }

    /// A table row was hovered; `anchor` is where the popover should appear.
    ///
    /// Rows without a torrent title link are ignored. Returns the popover as
    /// rendered, or `None` when the title carries no known identifier.
    pub async fn on_row_hover(&self, row: &HoveredRow, anchor: Point) -> Option<PopoverView> {
        let title = row.title_link()?;
        let magnet = row.magnet_link().map(str::to_string);
        let target = self.matcher.find(&title.text).map(ActiveTarget::from);

        let stale = lock(&self.state).hover(magnet, target.clone());
        if let Some(stale) = stale {
            stale.hide_popover();
        }

        let target = target?;
        debug!(pattern = %target.pattern, video_id = %target.video_id, "row matched");

        // An existing popover moves right away; a new one is placed once created.
        target.source.set_popover_position(anchor);
        target.source.show_popover(&target.video_id).await;
        target.source.set_popover_position(anchor);

        lock(&self.state).popover_shown(&target);
        target.source.popover()
    }

    /// The pointer moved; keeps the active popover next to it.
    pub fn on_pointer_move(&self, point: Point) -> Option<PopoverView> {
        let source = lock(&self.state).active_source()?;
        source.set_popover_position(point);
        source.popover()
    }

    /// The pointer left an anchor: hide the popover and cancel its fetch.
    pub fn on_anchor_leave(&self) {
        let source = lock(&self.state).leave();
        if let Some(source) = source {
            source.hide_popover();
        }
    }

    /// An auxiliary button was clicked.
    ///
    /// Middle-click with the modifier opens the row's magnet link in place;
    /// a plain middle-click opens the catalog page in a new tab.
    pub fn on_aux_click(&self, click: AuxClick) -> Option<Navigation> {
        let action = lock(&self.state).click(click);
        match action {
            ClickAction::OpenMagnet(magnet) => Some(Navigation::SameTab(magnet)),
            ClickAction::OpenCatalog(target) => match target.source.link(&target.video_id) {
                Ok(url) => Some(Navigation::NewTab(url)),
                Err(error) => {
                    warn!(video_id = %target.video_id, %error, "no catalog link for active row");
                    None
                }
            },
            ClickAction::Ignore => None,
        }
    }
}
