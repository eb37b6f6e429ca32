//! Scroll synchronization between the timeline panes.
//!
//! Three panes: the date `Header` (x only), the frozen `LeftBody` with row
//! labels (y only) and the `RightBody` with the bars (x and y). Two pairs
//! are kept aligned: header ↔ right body horizontally, left body ↔ right
//! body vertically.
//!
//! A programmatic write to a pane makes that pane fire its own scroll
//! event (queued here, as a browser or widget toolkit would). Each pair
//! carries a guard so the echo of its own write is swallowed instead of
//! being mirrored back.

use std::collections::VecDeque;

use tracing::{debug, warn};

/// Upper bound on handler invocations for one dispatched event.
const MAX_CASCADE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneId {
    Header,
    LeftBody,
    RightBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScrollError {
    #[error("pane {0:?} is not attached")]
    Detached(PaneId),

    #[error("scroll sync did not settle after {0} handler calls")]
    Runaway(usize),
}

// ---------------------------------------------------------------------------
// Pane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pane {
    pub offset_x: f32,
    pub offset_y: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub attached: bool,
}

impl Pane {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            viewport_width,
            viewport_height,
            content_width: viewport_width,
            content_height: viewport_height,
            attached: true,
        }
    }

    pub fn max_x(&self) -> f32 {
        (self.content_width - self.viewport_width).max(0.0)
    }

    pub fn max_y(&self) -> f32 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    pub fn offset(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.offset_x,
            Axis::Vertical => self.offset_y,
        }
    }

    /// Write one axis, clamped. Returns whether the offset moved; an
    /// unchanged offset fires no scroll event.
    fn set(&mut self, id: PaneId, axis: Axis, value: f32) -> Result<bool, ScrollError> {
        if !self.attached {
            return Err(ScrollError::Detached(id));
        }
        let (slot, max) = match axis {
            Axis::Horizontal => (&mut self.offset_x, self.content_width - self.viewport_width),
            Axis::Vertical => (&mut self.offset_y, self.content_height - self.viewport_height),
        };
        let clamped = value.clamp(0.0, max.max(0.0));
        let changed = (*slot - clamped).abs() > f32::EPSILON;
        *slot = clamped;
        Ok(changed)
    }
}

// ---------------------------------------------------------------------------
// Sync guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    /// `from` wrote to its partner; the partner's next event is an echo.
    Syncing { from: PaneId },
}

#[derive(Debug, Clone, Copy)]
struct SyncPair {
    a: PaneId,
    b: PaneId,
    axis: Axis,
    state: SyncState,
}

impl SyncPair {
    fn new(a: PaneId, b: PaneId, axis: Axis) -> Self {
        Self {
            a,
            b,
            axis,
            state: SyncState::Idle,
        }
    }

    fn partner(&self, pane: PaneId) -> Option<PaneId> {
        if pane == self.a {
            Some(self.b)
        } else if pane == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Resets the guard to `Idle` on every exit path unless an echo is
/// actually expected.
struct ResetOnExit<'a> {
    state: &'a mut SyncState,
    expect_echo: bool,
}

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        if !self.expect_echo {
            *self.state = SyncState::Idle;
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Panes {
    header: Pane,
    left: Pane,
    right: Pane,
}

impl Panes {
    fn get(&self, id: PaneId) -> &Pane {
        match id {
            PaneId::Header => &self.header,
            PaneId::LeftBody => &self.left,
            PaneId::RightBody => &self.right,
        }
    }

    fn get_mut(&mut self, id: PaneId) -> &mut Pane {
        match id {
            PaneId::Header => &mut self.header,
            PaneId::LeftBody => &mut self.left,
            PaneId::RightBody => &mut self.right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    panes: Panes,
    horizontal: SyncPair,
    vertical: SyncPair,
    pending: VecDeque<PaneId>,
    handler_calls: usize,
}

impl ScrollCoordinator {
    pub fn new(header: Pane, left: Pane, right: Pane) -> Self {
        Self {
            panes: Panes {
                header,
                left,
                right,
            },
            horizontal: SyncPair::new(PaneId::Header, PaneId::RightBody, Axis::Horizontal),
            vertical: SyncPair::new(PaneId::LeftBody, PaneId::RightBody, Axis::Vertical),
            pending: VecDeque::new(),
            handler_calls: 0,
        }
    }

    /// Panes sized for a grid of `grid_width` × `content_height` pixels.
    pub fn for_grid(
        label_width: f32,
        timeline_width: f32,
        header_height: f32,
        body_height: f32,
        grid_width: f32,
        content_height: f32,
    ) -> Self {
        let mut header = Pane::new(timeline_width, header_height);
        header.content_width = grid_width;
        let mut left = Pane::new(label_width, body_height);
        left.content_height = content_height;
        let mut right = Pane::new(timeline_width, body_height);
        right.content_width = grid_width;
        right.content_height = content_height;
        Self::new(header, left, right)
    }

    pub fn pane(&self, id: PaneId) -> &Pane {
        self.panes.get(id)
    }

    pub fn horizontal_state(&self) -> SyncState {
        self.horizontal.state
    }

    pub fn vertical_state(&self) -> SyncState {
        self.vertical.state
    }

    /// Total handler invocations so far.
    pub fn handler_calls(&self) -> usize {
        self.handler_calls
    }

    pub fn set_attached(&mut self, id: PaneId, attached: bool) {
        self.panes.get_mut(id).attached = attached;
    }

    /// New content size after the grid width or row count changed.
    pub fn resize_content(&mut self, grid_width: f32, content_height: f32) {
        self.panes.header.content_width = grid_width;
        self.panes.right.content_width = grid_width;
        self.panes.left.content_height = content_height;
        self.panes.right.content_height = content_height;
        self.clamp_offsets();
    }

    /// New viewport sizes after the surrounding layout changed. Offsets are
    /// re-clamped in place; no scroll events fire.
    pub fn resize_viewports(&mut self, label_width: f32, timeline_width: f32, header_height: f32, body_height: f32) {
        self.panes.header.viewport_width = timeline_width;
        self.panes.header.viewport_height = header_height;
        self.panes.left.viewport_width = label_width;
        self.panes.left.viewport_height = body_height;
        self.panes.right.viewport_width = timeline_width;
        self.panes.right.viewport_height = body_height;
        self.clamp_offsets();
    }

    fn clamp_offsets(&mut self) {
        for id in [PaneId::Header, PaneId::LeftBody, PaneId::RightBody] {
            let pane = self.panes.get_mut(id);
            pane.offset_x = pane.offset_x.min(pane.max_x());
            pane.offset_y = pane.offset_y.min(pane.max_y());
        }
    }

    /// Put `pos` in the middle of the timeline panes. Both horizontal panes
    /// are written directly, so no sync round-trip happens.
    pub fn center_on(&mut self, pos: f32) {
        let width = self.panes.right.viewport_width;
        let target = (pos - width / 2.0).max(0.0);
        for id in [PaneId::Header, PaneId::RightBody] {
            let pane = self.panes.get_mut(id);
            pane.offset_x = target.min(pane.max_x());
        }
        self.horizontal.state = SyncState::Idle;
        debug!(pos, offset = self.panes.right.offset_x, "centered timeline");
    }

    /// User scroll to an absolute position. Axes the pane doesn't scroll on
    /// are ignored.
    pub fn scroll_to(&mut self, id: PaneId, x: f32, y: f32) -> Result<usize, ScrollError> {
        let mut changed = false;
        if id != PaneId::LeftBody {
            changed |= self.panes.get_mut(id).set(id, Axis::Horizontal, x)?;
        }
        if id != PaneId::Header {
            changed |= self.panes.get_mut(id).set(id, Axis::Vertical, y)?;
        }
        if !changed {
            return Ok(0);
        }
        self.pending.push_back(id);
        self.pump()
    }

    pub fn scroll_by(&mut self, id: PaneId, dx: f32, dy: f32) -> Result<usize, ScrollError> {
        let pane = self.panes.get(id);
        let (x, y) = (pane.offset_x + dx, pane.offset_y + dy);
        self.scroll_to(id, x, y)
    }

    /// Deliver a native scroll event for `id` and everything it triggers.
    /// Returns the number of handler invocations.
    pub fn dispatch(&mut self, id: PaneId) -> Result<usize, ScrollError> {
        self.pending.push_back(id);
        self.pump()
    }

    fn pump(&mut self) -> Result<usize, ScrollError> {
        let mut calls = 0;
        while let Some(id) = self.pending.pop_front() {
            calls += 1;
            if calls > MAX_CASCADE {
                self.reset();
                warn!(calls, "scroll sync runaway, guards reset");
                return Err(ScrollError::Runaway(calls));
            }
            if let Err(e) = self.on_scroll(id) {
                // Queued echoes belong to a write that failed halfway.
                self.reset();
                return Err(e);
            }
        }
        Ok(calls)
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.horizontal.state = SyncState::Idle;
        self.vertical.state = SyncState::Idle;
    }

    /// The scroll handler of pane `id`.
    fn on_scroll(&mut self, id: PaneId) -> Result<(), ScrollError> {
        self.handler_calls += 1;
        let horizontal = Self::sync(&mut self.horizontal, &mut self.panes, &mut self.pending, id);
        let vertical = Self::sync(&mut self.vertical, &mut self.panes, &mut self.pending, id);
        horizontal.and(vertical)
    }

    fn sync(
        pair: &mut SyncPair,
        panes: &mut Panes,
        pending: &mut VecDeque<PaneId>,
        origin: PaneId,
    ) -> Result<(), ScrollError> {
        let Some(target) = pair.partner(origin) else {
            return Ok(());
        };

        if pair.state == (SyncState::Syncing { from: target }) {
            pair.state = SyncState::Idle;
            return Ok(());
        }

        let axis = pair.axis;
        let value = panes.get(origin).offset(axis);
        pair.state = SyncState::Syncing { from: origin };
        let mut guard = ResetOnExit {
            state: &mut pair.state,
            expect_echo: false,
        };

        if panes.get_mut(target).set(target, axis, value)? {
            guard.expect_echo = true;
            pending.push_back(target);
        }
        Ok(())
    }
}
