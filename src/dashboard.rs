/// Datadeck Dashboard Layout Engine
///
/// Owns widget geometry (position, size, z-order, lock state), the
/// pointer-driven drag/resize state machine, grid-snap quantization, and
/// auto-layout packing. Exactly one interaction (Idle, Dragging, or
/// Resizing) is active across the whole canvas at any time; releasing the
/// pointer always returns to Idle, wherever the pointer is. Tracking is
/// global, not bounded to the canvas element.

use crate::chart::ChartConfig;
use serde::{Deserialize, Serialize};

/// Snap step for drag and resize, in device pixels.
pub const GRID_SIZE: i32 = 20;
/// Minimum widget edge, enforced per axis.
pub const MIN_WIDGET_EDGE: i32 = 100;
pub const DEFAULT_WIDGET_WIDTH: i32 = 380;
pub const DEFAULT_WIDGET_HEIGHT: i32 = 300;
pub const AUTO_LAYOUT_COLUMNS: usize = 3;
pub const AUTO_LAYOUT_MARGIN: i32 = 20;
/// Offset applied by `nudge` and to cascade newly added widgets.
pub const NUDGE_OFFSET: i32 = 40;

/// Canvas placement inputs for translating viewport pointer coordinates to
/// canvas-local ones: local = pointer - origin + scroll.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasFrame {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl CanvasFrame {
    pub fn to_local(&self, pointer: (f64, f64)) -> (f64, f64) {
        (
            pointer.0 - self.origin_x + self.scroll_x,
            pointer.1 - self.origin_y + self.scroll_y,
        )
    }
}

/// A persisted, positioned chart instance on the dashboard canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardItem {
    pub id: u64,
    pub config: ChartConfig,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Render order; higher is in front. Independent of collection order.
    pub z_index: u32,
    /// Locked items ignore drag, resize, nudge, and auto-layout.
    pub locked: bool,
}

/// The single active pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    /// Dragging one widget by its header. The grab offset is the
    /// canvas-local distance from the widget origin to the pointer at
    /// press time, so the widget does not jump under the pointer.
    Dragging { id: u64, grab_dx: f64, grab_dy: f64 },
    /// Resizing one widget by its bottom-right handle.
    Resizing { id: u64 },
}

/// The dashboard: widget collection plus interaction state.
#[derive(Debug, Default)]
pub struct Dashboard {
    items: Vec<DashboardItem>,
    next_id: u64,
    next_z: u32,
    canvas_locked: bool,
    interaction: Interaction,
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle
    }
}

/// Round to the nearest grid step.
fn snap(v: f64) -> i32 {
    (v / GRID_SIZE as f64).round() as i32 * GRID_SIZE
}

impl Dashboard {
    pub fn new() -> Self {
        Dashboard::default()
    }

    pub fn items(&self) -> &[DashboardItem] {
        &self.items
    }

    pub fn item(&self, id: u64) -> Option<&DashboardItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: u64) -> Option<&mut DashboardItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in render order: back to front by z-index, ties by id.
    pub fn items_by_z(&self) -> Vec<&DashboardItem> {
        let mut ordered: Vec<&DashboardItem> = self.items.iter().collect();
        ordered.sort_by_key(|item| (item.z_index, item.id));
        ordered
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_idle(&self) -> bool {
        self.interaction == Interaction::Idle
    }

    pub fn canvas_locked(&self) -> bool {
        self.canvas_locked
    }

    /// Lock or unlock the whole canvas. Locking tears down any active
    /// interaction.
    pub fn set_canvas_locked(&mut self, locked: bool) {
        self.canvas_locked = locked;
        if locked {
            self.interaction = Interaction::Idle;
        }
    }

    // ========================================================================
    // Collection operations
    // ========================================================================

    /// Add a widget for `config`, cascaded from the canvas origin, on top
    /// of everything. Returns the new unique id.
    pub fn add_item(&mut self, config: ChartConfig) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let z_index = self.bump_z();
        let cascade = (self.items.len() as i32 % 8) * NUDGE_OFFSET;
        self.items.push(DashboardItem {
            id,
            config,
            x: cascade,
            y: cascade,
            width: DEFAULT_WIDGET_WIDTH,
            height: DEFAULT_WIDGET_HEIGHT,
            z_index,
            locked: false,
        });
        id
    }

    /// Remove a widget. An interaction in progress on it is torn down.
    pub fn remove_item(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed && self.interaction_target() == Some(id) {
            self.interaction = Interaction::Idle;
        }
        removed
    }

    /// Toggle a widget's lock. Locking a widget mid-interaction tears the
    /// interaction down. Returns the new lock state.
    pub fn toggle_locked(&mut self, id: u64) -> Option<bool> {
        let target = self.interaction_target();
        let item = self.item_mut(id)?;
        item.locked = !item.locked;
        let locked = item.locked;
        if locked && target == Some(id) {
            self.interaction = Interaction::Idle;
        }
        Some(locked)
    }

    /// Replace a widget's chart configuration (committing an edit).
    pub fn set_config(&mut self, id: u64, config: ChartConfig) -> bool {
        match self.item_mut(id) {
            Some(item) => {
                item.config = config;
                true
            }
            None => false,
        }
    }

    /// Raise a widget to the front.
    pub fn bring_forward(&mut self, id: u64) -> bool {
        let z = self.bump_z();
        match self.item_mut(id) {
            Some(item) => {
                item.z_index = z;
                true
            }
            None => false,
        }
    }

    /// Shift a widget down-right by the nudge offset: the lightweight
    /// "push overlapping widgets apart" affordance. Same id, not a copy.
    /// Locked widgets don't move.
    pub fn nudge(&mut self, id: u64) -> bool {
        match self.item_mut(id) {
            Some(item) if !item.locked => {
                item.x += NUDGE_OFFSET;
                item.y += NUDGE_OFFSET;
                true
            }
            _ => false,
        }
    }

    fn bump_z(&mut self) -> u32 {
        self.next_z += 1;
        self.next_z
    }

    fn interaction_target(&self) -> Option<u64> {
        match self.interaction {
            Interaction::Idle => None,
            Interaction::Dragging { id, .. } => Some(id),
            Interaction::Resizing { id } => Some(id),
        }
    }

    // ========================================================================
    // Pointer state machine
    // ========================================================================

    /// Pointer pressed on a widget's header: enter Dragging unless the
    /// canvas or the widget is locked, or an interaction is already
    /// active. Returns whether the drag started.
    pub fn pointer_down_header(&mut self, id: u64, pointer: (f64, f64), frame: &CanvasFrame) -> bool {
        if !self.is_idle() || self.canvas_locked {
            return false;
        }
        let item = match self.item(id) {
            Some(item) if !item.locked => item,
            _ => return false,
        };
        let (lx, ly) = frame.to_local(pointer);
        self.interaction = Interaction::Dragging {
            id,
            grab_dx: lx - item.x as f64,
            grab_dy: ly - item.y as f64,
        };
        true
    }

    /// Pointer pressed on a widget's bottom-right resize handle: enter
    /// Resizing, same exclusions as dragging.
    pub fn pointer_down_resize(&mut self, id: u64) -> bool {
        if !self.is_idle() || self.canvas_locked {
            return false;
        }
        match self.item(id) {
            Some(item) if !item.locked => {
                self.interaction = Interaction::Resizing { id };
                true
            }
            _ => false,
        }
    }

    /// Pointer moved. In Dragging, the pressed widget's origin follows the
    /// canvas-local pointer (minus the grab offset), snapped to the grid
    /// and clamped non-negative. In Resizing, its size follows the pointer
    /// relative to the widget origin, snapped and clamped to the minimum
    /// edge per axis. Idle moves are ignored.
    pub fn pointer_move(&mut self, pointer: (f64, f64), frame: &CanvasFrame) {
        let (lx, ly) = frame.to_local(pointer);
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Dragging { id, grab_dx, grab_dy } => {
                if let Some(item) = self.item_mut(id) {
                    item.x = snap(lx - grab_dx).max(0);
                    item.y = snap(ly - grab_dy).max(0);
                }
            }
            Interaction::Resizing { id } => {
                if let Some(item) = self.item_mut(id) {
                    item.width = snap(lx - item.x as f64).max(MIN_WIDGET_EDGE);
                    item.height = snap(ly - item.y as f64).max(MIN_WIDGET_EDGE);
                }
            }
        }
    }

    /// Pointer released anywhere: always back to Idle.
    pub fn pointer_up(&mut self) {
        self.interaction = Interaction::Idle;
    }

    /// Tear down any active pointer session (view change, navigation).
    pub fn cancel_interaction(&mut self) {
        self.interaction = Interaction::Idle;
    }

    // ========================================================================
    // Auto-layout
    // ========================================================================

    /// Repack all unlocked widgets into a fixed 3-column grid of
    /// default-size cells, row-major, in existing collection order. Locked
    /// widgets are left untouched (and reserve no space). Deterministic in
    /// (item count, order); applying it twice gives the same geometry.
    pub fn auto_layout(&mut self) {
        let mut slot = 0usize;
        for item in self.items.iter_mut() {
            if item.locked {
                continue;
            }
            let col = (slot % AUTO_LAYOUT_COLUMNS) as i32;
            let row = (slot / AUTO_LAYOUT_COLUMNS) as i32;
            item.x = AUTO_LAYOUT_MARGIN + col * (DEFAULT_WIDGET_WIDTH + AUTO_LAYOUT_MARGIN);
            item.y = AUTO_LAYOUT_MARGIN + row * (DEFAULT_WIDGET_HEIGHT + AUTO_LAYOUT_MARGIN);
            item.width = DEFAULT_WIDGET_WIDTH;
            item.height = DEFAULT_WIDGET_HEIGHT;
            slot += 1;
        }
    }
}
