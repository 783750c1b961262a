//! Drag-and-drop slot rearrangement.
//!
//! Hit-testing of a dragged player card against the last measured slot
//! rectangles, and the pure swap that a drop produces. Whether the local
//! player may request the swap is decided by the coordinator, not here.

use super::{entity::Lobby, value_object::SlotAddress};

/// Screen position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centred on `center`
    pub fn centered(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Overlap on both axes. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        let horizontal = self.x < other.right() && other.x < self.right();
        let vertical = self.y < other.bottom() && other.y < self.bottom();
        horizontal && vertical
    }
}

/// Target slot for a card dropped at `pointer`.
///
/// The first slot rectangle (in `known_slot_rects` order) that overlaps the
/// card wins. Returns `None` when the card was never measured or the drop
/// misses every slot.
pub fn compute_drop_target(
    pointer: Point,
    dragged_card_size: Option<Size>,
    known_slot_rects: &[(SlotAddress, Rect)],
) -> Option<SlotAddress> {
    let card = Rect::centered(pointer, dragged_card_size?);
    known_slot_rects
        .iter()
        .find(|(_, rect)| card.intersects(rect))
        .map(|(address, _)| *address)
}

/// Exchange the occupants of `source` and `target`.
///
/// Dropping onto the source is a no-op; dropping onto an empty slot moves
/// the player.
pub fn resolve_swap(lobby: &Lobby, source: SlotAddress, target: SlotAddress) -> Lobby {
    let mut next = lobby.clone();
    if source == target {
        return next;
    }
    let moving = next.slot_mut(source).take();
    let displaced = std::mem::replace(next.slot_mut(target), moving);
    *next.slot_mut(source) = displaced;
    next
}

/// Last measured rectangle of each slot card on screen.
///
/// Registration order is kept, since it breaks overlap ties.
#[derive(Debug, Clone, Default)]
pub struct SlotLayout {
    rects: Vec<(SlotAddress, Rect)>,
}

impl SlotLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh measurement, replacing any earlier one in place
    pub fn measure(&mut self, address: SlotAddress, rect: Rect) {
        match self.rects.iter_mut().find(|(known, _)| *known == address) {
            Some(entry) => entry.1 = rect,
            None => self.rects.push((address, rect)),
        }
    }

    pub fn forget(&mut self, address: SlotAddress) {
        self.rects.retain(|(known, _)| *known != address);
    }

    pub fn rects(&self) -> &[(SlotAddress, Rect)] {
        &self.rects
    }

    pub fn hit_test(&self, pointer: Point, dragged_card_size: Option<Size>) -> Option<SlotAddress> {
        compute_drop_target(pointer, dragged_card_size, &self.rects)
    }
}

/// Swap asked for by a completed drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
    pub source: SlotAddress,
    pub target: SlotAddress,
}

/// A drag in flight, from pick-up to drop
#[derive(Debug, Clone)]
pub struct DragGesture {
    source: SlotAddress,
    card_size: Option<Size>,
    hover: Option<SlotAddress>,
}

impl DragGesture {
    /// Pick up the card in `source`. `card_size` is `None` when the card
    /// could not be measured.
    pub fn begin(source: SlotAddress, card_size: Option<Size>) -> Self {
        Self {
            source,
            card_size,
            hover: None,
        }
    }

    pub fn source(&self) -> SlotAddress {
        self.source
    }

    /// Slot currently under the card, for highlighting
    pub fn hover(&self) -> Option<SlotAddress> {
        self.hover
    }

    pub fn move_to(&mut self, pointer: Point, layout: &SlotLayout) -> Option<SlotAddress> {
        self.hover = layout.hit_test(pointer, self.card_size);
        self.hover
    }

    /// Release the card. Yields a swap only for a drop onto another slot.
    pub fn drop_at(self, pointer: Point, layout: &SlotLayout) -> Option<SwapRequest> {
        let target = layout.hit_test(pointer, self.card_size)?;
        (target != self.source).then_some(SwapRequest {
            source: self.source,
            target,
        })
    }
}
