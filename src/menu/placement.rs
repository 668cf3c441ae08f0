use crate::models::Coordinates;

/// Gap between the caret line and the menu edge.
const GAP: f64 = 4.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuPlacement {
    pub top: f64,
    pub left: f64,
    pub side: Side,
}

/// Place the menu under the caret, flipping above it when only the space above fits.
///
/// Horizontally the menu starts at the caret and is shifted left to stay inside the viewport.
pub fn place_menu(anchor: Coordinates, viewport: Size, menu: Size) -> MenuPlacement {
    let caret_bottom = anchor.top + anchor.height;
    let room_below = viewport.height - caret_bottom - GAP;
    let room_above = anchor.top - GAP;

    let (top, side) = if menu.height > room_below && menu.height <= room_above {
        (anchor.top - GAP - menu.height, Side::Above)
    } else {
        (caret_bottom + GAP, Side::Below)
    };

    let max_left = (viewport.width - menu.width).max(0.0);
    MenuPlacement {
        top,
        left: anchor.left.clamp(0.0, max_left),
        side,
    }
}
