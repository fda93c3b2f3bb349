/// Collision resolver: axis-separated, first overlap wins.
///
/// ## Contract
///
/// `resolve_axis` moves a rect along ONE axis, then scans the solids in
/// list order. The first solid that overlaps after the move wins:
///   - the rect is pushed to that solid's near face
///       moving right → flush with the solid's left face
///       moving left  → flush with the solid's right face
///       moving down  → flush with the solid's top face
///       moving up    → flush with the solid's bottom face
///   - scanning stops. Other overlapping solids are NOT considered in
///     this call.
///
/// Callers always resolve X fully before Y. This avoids corner-catching
/// but lets a fast mover tunnel through a solid thinner than its per-tick
/// displacement. That is accepted, not corrected.
///
/// A zero displacement never resolves anything.

use super::geom::Rect;
use super::tile::Solid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

/// Which face of the solid the mover came to rest against.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Face {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Contact {
    /// Index into the solid list that was passed in.
    pub solid: usize,
    pub face: Face,
}

impl Contact {
    /// Stopped a downward motion: the mover is standing on the solid.
    pub fn is_landing(&self) -> bool {
        self.face == Face::Top
    }

    /// Stopped an upward motion: the mover hit the solid with its head.
    pub fn is_head_hit(&self) -> bool {
        self.face == Face::Bottom
    }
}

/// Apply `delta` along `axis` and resolve against the first overlapping solid.
pub fn resolve_axis(rect: &mut Rect, axis: Axis, delta: f32, solids: &[Solid]) -> Option<Contact> {
    if delta == 0.0 { return None; }

    match axis {
        Axis::X => rect.x += delta,
        Axis::Y => rect.y += delta,
    }

    let idx = first_overlap(rect, solids)?;
    let s = &solids[idx].rect;

    let face = match (axis, delta > 0.0) {
        (Axis::X, true) => { rect.set_right(s.left()); Face::Left }
        (Axis::X, false) => { rect.x = s.right(); Face::Right }
        (Axis::Y, true) => { rect.set_bottom(s.top()); Face::Top }
        (Axis::Y, false) => { rect.y = s.bottom(); Face::Bottom }
    };

    Some(Contact { solid: idx, face })
}

/// Mover form: displacement is the velocity component itself, and that
/// component is zeroed when the move is stopped by a solid.
pub fn move_axis(rect: &mut Rect, velocity: &mut f32, axis: Axis, solids: &[Solid]) -> Option<Contact> {
    let contact = resolve_axis(rect, axis, *velocity, solids);
    if contact.is_some() {
        *velocity = 0.0;
    }
    contact
}

/// First solid overlapping `rect`, if any (list order).
pub fn first_overlap(rect: &Rect, solids: &[Solid]) -> Option<usize> {
    solids.iter().position(|s| rect.overlaps(&s.rect))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
