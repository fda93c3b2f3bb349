/// Level geometry: static solids and the interactive blocks among them.
///
/// A solid's material is a tag, not a subtype. Blocks are solids whose tag
/// carries a `BlockState`; everything else about them (collision, list
/// order) is identical to ground, pipes and stairs.

use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockKind {
    Brick,
    /// `used` flips false → true on the first head-hit and never back.
    Question { used: bool },
}

/// Per-block interactive state, driven by head-hits from below.
///
/// States:
///   Brick     { idle, bumped }
///   Question  { unopened, opened } × { idle, bumped }
///
/// "bumped" is simply `bump_timer > 0`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockState {
    pub kind: BlockKind,
    pub bump_timer: u32,
}

/// What a head-hit did to a block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeadHit {
    Bumped,
    /// Question block opened by this hit.
    Opened,
}

impl BlockState {
    pub fn brick() -> Self {
        BlockState { kind: BlockKind::Brick, bump_timer: 0 }
    }

    pub fn question() -> Self {
        BlockState { kind: BlockKind::Question { used: false }, bump_timer: 0 }
    }

    /// Head-hit transition. The bump always restarts; a question block
    /// additionally opens on its first hit.
    pub fn on_head_hit(&mut self, bump_ticks: u32) -> HeadHit {
        self.bump_timer = bump_ticks;
        match &mut self.kind {
            BlockKind::Question { used } if !*used => {
                *used = true;
                HeadHit::Opened
            }
            _ => HeadHit::Bumped,
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self) {
        self.bump_timer = self.bump_timer.saturating_sub(1);
    }

    pub fn is_bumped(&self) -> bool {
        self.bump_timer > 0
    }

    /// `None` for bricks, which have no used/unused concept.
    pub fn used(&self) -> Option<bool> {
        match self.kind {
            BlockKind::Brick => None,
            BlockKind::Question { used } => Some(used),
        }
    }

    /// Vertical draw offset in world units (negative = raised).
    pub fn bump_offset(&self) -> f32 {
        if self.is_bumped() { -2.0 } else { 0.0 }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolidKind {
    Ground,
    Pipe,
    Stair,
    Block(BlockState),
}

/// A collidable rectangle. The rect never changes after level build;
/// only a block's `BlockState` does.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Solid {
    pub rect: Rect,
    pub kind: SolidKind,
}

impl Solid {
    pub fn new(rect: Rect, kind: SolidKind) -> Self {
        Solid { rect, kind }
    }

    pub fn block(&self) -> Option<&BlockState> {
        match &self.kind {
            SolidKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut BlockState> {
        match &mut self.kind {
            SolidKind::Block(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_opens_once() {
        let mut b = BlockState::question();
        assert_eq!(b.used(), Some(false));

        assert_eq!(b.on_head_hit(6), HeadHit::Opened);
        assert_eq!(b.used(), Some(true));
        assert_eq!(b.bump_timer, 6);

        for _ in 0..4 { b.tick(); }
        assert_eq!(b.bump_timer, 2);

        // Second hit: stays used, bump restarts from the full constant.
        assert_eq!(b.on_head_hit(6), HeadHit::Bumped);
        assert_eq!(b.used(), Some(true));
        assert_eq!(b.bump_timer, 6);
    }

    #[test]
    fn brick_only_bumps() {
        let mut b = BlockState::brick();
        assert_eq!(b.used(), None);
        assert_eq!(b.on_head_hit(6), HeadHit::Bumped);
        assert_eq!(b.on_head_hit(6), HeadHit::Bumped);
        assert_eq!(b.kind, BlockKind::Brick);
    }

    #[test]
    fn bump_timer_never_negative() {
        let mut b = BlockState::brick();
        b.on_head_hit(2);
        assert!(b.is_bumped());
        assert!(b.bump_offset() < 0.0);
        b.tick();
        b.tick();
        b.tick();
        assert_eq!(b.bump_timer, 0);
        assert_eq!(b.bump_offset(), 0.0);
    }

    #[test]
    fn only_blocks_expose_state() {
        let ground = Solid::new(Rect::new(0.0, 0.0, 16.0, 16.0), SolidKind::Ground);
        assert!(ground.block().is_none());
        let mut q = Solid::new(Rect::new(0.0, 0.0, 16.0, 16.0), SolidKind::Block(BlockState::question()));
        if let Some(b) = q.block_mut() {
            b.on_head_hit(6);
        }
        assert_eq!(q.block().and_then(|b| b.used()), Some(true));
    }
}
