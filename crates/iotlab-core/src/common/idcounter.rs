use crate::node::AliasId;

/// Hands out alias identifiers for one submission flow.
/// Numbering starts at 1 and an identifier is never handed out twice until [`AliasCounter::reset`].
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct AliasCounter {
    last: u32,
}

impl AliasCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> AliasId {
        self.last += 1;
        AliasId::new(self.last)
    }

    /// Makes sure that identifiers up to `alias` are never handed out.
    pub fn observe(&mut self, alias: AliasId) {
        self.last = self.last.max(alias.as_num());
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}
