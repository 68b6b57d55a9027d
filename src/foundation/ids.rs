/// Node of an [`crate::ObjectGraph`]; the value is the node's discovery index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Discovery index (0 is the root).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Equivalence class produced by the canonicalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

/// One generated output variant of a multi-variant plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct VariantId(pub(crate) u16);

impl VariantId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Edge discovery position; increases once per edge in visitation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Position(pub(crate) u32);

impl Position {
    /// The root is constructed before any edge is discovered.
    pub const ROOT: Position = Position(0);
}
