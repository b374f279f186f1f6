use crate::math::Point3;

/// One alternate set of vertex positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBlock {
    /// Display name.
    pub name: String,
    uid: u32,
    /// Index of the block this one deforms relative to. `None` for the root basis.
    pub relative_to: Option<usize>,
    /// One position per flat vertex.
    pub data: Vec<Point3>,
}

impl ShapeBlock {
    /// Stable identifier used to bind the block to a linked shape layer.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }
}

/// Ordered sequence of shape blocks owned by a flat mesh.
///
/// Blocks form a forest through [`ShapeBlock::relative_to`]; the reference
/// block is the root basis and matches the mesh's own vertex positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeKeySet {
    blocks: Vec<ShapeBlock>,
    uid_gen: u32,
    /// Whether blocks are relative to their basis (as opposed to absolute).
    pub relative: bool,
}

impl Default for ShapeKeySet {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            uid_gen: 1,
            relative: true,
        }
    }
}

impl ShapeKeySet {
    /// Creates an empty relative key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block and assigns it a fresh uid. Returns the block's index.
    pub fn add_block(
        &mut self,
        name: impl Into<String>,
        relative_to: Option<usize>,
        data: Vec<Point3>,
    ) -> usize {
        let uid = self.uid_gen;
        self.uid_gen += 1;
        self.blocks.push(ShapeBlock {
            name: name.into(),
            uid,
            relative_to,
            data,
        });
        self.blocks.len() - 1
    }

    /// Appends an empty block carrying an existing uid.
    ///
    /// Used when a linked shape layer has no block yet. New blocks are made
    /// relative to the reference block when one exists.
    pub fn add_block_with_uid(&mut self, name: impl Into<String>, uid: u32) -> usize {
        let relative_to = (!self.blocks.is_empty()).then(|| self.reference_index());
        self.uid_gen = self.uid_gen.max(uid.saturating_add(1));
        self.blocks.push(ShapeBlock {
            name: name.into(),
            uid,
            relative_to,
            data: Vec::new(),
        });
        self.blocks.len() - 1
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there are no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in order.
    #[must_use]
    pub fn blocks(&self) -> &[ShapeBlock] {
        &self.blocks
    }

    /// Mutable access to all blocks.
    pub fn blocks_mut(&mut self) -> &mut [ShapeBlock] {
        &mut self.blocks
    }

    /// The block at `index`.
    #[must_use]
    pub fn block(&self, index: usize) -> Option<&ShapeBlock> {
        self.blocks.get(index)
    }

    /// Position of the block carrying `uid`.
    #[must_use]
    pub fn find_by_uid(&self, uid: u32) -> Option<usize> {
        self.blocks.iter().position(|b| b.uid == uid)
    }

    /// Index of the root basis: the first block without a basis of its own.
    #[must_use]
    pub fn reference_index(&self) -> usize {
        self.blocks
            .iter()
            .position(|b| b.relative_to.is_none())
            .unwrap_or(0)
    }

    /// Returns `true` if any other block uses `index` as its basis.
    #[must_use]
    pub fn is_basis(&self, index: usize) -> bool {
        self.blocks
            .iter()
            .enumerate()
            .any(|(i, b)| i != index && b.relative_to == Some(index))
    }
}
