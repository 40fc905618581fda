use crate::error::TreeError;

use super::{
    BlockId, BlockKind, Fragment, InlineKind, Mutation, Node, NodeId, NodeKind, PauseGuard,
};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An owned, observable document tree.
///
/// Nodes live in an arena addressed by [`NodeId`]. Freed slots go on a free
/// list and their generation is bumped, so old handles go stale rather than
/// alias new nodes.
///
/// While observing, every primitive that changes a node reachable from the
/// root appends a [`Mutation`]; changes to detached subtrees are not
/// reported.
#[derive(Debug, Clone)]
pub struct Surface {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    pub(crate) observing: bool,
    records: Vec<Mutation>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        let mut surface = Self {
            slots: vec![],
            free: vec![],
            root: NodeId {
                index: 0,
                generation: 0,
            },
            observing: false,
            records: vec![],
        };
        surface.root = surface.alloc(NodeKind::Root);
        surface
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(Node::new(kind));
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = node;
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node,
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            if let Some(slot) = self.slots.get_mut(node.index as usize) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
    }

    // ---- queries ----

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn try_node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.node(id).ok_or(TreeError::StaleNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn block_kind(&self, id: NodeId) -> Option<BlockKind> {
        match self.kind(id)? {
            NodeKind::Block(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn inline_kind(&self, id: NodeId) -> Option<InlineKind> {
        match self.kind(id)? {
            NodeKind::Inline(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_block)
    }

    pub fn is_inline(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_inline)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_text)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id`; empty for leaves and stale handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Length of a text node in chars, zero for anything else.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, |t| t.chars().count())
    }

    /// Concatenated value of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|t| self.text(t))
            .collect()
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.contains(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Text nodes under `id` (or `id` itself) in document order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Nearest block at or above `id`.
    pub fn closest_block(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_block(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// True when `id` is the root or hangs off it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Top-level block nodes in document order.
    pub fn blocks(&self) -> Vec<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .filter(|&c| self.is_block(c))
            .collect()
    }

    pub fn block_id(&self, id: NodeId) -> Option<BlockId> {
        self.node(id)?.block_id
    }

    pub fn set_block_id(&mut self, id: NodeId, block_id: Option<BlockId>) -> Result<(), TreeError> {
        let node = self.node_mut(id).ok_or(TreeError::StaleNode(id))?;
        node.block_id = block_id;
        Ok(())
    }

    pub fn list_break(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.list_break)
    }

    /// Marks a list item as the first of a new list.
    pub fn set_list_break(&mut self, id: NodeId, list_break: bool) -> Result<(), TreeError> {
        let node = self.node_mut(id).ok_or(TreeError::StaleNode(id))?;
        node.list_break = list_break;
        Ok(())
    }

    /// The attached block carrying `block_id`.
    pub fn find_block(&self, block_id: BlockId) -> Option<NodeId> {
        self.blocks()
            .into_iter()
            .find(|&b| self.block_id(b) == Some(block_id))
    }

    // ---- construction ----

    /// Creates a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind)
    }

    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(value.into()))
    }

    pub fn create_block(&mut self, kind: BlockKind, block_id: Option<BlockId>) -> NodeId {
        let id = self.alloc(NodeKind::Block(kind));
        if let Some(node) = self.node_mut(id) {
            node.block_id = block_id;
        }
        id
    }

    pub fn create_inline(&mut self, kind: InlineKind) -> NodeId {
        self.alloc(NodeKind::Inline(kind))
    }

    // ---- mutation ----

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` under `parent` before `reference`, or last when
    /// `reference` is `None`. An attached `child` is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::Root);
        }
        if !self.try_node(parent)?.kind.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        self.try_node(child)?;
        if let Some(reference) = reference
            && self.parent(reference) != Some(parent)
        {
            return Err(TreeError::NotAChild {
                parent,
                child: reference,
            });
        }
        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == child {
                return Err(TreeError::Cycle { parent, child });
            }
            ancestor = self.parent(node);
        }

        self.detach(child)?;

        let idx = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(self.children(parent).len()),
            None => self.children(parent).len(),
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(idx, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }

        self.record(Mutation::Children {
            target: parent,
            added: vec![child],
            removed: vec![],
        });
        Ok(())
    }

    /// Inserts `child` right after `reference`, which must be attached.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::Detached(reference))?;
        let next = self.next_sibling(reference);
        self.insert_before(parent, child, next)
    }

    /// Unlinks `child` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, child: NodeId) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::Root);
        }
        let Some(parent) = self.try_node(child)?.parent else {
            return Ok(());
        };
        let was_attached = self.is_attached(parent);
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        if was_attached {
            self.push_record(Mutation::Children {
                target: parent,
                added: vec![],
                removed: vec![child],
            });
        }
        Ok(())
    }

    /// Unlinks and frees `child` and its subtree.
    pub fn remove(&mut self, child: NodeId) -> Result<(), TreeError> {
        self.detach(child)?;
        self.free_subtree(child);
        Ok(())
    }

    /// Puts `new` where `old` was and frees `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(old).ok_or(TreeError::Detached(old))?;
        self.insert_before(parent, new, Some(old))?;
        self.remove(old)
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), TreeError> {
        let value = value.into();
        match &mut self.node_mut(id).ok_or(TreeError::StaleNode(id))?.kind {
            NodeKind::Text(current) => {
                if *current == value {
                    return Ok(());
                }
                *current = value;
            }
            _ => return Err(TreeError::NotText(id)),
        }
        self.record(Mutation::Text { target: id });
        Ok(())
    }

    /// Removes and frees every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        for child in self.children(id).to_vec() {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Empties the document.
    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.clear_children(self.root)
    }

    // ---- observation ----

    pub fn observe(&mut self, on: bool) {
        self.observing = on;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Suspends observation until the guard drops.
    pub fn paused(&mut self) -> PauseGuard<'_> {
        PauseGuard::new(self)
    }

    /// Drains recorded mutations.
    pub fn take_records(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.records)
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    fn record(&mut self, mutation: Mutation) {
        if self.observing && self.is_attached(mutation.target()) {
            self.records.push(mutation);
        }
    }

    fn push_record(&mut self, mutation: Mutation) {
        if self.observing {
            self.records.push(mutation);
        }
    }

    // ---- fragments ----

    /// Copies the subtree at `id` out of the arena.
    pub fn export(&self, id: NodeId) -> Result<Fragment, TreeError> {
        let node = self.try_node(id)?;
        let children = || {
            node.children
                .iter()
                .map(|&c| self.export(c))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(match &node.kind {
            NodeKind::Root => return Err(TreeError::Root),
            NodeKind::Text(value) => Fragment::text(value.clone()),
            NodeKind::Inline(kind) => Fragment::Inline {
                kind: *kind,
                children: children()?,
            },
            NodeKind::Block(kind) => Fragment::Block {
                kind: *kind,
                block_id: node.block_id,
                list_break: node.list_break,
                children: children()?,
            },
        })
    }

    /// Builds a detached subtree from `fragment`.
    pub fn import(&mut self, fragment: &Fragment) -> NodeId {
        let (id, children) = match fragment {
            Fragment::Text { value } => return self.create_text(value.clone()),
            Fragment::Inline { kind, children } => (self.create_inline(*kind), children),
            Fragment::Block {
                kind,
                block_id,
                list_break,
                children,
            } => {
                let id = self.create_block(*kind, *block_id);
                if let Some(node) = self.node_mut(id) {
                    node.list_break = *list_break;
                }
                (id, children)
            }
        };
        for child in children {
            let child_id = self.import(child);
            if let Some(parent) = self.node_mut(id) {
                parent.children.push(child_id);
            }
            if let Some(node) = self.node_mut(child_id) {
                node.parent = Some(id);
            }
        }
        id
    }
}
