// SPDX-License-Identifier: MPL-2.0

//! A hierarchy of transforms.
//!
//! Nodes live in an arena and refer to their parent by index, so a node never holds a reference
//! to another node. World matrices are found by walking parent indices upwards.

use crate::{error::Error, linear::Mat4, transform::Transform, Result};

/// A handle to a node in a [`SceneTree`].
///
/// Handles are generational: once a node is removed, its handle stays invalid even after the slot
/// is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeIndex>,
    /// The pose of this node relative to its parent.
    transform: Transform,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Default)]
pub struct SceneTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        self.node(index).is_some()
    }

    /// Adds a node, optionally beneath `parent`.
    pub fn insert(&mut self, transform: Transform, parent: Option<NodeIndex>) -> Result<NodeIndex> {
        if let Some(parent) = parent {
            self.node(parent).ok_or(Error::StaleNode)?;
        }

        let node = Node { parent, transform };
        let index = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.node = Some(node);

                NodeIndex {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });

                NodeIndex {
                    slot: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.len += 1;

        Ok(index)
    }

    /// Removes a node and returns its transform.
    ///
    /// Children of the removed node become roots and keep their local transform.
    pub fn remove(&mut self, index: NodeIndex) -> Option<Transform> {
        self.node(index)?;

        let entry = &mut self.slots[index.slot as usize];
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index.slot);
        self.len -= 1;

        for slot in &mut self.slots {
            if let Some(child) = slot.node.as_mut() {
                if child.parent == Some(index) {
                    child.parent = None;
                }
            }
        }

        Some(node.transform)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Transform> {
        self.node(index).map(|node| &node.transform)
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Transform> {
        self.node_mut(index).map(|node| &mut node.transform)
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.node(index).and_then(|node| node.parent)
    }

    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.iter()
            .filter(move |&candidate| self.parent(candidate) == Some(index))
    }

    /// All live nodes, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.node.is_some())
            .map(|(slot, entry)| NodeIndex {
                slot: slot as u32,
                generation: entry.generation,
            })
    }

    /// Moves `child` beneath `parent`, or makes it a root.
    pub fn set_parent(&mut self, child: NodeIndex, parent: Option<NodeIndex>) -> Result<()> {
        self.node(child).ok_or(Error::StaleNode)?;

        if let Some(parent) = parent {
            self.node(parent).ok_or(Error::StaleNode)?;

            // Walk up from the new parent; meeting the child means it would be its own ancestor.
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(Error::CyclicParent);
                }
                cursor = self.parent(ancestor);
            }
        }

        if let Some(node) = self.node_mut(child) {
            node.parent = parent;
        }

        Ok(())
    }

    /// The transformation from this node's mesh space to its parent's space.
    pub fn local_matrix(&self, index: NodeIndex) -> Result<Mat4> {
        self.get(index)
            .map(Transform::model_matrix)
            .ok_or(Error::StaleNode)
    }

    /// The transformation from this node's mesh space to world space.
    pub fn world_matrix(&self, index: NodeIndex) -> Result<Mat4> {
        let mut matrix = self.local_matrix(index)?;

        // Ancestors are applied after the local transform, so each one pre-multiplies.
        let mut cursor = self.parent(index);
        while let Some(ancestor) = cursor {
            let node = self.node(ancestor).ok_or(Error::StaleNode)?;
            matrix = node.transform.model_matrix() * matrix;
            cursor = node.parent;
        }

        Ok(matrix)
    }

    fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.node.as_ref())
    }

    fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.node.as_mut())
    }
}
