//! Longest-axis bisection tree (alternate container)
//!
//! Node 0 is a placeholder spanning a huge cube; it is written out but never
//! referenced. Node 1 is the real root over the geometry's bounds. Nodes are
//! allocated in pre-order (parent, then the whole left subtree, then the
//! right), and entries are allocated in the order leaves are reached.

use crate::foundation::math::utils;
use crate::geometry::Aabb;
use crate::spatial::{EntryTable, FaceShape, NarrowPhaseStats, Region};
use crate::PackError;

/// Marks a child slot that holds no node
pub const LEAF_MARKER: u16 = 0x8000;

/// Half edge length of the placeholder node's cube
pub const SENTINEL_HALF_EXTENT: f32 = 32767.0;

/// One node of the bisection tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    /// Region covered by the node
    pub bounds: Aabb,
    /// Left child, or the entry index for a leaf
    pub left: u16,
    /// Right child, or [`LEAF_MARKER`] for a leaf
    pub right: u16,
}

impl TreeNode {
    /// Is this node a leaf?
    pub fn is_leaf(&self) -> bool {
        self.right == LEAF_MARKER
    }

    /// Entry index held by a leaf
    pub fn entry_index(&self) -> Option<u16> {
        (self.is_leaf() && self.left != LEAF_MARKER).then_some(self.left)
    }

    fn sentinel() -> Self {
        Self {
            bounds: Aabb::cube(SENTINEL_HALF_EXTENT),
            left: LEAF_MARKER,
            right: LEAF_MARKER,
        }
    }
}

/// Faces per tree leaf
#[derive(Debug, Clone)]
pub struct TreePartition {
    /// All nodes, placeholder first
    pub nodes: Vec<TreeNode>,
    /// One entry per leaf
    pub table: EntryTable,
    /// Node index of the leaf owning each entry
    pub leaf_nodes: Vec<u16>,
    /// Narrow-phase counters
    pub stats: NarrowPhaseStats,
}

/// Index of the real root
pub const ROOT_NODE: u16 = 1;

impl TreePartition {
    /// Bisect the bounds of `faces` until every leaf is smaller than
    /// `leaf_size` on all axes.
    ///
    /// Recorded face indices are offset by `first_face`.
    pub fn build(faces: &[FaceShape], first_face: usize, leaf_size: f32) -> Result<Self, PackError> {
        let bounds = faces
            .iter()
            .map(|face| face.bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| Aabb::cube(0.0));

        let mut tree = Self {
            nodes: vec![TreeNode::sentinel()],
            table: EntryTable::default(),
            leaf_nodes: Vec::new(),
            stats: NarrowPhaseStats::default(),
        };
        let mut builder = NodeBuilder { faces, first_face, leaf_size, root: bounds, tree: &mut tree };
        builder.build(bounds)?;

        log::debug!(
            "Tree: {} nodes, {} leaves over {:?}..{:?}",
            tree.nodes.len(),
            tree.leaf_nodes.len(),
            bounds.min,
            bounds.max
        );
        Ok(tree)
    }

    /// The real root node
    pub fn root(&self) -> &TreeNode {
        &self.nodes[usize::from(ROOT_NODE)]
    }

    /// Leaf nodes in entry order
    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.leaf_nodes.iter().map(|&i| &self.nodes[usize::from(i)])
    }
}

struct NodeBuilder<'a> {
    faces: &'a [FaceShape],
    first_face: usize,
    leaf_size: f32,
    /// Leaves on the root's upper faces keep points lying on them
    root: Aabb,
    tree: &'a mut TreePartition,
}

impl NodeBuilder<'_> {
    fn build(&mut self, bounds: Aabb) -> Result<u16, PackError> {
        let index = self.allocate(bounds)?;
        let size = bounds.size();

        let (left, right) = if size.iter().all(|&d| d < self.leaf_size) {
            let entry_index = self.tree.table.entries.len();
            let region = Region::within(bounds, &self.root);
            let entry = self.tree.table.push_region(&region, self.faces, self.first_face, &mut self.tree.stats)?;
            log::trace!("Leaf {index} (entry {entry_index}): {} faces", entry.face_index_count);
            self.tree.leaf_nodes.push(index);
            let entry_index = u16::try_from(entry_index)
                .ok()
                .filter(|&i| i < LEAF_MARKER)
                .ok_or(PackError::IndexOverflow { pool: "entries", size: entry_index + 1 })?;
            (entry_index, LEAF_MARKER)
        } else {
            let (lower, upper) = bounds.split(utils::longest_axis(&size));
            let left = self.build(lower)?;
            let right = self.build(upper)?;
            (left, right)
        };

        let node = &mut self.tree.nodes[usize::from(index)];
        node.left = left;
        node.right = right;
        Ok(index)
    }

    fn allocate(&mut self, bounds: Aabb) -> Result<u16, PackError> {
        let count = self.tree.nodes.len();
        let index = u16::try_from(count)
            .ok()
            .filter(|&i| i < LEAF_MARKER)
            .ok_or(PackError::IndexOverflow { pool: "tree nodes", size: count + 1 })?;
        self.tree.nodes.push(TreeNode { bounds, left: LEAF_MARKER, right: LEAF_MARKER });
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn tetra(origin: Vec3, scale: f32) -> FaceShape {
        FaceShape::from_points(&[
            origin,
            origin + Vec3::new(scale, 0.0, 0.0),
            origin + Vec3::new(0.0, scale, scale),
        ])
        .unwrap()
    }

    #[test]
    fn test_small_geometry_is_single_leaf() {
        let tree = TreePartition::build(&[tetra(Vec3::zeros(), 2.0)], 0, 8.0).unwrap();
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[0].bounds, Aabb::cube(SENTINEL_HALF_EXTENT));
        assert_eq!((tree.nodes[0].left, tree.nodes[0].right), (LEAF_MARKER, LEAF_MARKER));
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().entry_index(), Some(0));
        assert_eq!(tree.leaf_nodes, vec![ROOT_NODE]);
        assert_eq!(tree.table.faces_of(&tree.table.entries[0]), &[0]);
    }

    #[test]
    fn test_split_on_longest_axis_preorder() {
        // 20 x 4 x 4 splits on x into 10, then each half into 5
        let faces = [tetra(Vec3::zeros(), 4.0), tetra(Vec3::new(16.0, 0.0, 0.0), 4.0)];
        let tree = TreePartition::build(&faces, 0, 8.0).unwrap();
        assert_eq!(tree.nodes.len(), 8);
        let root = tree.root();
        assert_eq!((root.left, root.right), (2, 5));
        assert_eq!((tree.nodes[2].left, tree.nodes[2].right), (3, 4));
        assert_eq!(tree.leaf_nodes, vec![3, 4, 6, 7]);
        assert_relative_eq!(tree.nodes[2].bounds.max.x, 10.0);
        assert_relative_eq!(tree.nodes[3].bounds.max.x, 5.0);
        for (entry, leaf) in tree.leaves().enumerate() {
            assert_eq!(leaf.entry_index(), Some(entry as u16));
        }
    }

    #[test]
    fn test_leaves_cover_root() {
        let faces = [
            tetra(Vec3::new(-13.0, 2.0, 1.0), 3.0),
            tetra(Vec3::new(7.0, -9.0, 4.0), 5.0),
            tetra(Vec3::new(1.0, 11.0, -6.0), 2.0),
        ];
        let tree = TreePartition::build(&faces, 0, 8.0).unwrap();
        let root = tree.root().bounds;
        let union = tree.leaves().map(|l| l.bounds).reduce(|a, b| a.union(&b)).unwrap();
        assert_relative_eq!(union.min, root.min);
        assert_relative_eq!(union.max, root.max);

        let root_volume = root.size().product();
        let leaf_volume: f32 = tree.leaves().map(|l| l.bounds.size().product()).sum();
        assert_relative_eq!(leaf_volume, root_volume, max_relative = 1e-4);

        for leaf in tree.leaves() {
            assert!(leaf.bounds.size().iter().all(|&d| d < 8.0));
        }
    }

    #[test]
    fn test_face_indices_offset_past_portals() {
        let tree = TreePartition::build(&[tetra(Vec3::zeros(), 1.0)], 3, 8.0).unwrap();
        assert_eq!(tree.table.face_indices, vec![3]);
    }

    #[test]
    fn test_every_face_reaches_a_leaf() {
        let faces: Vec<FaceShape> = (0..12)
            .map(|i| tetra(Vec3::new(i as f32 * 3.0, (i % 3) as f32, 0.5), 1.5))
            .collect();
        let tree = TreePartition::build(&faces, 0, 8.0).unwrap();
        for face in 0..faces.len() as u16 {
            assert!(tree.table.face_indices.contains(&face), "face {face} missing");
        }
    }

    fn quad(min: Vec3, max: Vec3) -> FaceShape {
        // axis-aligned rectangle in the y = min.y plane
        FaceShape::from_points(&[
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
        ])
        .unwrap()
    }

    #[test]
    fn test_flat_room_faces_reach_leaves() {
        let faces = [
            quad(Vec3::new(0.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 6.0)),
            quad(Vec3::new(6.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 6.0)),
            quad(Vec3::new(0.0, 0.0, 6.0), Vec3::new(12.0, 0.0, 10.0)),
        ];
        let tree = TreePartition::build(&faces, 0, 8.0).unwrap();
        assert_eq!(tree.root().bounds.size().y, 0.0);
        assert_eq!(tree.table.entries.len(), 4);
        for face in 0..faces.len() as u16 {
            assert!(tree.table.face_indices.contains(&face), "face {face} missing");
        }

        // entry 3 spans x 6..12, z 5..10 and holds a corner of every quad
        let table = &tree.table;
        assert_eq!(table.faces_of(&table.entries[3]), &[0, 1, 2]);
        assert!(table.faces_of(&table.entries[0]).contains(&0));
        assert!(table.faces_of(&table.entries[1]).contains(&2));
        assert!(table.faces_of(&table.entries[2]).contains(&1));
    }

    #[test]
    fn test_ceiling_on_root_max_plane() {
        let faces = [
            quad(Vec3::new(0.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 6.0)),
            quad(Vec3::new(2.0, 6.0, 2.0), Vec3::new(3.0, 6.0, 3.0)),
        ];
        let tree = TreePartition::build(&faces, 0, 8.0).unwrap();
        assert_relative_eq!(tree.root().bounds.max.y, 6.0);
        assert_eq!(tree.leaf_nodes, vec![2, 3]);

        let table = &tree.table;
        assert_eq!(table.faces_of(&table.entries[0]), &[0, 1]);
        assert_eq!(table.faces_of(&table.entries[1]), &[0]);
    }

    #[test]
    fn test_node_limit() {
        // 8 x 8 x 8 with a tiny leaf size needs far more than 0x8000 nodes
        let faces = [tetra(Vec3::zeros(), 8.0)];
        let err = TreePartition::build(&faces, 0, 0.25).unwrap_err();
        assert!(
            matches!(err, PackError::IndexOverflow { pool: "tree nodes", size } if size == usize::from(LEAF_MARKER) + 1),
            "{err}"
        );
    }
}

