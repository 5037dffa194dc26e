use crate::bbox::BoundingBox;
use crate::coords::PackedCoordinates;
use crate::layout::{self, I_CLUSTER_SIZE};
use crate::simd::SimdLanes;
use tracing::info_span;

/// Read-only view of one spatially sorted grid of clusters.
///
/// Local cluster indices count from the start of this grid. `cell_offset`
/// is the global index of the grid's first i-cluster; the global index of
/// local j-cluster `cj` is `cj_first_from_ci(cell_offset) + cj`.
#[derive(Clone, Debug)]
pub struct Grid {
    cell_offset: usize,
    i_bounding_boxes: Vec<BoundingBox>,
    j_bounding_boxes: Vec<BoundingBox>,
}

impl Grid {
    pub fn new(
        cell_offset: usize,
        i_bounding_boxes: Vec<BoundingBox>,
        j_bounding_boxes: Vec<BoundingBox>,
    ) -> Self {
        Self {
            cell_offset,
            i_bounding_boxes,
            j_bounding_boxes,
        }
    }

    /// Computes the cluster boxes for `n_i_clusters` i-clusters starting at
    /// global i-cluster `cell_offset`. The atoms must already be in grid order.
    pub fn from_coordinates<L: SimdLanes>(
        x: &PackedCoordinates<L::Scalar>,
        cell_offset: usize,
        n_i_clusters: usize,
    ) -> Self {
        let _span = info_span!("Grid::from_coordinates", n_i_clusters).entered();
        let j_size = layout::j_cluster_size::<L>();
        let n_j_clusters = n_i_clusters * layout::j_clusters_per_i_cluster::<L>();
        let first_atom = cell_offset * I_CLUSTER_SIZE;

        let i_bounding_boxes = (0..n_i_clusters)
            .map(|ci| BoundingBox::of_atoms(x, first_atom + ci * I_CLUSTER_SIZE, I_CLUSTER_SIZE))
            .collect();
        let j_bounding_boxes = (0..n_j_clusters)
            .map(|cj| BoundingBox::of_atoms(x, first_atom + cj * j_size, j_size))
            .collect();

        Self::new(cell_offset, i_bounding_boxes, j_bounding_boxes)
    }

    /// Global index of the grid's first i-cluster.
    pub fn cell_offset(&self) -> usize {
        self.cell_offset
    }

    pub fn i_bounding_boxes(&self) -> &[BoundingBox] {
        &self.i_bounding_boxes
    }

    pub fn j_bounding_boxes(&self) -> &[BoundingBox] {
        &self.j_bounding_boxes
    }

    pub fn num_i_clusters(&self) -> usize {
        self.i_bounding_boxes.len()
    }

    pub fn num_j_clusters(&self) -> usize {
        self.j_bounding_boxes.len()
    }
}
