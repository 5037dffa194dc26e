use crate::bbox::BoundingBox;
use crate::coords::PackedCoordinates;
use crate::layout::{self, i_cluster_buffer_len};
use crate::simd::SimdLanes;
use nalgebra::Vector3;

/// Per-worker scratch for the i-cluster currently being searched.
///
/// `x_simd` holds `6 * L::WIDTH` scalars: for x, y and z the pair of atoms
/// 0 and 1 (one per vector half), then the same for atoms 2 and 3. It is
/// allocated once and overwritten for every i-cluster.
pub struct IClusterWork<L: SimdLanes> {
    x_simd: Vec<L::Scalar>,
    bb: BoundingBox,
}

impl<L: SimdLanes> Default for IClusterWork<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SimdLanes> IClusterWork<L> {
    pub const BUFFER_LEN: usize = i_cluster_buffer_len(L::WIDTH);

    pub fn new() -> Self {
        Self {
            x_simd: vec![L::Scalar::default(); Self::BUFFER_LEN],
            bb: BoundingBox::far_away(),
        }
    }

    pub fn x_simd(&self) -> &[L::Scalar] {
        &self.x_simd
    }

    /// Shifted bounding box of the current i-cluster.
    pub fn bb(&self) -> &BoundingBox {
        &self.bb
    }
}

/// Copies the coordinates of i-cluster `ci`, shifted by `shift`, into the
/// packed working buffer of `work`.
pub fn set_i_cluster_x<L: SimdLanes>(
    ci: usize,
    shift: &Vector3<L::Scalar>,
    x: &PackedCoordinates<L::Scalar>,
    work: &mut IClusterWork<L>,
) {
    let x = x.as_slice();
    let ia = layout::x_index_from_ci::<L>(ci);
    let stride = layout::x_stride::<L>();
    let w = L::WIDTH;
    let sh = [L::splat(shift.x), L::splat(shift.y), L::splat(shift.z)];
    let buf = &mut work.x_simd;

    for (half, first_atom) in [0, 2].into_iter().enumerate() {
        for d in 0..layout::DIM {
            let v = L::load_u1_dual_half(&x[ia + d * stride + first_atom..]) + sh[d];
            v.store(&mut buf[(half * layout::DIM + d) * w..]);
        }
    }
}

/// Stores the bounding box of the current i-cluster, translated by `shift`.
pub fn set_i_cluster_bb<L: SimdLanes>(
    bb: &BoundingBox,
    shift: &Vector3<L::Scalar>,
    work: &mut IClusterWork<L>,
) {
    work.bb = bb.shifted(shift);
}

/// Convenience for the common case: packs the coordinates and box of local
/// i-cluster `ci_local` of `grid`.
pub fn set_i_cluster<L: SimdLanes>(
    grid: &crate::grid::Grid,
    ci_local: usize,
    shift: &Vector3<L::Scalar>,
    x: &PackedCoordinates<L::Scalar>,
    work: &mut IClusterWork<L>,
) {
    set_i_cluster_x(grid.cell_offset() + ci_local, shift, x, work);
    set_i_cluster_bb(&grid.i_bounding_boxes()[ci_local], shift, work);
}
