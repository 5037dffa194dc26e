//! Cluster geometry of the 2 x half-width layout.
//!
//! i-clusters always hold [`I_CLUSTER_SIZE`] atoms. j-clusters hold half a
//! vector width of atoms, so one vector covers two i-atoms against a full
//! j-cluster. Coordinates are stored in blocks of `x_stride` atoms: all x
//! values of a block, then all y values, then all z values.

use crate::simd::SimdLanes;

pub const DIM: usize = 3;

pub const I_CLUSTER_SIZE: usize = 4;

/// Number of i-atoms that share one vector (one per half).
pub const I_ATOMS_PER_VECTOR: usize = 2;

/// Scalars in the packed i-cluster buffer for a given lane width.
pub const fn i_cluster_buffer_len(width: usize) -> usize {
    DIM * (I_CLUSTER_SIZE / I_ATOMS_PER_VECTOR) * width
}

#[inline]
pub const fn j_cluster_size<L: SimdLanes>() -> usize {
    L::WIDTH / 2
}

/// Atoms per packed coordinate block.
#[inline]
pub const fn x_stride<L: SimdLanes>() -> usize {
    let j = j_cluster_size::<L>();
    if j > I_CLUSTER_SIZE { j } else { I_CLUSTER_SIZE }
}

/// j-clusters covered by one i-cluster.
#[inline]
pub const fn j_clusters_per_i_cluster<L: SimdLanes>() -> usize {
    I_CLUSTER_SIZE / j_cluster_size::<L>()
}

#[inline]
fn x_index_from_atom(atom: usize, stride: usize) -> usize {
    (atom / stride) * DIM * stride + atom % stride
}

/// Offset of the x coordinate of the first atom of i-cluster `ci`.
#[inline]
pub fn x_index_from_ci<L: SimdLanes>(ci: usize) -> usize {
    x_index_from_atom(ci * I_CLUSTER_SIZE, x_stride::<L>())
}

/// Offset of the x coordinate of the first atom of j-cluster `cj`.
#[inline]
pub fn x_index_from_cj<L: SimdLanes>(cj: usize) -> usize {
    x_index_from_atom(cj * j_cluster_size::<L>(), x_stride::<L>())
}

/// First j-cluster inside i-cluster `ci`.
#[inline]
pub fn cj_first_from_ci<L: SimdLanes>(ci: usize) -> usize {
    ci * j_clusters_per_i_cluster::<L>()
}

/// Last j-cluster inside i-cluster `ci`.
#[inline]
pub fn cj_last_from_ci<L: SimdLanes>(ci: usize) -> usize {
    (ci + 1) * j_clusters_per_i_cluster::<L>() - 1
}
