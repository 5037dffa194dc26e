use crate::layout::{DIM, I_CLUSTER_SIZE};
use crate::simd::{Real, SimdLanes};
use nalgebra::Vector3;
use thiserror::Error;

/// Coordinate given to padding atoms so they never fall within a cutoff.
pub const FAR_AWAY: f64 = -1_000_000.0;

#[derive(Error, Debug, PartialEq)]
pub enum CoordinatesError {
    #[error("flat coordinate array length {0} is not a multiple of 3")]
    RaggedCoordinates(usize),
}

/// Grid-ordered atom coordinates in the packed block layout.
///
/// Atoms are grouped in blocks of `stride`; a block stores `stride` x values,
/// then `stride` y values, then `stride` z values. The atom count is padded
/// up to a whole number of i-clusters and blocks with [`FAR_AWAY`] atoms.
#[derive(Clone, Debug)]
pub struct PackedCoordinates<T: Real> {
    data: Vec<T>,
    stride: usize,
    n_atoms: usize,
    n_padded: usize,
}

impl<T: Real> PackedCoordinates<T> {
    /// Packs positions that are already in grid (cluster) order.
    pub fn pack<L: SimdLanes<Scalar = T>>(positions: &[Vector3<T>]) -> Self {
        let stride = crate::layout::x_stride::<L>();
        let block = stride.max(I_CLUSTER_SIZE);
        let n_atoms = positions.len();
        let n_padded = n_atoms.div_ceil(block) * block;

        let far = T::from_f64(FAR_AWAY);
        let mut data = vec![far; n_padded * DIM];
        for (a, p) in positions.iter().enumerate() {
            let base = (a / stride) * DIM * stride + a % stride;
            data[base] = p.x;
            data[base + stride] = p.y;
            data[base + 2 * stride] = p.z;
        }

        Self {
            data,
            stride,
            n_atoms,
            n_padded,
        }
    }

    /// Packs a flat `[x0, y0, z0, x1, ...]` array, reinterpreting it in place
    /// when the memory layout allows.
    pub fn from_flat<L: SimdLanes<Scalar = T>>(xyz: &[T]) -> Result<Self, CoordinatesError>
    where
        Vector3<T>: bytemuck::Pod,
    {
        if xyz.len() % DIM != 0 {
            return Err(CoordinatesError::RaggedCoordinates(xyz.len()));
        }
        if let Ok(positions) = bytemuck::try_cast_slice::<T, Vector3<T>>(xyz) {
            return Ok(Self::pack::<L>(positions));
        }

        // Fallback: Copy
        let positions: Vec<Vector3<T>> = xyz
            .chunks_exact(DIM)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect();
        Ok(Self::pack::<L>(&positions))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of real (non-padding) atoms.
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn n_padded_atoms(&self) -> usize {
        self.n_padded
    }

    pub fn n_i_clusters(&self) -> usize {
        self.n_padded / I_CLUSTER_SIZE
    }

    pub fn atom(&self, a: usize) -> Vector3<T> {
        let base = (a / self.stride) * DIM * self.stride + a % self.stride;
        Vector3::new(
            self.data[base],
            self.data[base + self.stride],
            self.data[base + 2 * self.stride],
        )
    }

    pub fn is_padding(&self, a: usize) -> bool {
        a >= self.n_atoms
    }
}
