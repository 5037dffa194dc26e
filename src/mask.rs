use crate::layout::{self, I_CLUSTER_SIZE};
use crate::simd::SimdLanes;

/// Atom pairs of one cluster pair that the kernel must skip.
///
/// Bit `i * J + j` stands for i-atom `i` and j-atom `j`, with `J` the
/// j-cluster size. A set bit means the pair is excluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExclusionMask(u32);

impl ExclusionMask {
    pub const NONE: ExclusionMask = ExclusionMask(0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_excluded(self, i: usize, j: usize, j_cluster_size: usize) -> bool {
        self.0 & (1 << (i * j_cluster_size + j)) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Complement within the `I_CLUSTER_SIZE * j_cluster_size` pair bits:
    /// the pairs the kernel does compute.
    pub fn interaction_bits(self, j_cluster_size: usize) -> u32 {
        let n = I_CLUSTER_SIZE * j_cluster_size;
        let all = if n >= 32 { u32::MAX } else { (1u32 << n) - 1 };
        !self.0 & all
    }

    /// Mask for i-cluster `ci` against j-cluster `cj`, both in the same
    /// grid-local numbering.
    ///
    /// With `exclude_sub_diagonal` set and `cj` inside the atom span of `ci`,
    /// every pair whose j-atom does not come after the i-atom is excluded:
    /// self pairs and the lower triangle. All other combinations are empty.
    pub fn for_pair<L: SimdLanes>(exclude_sub_diagonal: bool, ci: usize, cj: usize) -> Self {
        if !exclude_sub_diagonal
            || cj < layout::cj_first_from_ci::<L>(ci)
            || cj > layout::cj_last_from_ci::<L>(ci)
        {
            return Self::NONE;
        }

        let j_size = layout::j_cluster_size::<L>();
        let mut bits = 0u32;
        for i in 0..I_CLUSTER_SIZE {
            let atom_i = ci * I_CLUSTER_SIZE + i;
            for j in 0..j_size {
                let atom_j = cj * j_size + j;
                if atom_j <= atom_i {
                    bits |= 1 << (i * j_size + j);
                }
            }
        }
        Self(bits)
    }
}
