use crate::coords::PackedCoordinates;
use crate::simd::Real;
use nalgebra::Vector3;

/// Axis-aligned single precision box around the atoms of one cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub lower: Vector3<f32>,
    pub upper: Vector3<f32>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::far_away()
    }
}

impl BoundingBox {
    pub fn new(lower: Vector3<f32>, upper: Vector3<f32>) -> Self {
        Self { lower, upper }
    }

    /// Degenerate box at the padding location; never within any cutoff
    /// of a real cluster.
    pub fn far_away() -> Self {
        let p = Vector3::repeat(crate::coords::FAR_AWAY as f32);
        Self { lower: p, upper: p }
    }

    /// Smallest box containing `positions`. Double precision input is
    /// rounded outward so the box still encloses every atom.
    pub fn enclosing<T: Real>(positions: impl IntoIterator<Item = Vector3<T>>) -> Self {
        let mut lower = Vector3::repeat(f32::INFINITY);
        let mut upper = Vector3::repeat(f32::NEG_INFINITY);
        let mut empty = true;
        for p in positions {
            empty = false;
            for d in 0..3 {
                lower[d] = lower[d].min(p[d].round_down_f32());
                upper[d] = upper[d].max(p[d].round_up_f32());
            }
        }
        if empty {
            return Self::far_away();
        }
        Self { lower, upper }
    }

    /// Box around the real atoms `first..first + count` of `x`.
    pub fn of_atoms<T: Real>(x: &PackedCoordinates<T>, first: usize, count: usize) -> Self {
        let end = (first + count).min(x.n_atoms());
        Self::enclosing((first..end.max(first)).map(|a| x.atom(a)))
    }

    /// Box translated by `shift`. The sum is taken in double precision and
    /// rounded outward, so the result still encloses the shifted atoms.
    pub fn shifted<T: Real>(&self, shift: &Vector3<T>) -> Self {
        let mut lower = self.lower;
        let mut upper = self.upper;
        for d in 0..3 {
            let s = shift[d].to_f64();
            lower[d] = (self.lower[d] as f64 + s).round_down_f32();
            upper[d] = (self.upper[d] as f64 + s).round_up_f32();
        }
        Self { lower, upper }
    }

    /// Squared distance between the closest faces of two boxes, zero when
    /// they overlap. A lower bound on every atom-pair distance.
    #[inline]
    pub fn distance2(&self, other: &BoundingBox) -> f32 {
        let mut d2 = 0.0f32;
        for d in 0..3 {
            let dl = self.lower[d] - other.upper[d];
            let dh = other.lower[d] - self.upper[d];
            let dm = dl.max(dh).max(0.0);
            d2 += dm * dm;
        }
        d2
    }
}
