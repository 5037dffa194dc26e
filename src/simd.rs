use nalgebra::Scalar;
use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};
use wide::{CmpLt, f32x8, f64x4};

/// Floating point type of the atom coordinates.
pub trait Real:
    Scalar
    + Copy
    + Default
    + PartialOrd
    + Debug
    + Send
    + Sync
    + bytemuck::Pod
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
{
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    /// Largest f32 not above `self`.
    fn round_down_f32(self) -> f32;
    /// Smallest f32 not below `self`.
    fn round_up_f32(self) -> f32;
}

impl Real for f32 {
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn round_down_f32(self) -> f32 {
        self
    }
    #[inline]
    fn round_up_f32(self) -> f32 {
        self
    }
}

impl Real for f64 {
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn round_down_f32(self) -> f32 {
        let f = self as f32;
        if f as f64 > self { next_toward_neg_inf(f) } else { f }
    }
    #[inline]
    fn round_up_f32(self) -> f32 {
        let f = self as f32;
        if (f as f64) < self { -next_toward_neg_inf(-f) } else { f }
    }
}

fn next_toward_neg_inf(f: f32) -> f32 {
    if f == 0.0 {
        return -f32::from_bits(1);
    }
    let bits = f.to_bits();
    if f > 0.0 {
        f32::from_bits(bits - 1)
    } else {
        f32::from_bits(bits + 1)
    }
}

/// A fixed-width vector of `WIDTH` reals.
///
/// The pruner works on the "2 x half-width" layout: every vector is split
/// into a lower and an upper half of `WIDTH / 2` lanes. `WIDTH` must be even.
pub trait SimdLanes:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    type Scalar: Real;

    const WIDTH: usize;

    fn splat(v: Self::Scalar) -> Self;

    /// Loads `WIDTH` consecutive values.
    fn load(src: &[Self::Scalar]) -> Self;

    /// Stores all lanes into the first `WIDTH` slots of `dst`.
    fn store(self, dst: &mut [Self::Scalar]);

    /// `src[0]` broadcast to the lower half, `src[1]` to the upper half.
    fn load_u1_dual_half(src: &[Self::Scalar]) -> Self;

    /// `src[..WIDTH / 2]` copied into both halves.
    fn load_duplicate_half(src: &[Self::Scalar]) -> Self;

    /// True when any lane of `self` is strictly below the same lane of `other`.
    fn any_lt(self, other: Self) -> bool;

    #[inline]
    fn norm2(dx: Self, dy: Self, dz: Self) -> Self {
        dx * dx + dy * dy + dz * dz
    }
}

macro_rules! impl_wide_lanes {
    ($simd:ty, $scalar:ty, $width:expr) => {
        impl SimdLanes for $simd {
            type Scalar = $scalar;

            const WIDTH: usize = $width;

            #[inline]
            fn splat(v: $scalar) -> Self {
                <$simd>::splat(v)
            }

            #[inline]
            fn load(src: &[$scalar]) -> Self {
                let mut a = [0.0; $width];
                a.copy_from_slice(&src[..$width]);
                <$simd>::from(a)
            }

            #[inline]
            fn store(self, dst: &mut [$scalar]) {
                dst[..$width].copy_from_slice(&self.to_array());
            }

            #[inline]
            fn load_u1_dual_half(src: &[$scalar]) -> Self {
                let half = $width / 2;
                let mut a = [src[0]; $width];
                a[half..].fill(src[1]);
                <$simd>::from(a)
            }

            #[inline]
            fn load_duplicate_half(src: &[$scalar]) -> Self {
                let half = $width / 2;
                let mut a = [0.0; $width];
                a[..half].copy_from_slice(&src[..half]);
                a[half..].copy_from_slice(&src[..half]);
                <$simd>::from(a)
            }

            #[inline]
            fn any_lt(self, other: Self) -> bool {
                self.cmp_lt(other).any()
            }
        }
    };
}

impl_wide_lanes!(f32x8, f32, 8);
impl_wide_lanes!(f64x4, f64, 4);

pub const SCALAR_LANES_WIDTH: usize = 4;

/// Portable fallback with plain per-lane loops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarLanes(pub [f64; SCALAR_LANES_WIDTH]);

impl Add for ScalarLanes {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|k| self.0[k] + rhs.0[k]))
    }
}

impl Sub for ScalarLanes {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|k| self.0[k] - rhs.0[k]))
    }
}

impl Mul for ScalarLanes {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|k| self.0[k] * rhs.0[k]))
    }
}

impl SimdLanes for ScalarLanes {
    type Scalar = f64;

    const WIDTH: usize = SCALAR_LANES_WIDTH;

    #[inline]
    fn splat(v: f64) -> Self {
        Self([v; SCALAR_LANES_WIDTH])
    }

    #[inline]
    fn load(src: &[f64]) -> Self {
        Self(std::array::from_fn(|k| src[k]))
    }

    #[inline]
    fn store(self, dst: &mut [f64]) {
        dst[..SCALAR_LANES_WIDTH].copy_from_slice(&self.0);
    }

    #[inline]
    fn load_u1_dual_half(src: &[f64]) -> Self {
        let half = SCALAR_LANES_WIDTH / 2;
        Self(std::array::from_fn(|k| if k < half { src[0] } else { src[1] }))
    }

    #[inline]
    fn load_duplicate_half(src: &[f64]) -> Self {
        let half = SCALAR_LANES_WIDTH / 2;
        Self(std::array::from_fn(|k| src[k % half]))
    }

    #[inline]
    fn any_lt(self, other: Self) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a < b)
    }
}
