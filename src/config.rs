use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

// Default heuristic values for batch pruning.
const DEFAULT_PARALLEL_THRESHOLD: usize = 64;
const DEFAULT_MIN_JOBS_PER_TASK: usize = 16;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);
static MIN_JOBS_PER_TASK: AtomicUsize = AtomicUsize::new(DEFAULT_MIN_JOBS_PER_TASK);

/// Minimal number of jobs before a batch is spread over the thread pool.
pub fn get_parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

pub fn set_parallel_threshold(val: usize) {
    PARALLEL_THRESHOLD.store(val, Ordering::Relaxed);
}

pub fn get_min_jobs_per_task() -> usize {
    MIN_JOBS_PER_TASK.load(Ordering::Relaxed)
}

pub fn set_min_jobs_per_task(val: usize) {
    MIN_JOBS_PER_TASK.store(val.max(1), Ordering::Relaxed);
}

#[derive(Error, Debug, PartialEq)]
pub enum ParamsError {
    #[error("list cutoff must be positive and finite, got {0}")]
    InvalidCutoff(f64),
    #[error("bounding-box-only radius must be non-negative and finite, got {0}")]
    InvalidBoundingBoxRadius(f64),
    #[error("bounding-box-only radius {rbb} exceeds the list cutoff {rlist}")]
    BoundingBoxRadiusTooLarge { rbb: f64, rlist: f64 },
    #[error("cell sizes must be non-negative and finite")]
    InvalidCellSize,
}

/// Squared radii used by the pruner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PruneParams {
    rlist2: f64,
    rbb2: f32,
}

impl PruneParams {
    /// `rlist` is the list cutoff; cluster pairs with a bounding-box
    /// distance below `rbb` are accepted without atom distance checks.
    pub fn new(rlist: f64, rbb: f64) -> Result<Self, ParamsError> {
        validate_cutoff(rlist)?;
        if !rbb.is_finite() || rbb < 0.0 {
            return Err(ParamsError::InvalidBoundingBoxRadius(rbb));
        }
        if rbb > rlist {
            return Err(ParamsError::BoundingBoxRadiusTooLarge { rbb, rlist });
        }
        Ok(Self {
            rlist2: rlist * rlist,
            rbb2: widened_square(rbb),
        })
    }

    /// Derives the bounding-box-only radius from the x/y cell sizes of the
    /// i- and j-grids, see [`bounding_box_only_distance2`].
    pub fn from_cell_sizes(
        rlist: f64,
        i_cell_size: [f64; 2],
        j_cell_size: [f64; 2],
    ) -> Result<Self, ParamsError> {
        validate_cutoff(rlist)?;
        if i_cell_size
            .iter()
            .chain(j_cell_size.iter())
            .any(|s| !s.is_finite() || *s < 0.0)
        {
            return Err(ParamsError::InvalidCellSize);
        }
        Ok(Self {
            rlist2: rlist * rlist,
            rbb2: bounding_box_only_distance2(i_cell_size, j_cell_size, rlist),
        })
    }

    pub fn rlist2(&self) -> f64 {
        self.rlist2
    }

    pub fn rbb2(&self) -> f32 {
        self.rbb2
    }
}

fn validate_cutoff(rlist: f64) -> Result<(), ParamsError> {
    if !rlist.is_finite() || rlist <= 0.0 {
        return Err(ParamsError::InvalidCutoff(rlist));
    }
    Ok(())
}

/// Squared distance below which a cluster pair goes into the list on its
/// bounding-box distance alone.
///
/// The cutoff minus half the average x/y cell diagonal: boxes this close
/// almost always contain an atom pair within range.
pub fn bounding_box_only_distance2(
    i_cell_size: [f64; 2],
    j_cell_size: [f64; 2],
    rlist: f64,
) -> f32 {
    let bbx = 0.5 * (i_cell_size[0] + j_cell_size[0]);
    let bby = 0.5 * (i_cell_size[1] + j_cell_size[1]);
    let rbb = (rlist - 0.5 * (bbx * bbx + bby * bby).sqrt()).max(0.0);
    widened_square(rbb)
}

/// `r * r` in single precision, widened by one ulp so it never drops below
/// the exact value.
fn widened_square(r: f64) -> f32 {
    ((1.0 + f32::EPSILON as f64) * r * r) as f32
}
