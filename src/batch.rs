use crate::config::{self, PruneParams};
use crate::coords::PackedCoordinates;
use crate::grid::Grid;
use crate::layout;
use crate::packer::{IClusterWork, set_i_cluster};
use crate::pairlist::PairList;
use crate::prune::make_cluster_list_2xnn;
use crate::simd::{Real, SimdLanes};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::{debug, info_span};

const PARALLEL_TASKS_PER_THREAD: usize = 8;

#[derive(Error, Debug, PartialEq)]
pub enum BatchError {
    #[error("job {job}: i-cluster {icluster} is outside the grid ({num_i_clusters} clusters)")]
    IClusterOutOfRange {
        job: usize,
        icluster: usize,
        num_i_clusters: usize,
    },
    #[error("job {job}: empty cell range {first}..={last}")]
    EmptyCellRange {
        job: usize,
        first: usize,
        last: usize,
    },
    #[error("job {job}: cell {last} is outside the grid ({num_i_clusters} clusters)")]
    CellOutOfRange {
        job: usize,
        last: usize,
        num_i_clusters: usize,
    },
    #[error("grid needs {needed} i-clusters of coordinates, but only {available} are packed")]
    CoordinatesTooShort { needed: usize, available: usize },
    #[error("grid has {got} j-cluster boxes, expected {expected}")]
    JBoxCountMismatch { got: usize, expected: usize },
}

/// One i-cluster under one periodic shift, with the cell ranges to search.
///
/// Cluster and cell indices are local to the grid. All ranges of a job end
/// up in the same i-record of the list.
#[derive(Clone, Debug)]
pub struct PruneJob<T: Real> {
    pub icluster: usize,
    pub shift_index: usize,
    pub shift: Vector3<T>,
    pub cells: Vec<RangeInclusive<usize>>,
    pub exclude_sub_diagonal: bool,
}

#[derive(Debug, Default)]
pub struct BatchOutput {
    pub list: PairList,
    pub num_distance_checks: u64,
}

/// Prunes every job against `grid` and returns the merged pair list, in
/// job order.
pub fn prune_batch<L: SimdLanes>(
    grid: &Grid,
    x: &PackedCoordinates<L::Scalar>,
    jobs: &[PruneJob<L::Scalar>],
    params: &PruneParams,
) -> Result<BatchOutput, BatchError> {
    let _span = info_span!("prune_batch", n_jobs = jobs.len()).entered();
    validate_jobs::<L>(grid, x, jobs)?;

    let parts: Vec<(PairList, u64)> = if jobs.len() >= config::get_parallel_threshold() {
        let num_threads = rayon::current_num_threads();
        let chunk_len = (jobs.len() / (num_threads * PARALLEL_TASKS_PER_THREAD))
            .max(config::get_min_jobs_per_task());
        jobs.par_chunks(chunk_len)
            .map(|chunk| prune_chunk::<L>(grid, x, chunk, params))
            .collect()
    } else {
        vec![prune_chunk::<L>(grid, x, jobs, params)]
    };

    let num_distance_checks: u64 = parts.iter().map(|(_, checks)| checks).sum();
    let list = PairList::combine(parts.into_iter().map(|(list, _)| list));

    debug!(
        n_jobs = jobs.len(),
        n_i_entries = list.num_i_entries(),
        n_j_entries = list.num_j_entries(),
        num_distance_checks,
        "pruned batch"
    );

    Ok(BatchOutput {
        list,
        num_distance_checks,
    })
}

fn prune_chunk<L: SimdLanes>(
    grid: &Grid,
    x: &PackedCoordinates<L::Scalar>,
    jobs: &[PruneJob<L::Scalar>],
    params: &PruneParams,
) -> (PairList, u64) {
    let mut work = IClusterWork::<L>::new();
    let mut list = PairList::with_capacity(jobs.len(), jobs.len() * 4);
    let mut checks = 0;

    for job in jobs {
        set_i_cluster(grid, job.icluster, &job.shift, x, &mut work);
        let mut open = list.open_i_entry(grid.cell_offset() + job.icluster, job.shift_index);
        for cells in &job.cells {
            make_cluster_list_2xnn(
                grid,
                &mut open,
                job.icluster,
                *cells.start(),
                *cells.end(),
                job.exclude_sub_diagonal,
                x,
                &work,
                params,
                &mut checks,
            );
        }
        open.close();
    }
    (list, checks)
}

fn validate_jobs<L: SimdLanes>(
    grid: &Grid,
    x: &PackedCoordinates<L::Scalar>,
    jobs: &[PruneJob<L::Scalar>],
) -> Result<(), BatchError> {
    let num_i_clusters = grid.num_i_clusters();
    let needed = grid.cell_offset() + num_i_clusters;
    if needed > x.n_i_clusters() {
        return Err(BatchError::CoordinatesTooShort {
            needed,
            available: x.n_i_clusters(),
        });
    }
    let expected = num_i_clusters * layout::j_clusters_per_i_cluster::<L>();
    if grid.num_j_clusters() != expected {
        return Err(BatchError::JBoxCountMismatch {
            got: grid.num_j_clusters(),
            expected,
        });
    }

    for (i, job) in jobs.iter().enumerate() {
        if job.icluster >= num_i_clusters {
            return Err(BatchError::IClusterOutOfRange {
                job: i,
                icluster: job.icluster,
                num_i_clusters,
            });
        }
        for cells in &job.cells {
            if cells.is_empty() {
                return Err(BatchError::EmptyCellRange {
                    job: i,
                    first: *cells.start(),
                    last: *cells.end(),
                });
            }
            if *cells.end() >= num_i_clusters {
                return Err(BatchError::CellOutOfRange {
                    job: i,
                    last: *cells.end(),
                    num_i_clusters,
                });
            }
        }
    }
    Ok(())
}
