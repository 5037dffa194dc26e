//! Cluster-pair list pruning for short-range molecular dynamics.
//!
//! Atoms are grouped in clusters of four. For one i-cluster and a sorted
//! range of candidate j-clusters, [`prune::make_cluster_list_2xnn`] finds
//! the contiguous sub-range that may hold atom pairs within the list cutoff
//! and appends it to a [`pairlist::PairList`]. Coordinates of the i-cluster
//! are first packed into vector lanes by [`packer::set_i_cluster_x`].

pub mod batch;
pub mod bbox;
pub mod config;
pub mod coords;
pub mod grid;
pub mod layout;
pub mod mask;
pub mod packer;
pub mod pairlist;
pub mod prune;
pub mod simd;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use tracing_subscriber::EnvFilter;

pub use batch::{BatchError, BatchOutput, PruneJob, prune_batch};
pub use bbox::BoundingBox;
pub use config::{ParamsError, PruneParams};
pub use coords::{CoordinatesError, PackedCoordinates};
pub use grid::Grid;
pub use mask::ExclusionMask;
pub use packer::{IClusterWork, set_i_cluster, set_i_cluster_bb, set_i_cluster_x};
pub use pairlist::{IEntry, JEntry, OpenIEntry, PairList};
pub use prune::make_cluster_list_2xnn;
pub use simd::{Real, ScalarLanes, SimdLanes};

/// Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over
/// `level`; without either the filter is `info`. Later calls are no-ops.
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_thread_ids(true)
        .try_init();
}
