use crate::config::PruneParams;
use crate::coords::PackedCoordinates;
use crate::grid::Grid;
use crate::layout;
use crate::mask::ExclusionMask;
use crate::packer::IClusterWork;
use crate::pairlist::{JEntry, OpenIEntry};
use crate::simd::{Real, SimdLanes};

/// Distance checks charged for one box-to-box distance.
pub const BOX_DISTANCE_CHECKS: u64 = 2;

/// Returns true when any atom pair of the packed i-cluster and j-cluster
/// `cj_global` lies strictly within the cutoff.
#[inline]
fn any_atom_pair_in_range<L: SimdLanes>(
    x_ci: &[L::Scalar],
    x_j: &[L::Scalar],
    cj_global: usize,
    rc2: L,
) -> bool {
    let stride = layout::x_stride::<L>();
    let w = L::WIDTH;
    let xind = layout::x_index_from_cj::<L>(cj_global);

    let jx = L::load_duplicate_half(&x_j[xind..]);
    let jy = L::load_duplicate_half(&x_j[xind + stride..]);
    let jz = L::load_duplicate_half(&x_j[xind + 2 * stride..]);

    // Atoms 0 and 1 of the i-cluster
    let dx0 = L::load(&x_ci[0..]) - jx;
    let dy0 = L::load(&x_ci[w..]) - jy;
    let dz0 = L::load(&x_ci[2 * w..]) - jz;
    // Atoms 2 and 3
    let dx2 = L::load(&x_ci[3 * w..]) - jx;
    let dy2 = L::load(&x_ci[4 * w..]) - jy;
    let dz2 = L::load(&x_ci[5 * w..]) - jz;

    let rsq0 = L::norm2(dx0, dy0, dz0);
    let rsq2 = L::norm2(dx2, dy2, dz2);

    rsq0.any_lt(rc2) || rsq2.any_lt(rc2)
}

/// Checks whether local j-cluster `jcluster` may interact with the packed
/// i-cluster, first on bounding boxes, then on atom distances when the box
/// test is inconclusive.
#[inline]
#[allow(clippy::too_many_arguments)]
fn cluster_in_range<L: SimdLanes>(
    j_grid: &Grid,
    jcluster: usize,
    cj_offset: usize,
    work: &IClusterWork<L>,
    x_j: &[L::Scalar],
    params: &PruneParams,
    rc2: L,
    num_distance_checks: &mut u64,
) -> bool {
    let d2 = work.bb().distance2(&j_grid.j_bounding_boxes()[jcluster]);
    *num_distance_checks += BOX_DISTANCE_CHECKS;

    if d2 < params.rbb2() {
        true
    } else if (d2 as f64) < params.rlist2() {
        *num_distance_checks += 2 * L::WIDTH as u64;
        any_atom_pair_in_range::<L>(work.x_simd(), x_j, cj_offset + jcluster, rc2)
    } else {
        false
    }
}

/// Adds the j-clusters of `[first_cell, last_cell]` that may interact with
/// the current i-cluster to `entry`.
///
/// The cell range is given in i-cluster units, local to `j_grid`, and must
/// not be empty. `icluster` uses the same local numbering; it only matters
/// for the diagonal exclusion masks. `work` must hold the packed, shifted
/// coordinates and bounding box of the i-cluster.
///
/// The range is narrowed from both ends: the first and the last j-cluster
/// that pass the box or atom distance test bound the list, and every
/// j-cluster between them goes in without being tested. This relies on the
/// grid being sorted along its axis, so that in-range clusters of one
/// column are contiguous. Nothing is appended when no j-cluster passes.
#[allow(clippy::too_many_arguments)]
pub fn make_cluster_list_2xnn<L: SimdLanes>(
    j_grid: &Grid,
    entry: &mut OpenIEntry<'_>,
    icluster: usize,
    first_cell: usize,
    last_cell: usize,
    exclude_sub_diagonal: bool,
    x_j: &PackedCoordinates<L::Scalar>,
    work: &IClusterWork<L>,
    params: &PruneParams,
    num_distance_checks: &mut u64,
) {
    debug_assert!(
        last_cell >= first_cell,
        "j-cluster range must not be empty, got cells {first_cell}..={last_cell}"
    );

    let mut jcluster_first = layout::cj_first_from_ci::<L>(first_cell);
    let mut jcluster_last = layout::cj_last_from_ci::<L>(last_cell);
    if jcluster_last < jcluster_first {
        return;
    }
    debug_assert!(jcluster_last < j_grid.num_j_clusters());

    let cj_offset = layout::cj_first_from_ci::<L>(j_grid.cell_offset());
    let x_j = x_j.as_slice();
    let rc2 = L::splat(L::Scalar::from_f64(params.rlist2()));

    let mut in_range = false;
    while !in_range && jcluster_first <= jcluster_last {
        in_range = cluster_in_range(
            j_grid,
            jcluster_first,
            cj_offset,
            work,
            x_j,
            params,
            rc2,
            num_distance_checks,
        );
        if !in_range {
            jcluster_first += 1;
        }
    }
    if !in_range {
        return;
    }

    in_range = false;
    while !in_range && jcluster_last > jcluster_first {
        in_range = cluster_in_range(
            j_grid,
            jcluster_last,
            cj_offset,
            work,
            x_j,
            params,
            rc2,
            num_distance_checks,
        );
        if !in_range {
            jcluster_last -= 1;
        }
    }

    for jcluster in jcluster_first..=jcluster_last {
        entry.push(JEntry {
            cj: cj_offset + jcluster,
            excl: ExclusionMask::for_pair::<L>(exclude_sub_diagonal, icluster, jcluster),
        });
    }
    entry.mark_end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{set_i_cluster, set_i_cluster_x};
    use crate::pairlist::PairList;
    use crate::simd::ScalarLanes;
    use nalgebra::Vector3;
    use wide::{f32x8, f64x4};

    /// Clusters of four atoms, one cluster per entry of `centers`, spread
    /// by `spread` along y.
    fn clusters_at<T: Real>(centers: &[f64], spread: f64) -> Vec<Vector3<T>> {
        centers
            .iter()
            .flat_map(|&cx| {
                (0..4).map(move |a| {
                    Vector3::new(
                        T::from_f64(cx),
                        T::from_f64(a as f64 * spread),
                        T::from_f64(0.0),
                    )
                })
            })
            .collect()
    }

    struct Setup<L: SimdLanes> {
        x: PackedCoordinates<L::Scalar>,
        grid: Grid,
        work: IClusterWork<L>,
    }

    fn setup<L: SimdLanes>(centers: &[f64], spread: f64, ci: usize) -> Setup<L> {
        let x = PackedCoordinates::pack::<L>(&clusters_at::<L::Scalar>(centers, spread));
        let grid = Grid::from_coordinates::<L>(&x, 0, centers.len());
        let mut work = IClusterWork::<L>::new();
        set_i_cluster(&grid, ci, &Vector3::from_element(L::Scalar::from_f64(0.0)), &x, &mut work);
        Setup { x, grid, work }
    }

    fn run<L: SimdLanes>(
        s: &Setup<L>,
        ci: usize,
        range: (usize, usize),
        exclude: bool,
        params: &PruneParams,
        list: &mut PairList,
        checks: &mut u64,
    ) -> bool {
        let mut open = list.open_i_entry(ci, 0);
        make_cluster_list_2xnn(
            &s.grid, &mut open, ci, range.0, range.1, exclude, &s.x, &s.work, params, checks,
        );
        open.close()
    }

    #[test]
    fn test_three_cluster_scenario() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f32x8>(&[0.0, 1.0, 10.0], 0.0, 0);
        let mut list = PairList::new();
        let mut checks = 0;

        assert!(run(&s, 0, (0, 2), false, &params, &mut list, &mut checks));

        let cj: Vec<usize> = list.j_entries().iter().map(|e| e.cj).collect();
        assert_eq!(cj, vec![0, 1]);
        assert!(list.j_entries().iter().all(|e| e.excl.is_empty()));
        assert_eq!(list.i_entries()[0].j_range(), 0..2);
    }

    #[test]
    fn test_distance_check_accounting() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f32x8>(&[0.0, 1.0, 10.0], 0.0, 0);
        let mut list = PairList::new();
        let mut checks = 0;
        run(&s, 0, (0, 2), false, &params, &mut list, &mut checks);

        // Forward: cluster 0 accepted on its box. Backward: cluster 2
        // rejected on its box, cluster 1 needs the atom test.
        assert_eq!(checks, 3 * BOX_DISTANCE_CHECKS + 2 * 8);
    }

    #[test]
    fn test_nothing_in_range_leaves_list_untouched() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f64x4>(&[0.0, 5.0, 10.0], 0.1, 0);
        let mut list = PairList::new();
        let mut checks = 0;

        let mut open = list.open_i_entry(0, 0);
        make_cluster_list_2xnn(
            &s.grid, &mut open, 0, 1, 2, false, &s.x, &s.work, &params, &mut checks,
        );
        assert_eq!(open.list_len(), 0);
        assert!(!open.close());
        assert!(list.is_empty());
        // Four half-size j-clusters, all rejected on their boxes.
        assert_eq!(checks, 4 * BOX_DISTANCE_CHECKS);
    }

    #[test]
    fn test_emitted_range_stays_inside_candidates() {
        let params = PruneParams::new(1.5, 0.0).unwrap();
        let s = setup::<f32x8>(&[0.0, 0.5, 1.0, 1.5, 2.0], 0.0, 2);
        let mut list = PairList::new();
        let mut checks = 0;

        run(&s, 2, (3, 4), false, &params, &mut list, &mut checks);
        let cj: Vec<usize> = list.j_entries().iter().map(|e| e.cj).collect();
        assert_eq!(cj, vec![3, 4]);
    }

    #[test]
    fn test_box_accept_skips_atom_test() {
        // Boxes 0.1 apart: accepted on the box distance alone, no atom
        // distances are computed.
        let params = PruneParams::new(1.0, 1.0).unwrap();
        let s = setup::<f32x8>(&[0.0, 0.1], 3.0, 0);
        let mut list = PairList::new();
        let mut checks = 0;
        run(&s, 0, (1, 1), false, &params, &mut list, &mut checks);

        assert_eq!(list.num_j_entries(), 1);
        assert_eq!(checks, BOX_DISTANCE_CHECKS);
    }

    #[test]
    fn test_atom_test_rejects_ambiguous_box() {
        // The i box reaches to within 0.5 of the j-cluster, but its atoms
        // sit on opposite corners and are at least sqrt(1.25) away.
        let positions: Vec<Vector3<f32>> = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.5, 0.0, 0.0),
            Vector3::new(1.5, 0.0, 0.0),
            Vector3::new(1.5, 0.0, 0.0),
            Vector3::new(1.5, 0.0, 0.0),
        ];
        let x = PackedCoordinates::pack::<f32x8>(&positions);
        let grid = Grid::from_coordinates::<f32x8>(&x, 0, 2);
        let mut work = IClusterWork::<f32x8>::new();
        set_i_cluster(&grid, 0, &Vector3::zeros(), &x, &mut work);

        let params = PruneParams::new(1.0, 0.0).unwrap();
        let mut list = PairList::new();
        let mut checks = 0;
        let mut open = list.open_i_entry(0, 0);
        make_cluster_list_2xnn(&grid, &mut open, 0, 1, 1, false, &x, &work, &params, &mut checks);
        assert!(!open.close());
        assert_eq!(checks, BOX_DISTANCE_CHECKS + 16);

        let params = PruneParams::new(1.2, 0.0).unwrap();
        let mut checks = 0;
        let mut open = list.open_i_entry(0, 0);
        make_cluster_list_2xnn(&grid, &mut open, 0, 1, 1, false, &x, &work, &params, &mut checks);
        assert!(open.close());
        assert_eq!(list.num_j_entries(), 1);
        assert_eq!(checks, BOX_DISTANCE_CHECKS + 16);
    }

    #[test]
    fn test_diagonal_exclusion() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f32x8>(&[0.0, 0.5], 0.1, 0);
        let mut list = PairList::new();
        let mut checks = 0;
        run(&s, 0, (0, 1), true, &params, &mut list, &mut checks);

        let entries = list.j_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].excl.interaction_bits(4), 0x08ce);
        assert!(entries[1].excl.is_empty());
    }

    #[test]
    fn test_half_width_clusters_and_offset() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let x = PackedCoordinates::pack::<f64x4>(&clusters_at::<f64>(&[50.0, 0.0, 1.0, 10.0], 0.1));
        // The grid starts at global i-cluster 1.
        let grid = Grid::from_coordinates::<f64x4>(&x, 1, 3);
        let mut work = IClusterWork::<f64x4>::new();
        set_i_cluster(&grid, 0, &Vector3::zeros(), &x, &mut work);

        let mut list = PairList::new();
        let mut checks = 0;
        let mut open = list.open_i_entry(1, 0);
        make_cluster_list_2xnn(&grid, &mut open, 0, 0, 2, true, &x, &work, &params, &mut checks);
        open.close();

        let cj: Vec<usize> = list.j_entries().iter().map(|e| e.cj).collect();
        assert_eq!(cj, vec![2, 3, 4, 5]);
        let entries = list.j_entries();
        assert_eq!(entries[0].excl.interaction_bits(2), 0x0002);
        assert_eq!(entries[1].excl.interaction_bits(2), 0x002f);
        assert!(entries[2].excl.is_empty());
    }

    #[test]
    fn test_periodic_shift_brings_cluster_in_range() {
        let params = PruneParams::new(1.5, 0.2).unwrap();
        let x = PackedCoordinates::pack::<ScalarLanes>(&clusters_at::<f64>(&[0.5, 9.5], 0.1));
        let grid = Grid::from_coordinates::<ScalarLanes>(&x, 0, 2);
        let mut work = IClusterWork::<ScalarLanes>::new();

        let mut checks = 0;
        let mut list = PairList::new();
        set_i_cluster(&grid, 1, &Vector3::zeros(), &x, &mut work);
        let mut open = list.open_i_entry(1, 0);
        make_cluster_list_2xnn(&grid, &mut open, 1, 0, 0, false, &x, &work, &params, &mut checks);
        assert!(!open.close());

        // Image of cluster 1 shifted by -10 in x sits at -0.5.
        set_i_cluster(&grid, 1, &Vector3::new(-10.0, 0.0, 0.0), &x, &mut work);
        let mut open = list.open_i_entry(1, 1);
        make_cluster_list_2xnn(&grid, &mut open, 1, 0, 0, false, &x, &work, &params, &mut checks);
        assert!(open.close());
        assert_eq!(list.num_j_entries(), 2);
    }

    #[test]
    fn test_inexact_f32_shift_keeps_cluster_in_range() {
        // Shifted, the i-cluster sits at x = 3e-6, just under the cutoff
        // from the j-cluster at x = 1. The shift has no exact f32 value.
        let params = PruneParams::new(1.0, 0.0).unwrap();
        let s = setup::<f64x4>(&[-99.0, 1.0], 0.0, 0);
        let mut work = IClusterWork::<f64x4>::new();
        let shift = Vector3::new(99.000003, 0.0, 0.0);
        set_i_cluster(&s.grid, 0, &shift, &s.x, &mut work);
        assert!(work.bb().upper.x as f64 >= -99.0 + 99.000003);

        let mut list = PairList::new();
        let mut checks = 0;
        let mut open = list.open_i_entry(0, 1);
        make_cluster_list_2xnn(&s.grid, &mut open, 0, 1, 1, false, &s.x, &work, &params, &mut checks);
        assert!(open.close());

        let cj: Vec<usize> = list.j_entries().iter().map(|e| e.cj).collect();
        assert_eq!(cj, vec![2, 3]);
        // Both half j-clusters go through the atom test.
        assert_eq!(checks, 2 * (BOX_DISTANCE_CHECKS + 8));
    }

    #[test]
    fn test_packed_buffer_drives_atom_test() {
        // Same bounding box, different packed coordinates: the atom test
        // reads the buffer, not the grid.
        let params = PruneParams::new(1.0, 0.0).unwrap();
        let s = setup::<f64x4>(&[0.0, 0.8], 0.0, 0);
        let mut work = IClusterWork::<f64x4>::new();
        crate::packer::set_i_cluster_bb(&s.grid.i_bounding_boxes()[0], &Vector3::zeros(), &mut work);
        set_i_cluster_x(0, &Vector3::new(-5.0, 0.0, 0.0), &s.x, &mut work);

        let mut list = PairList::new();
        let mut checks = 0;
        let mut open = list.open_i_entry(0, 0);
        make_cluster_list_2xnn(&s.grid, &mut open, 0, 1, 1, false, &s.x, &work, &params, &mut checks);
        assert!(!open.close());
        assert_eq!(checks, 2 * (BOX_DISTANCE_CHECKS + 8));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "j-cluster range must not be empty")]
    fn test_empty_range_asserts() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f32x8>(&[0.0, 1.0], 0.0, 0);
        let mut list = PairList::new();
        let mut checks = 0;
        run(&s, 0, (1, 0), false, &params, &mut list, &mut checks);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn test_empty_range_appends_nothing() {
        let params = PruneParams::new(1.5, 0.5).unwrap();
        let s = setup::<f32x8>(&[0.0, 1.0], 0.0, 0);
        let mut list = PairList::new();
        let mut checks = 0;
        assert!(!run(&s, 0, (1, 0), false, &params, &mut list, &mut checks));
        assert_eq!(list.num_j_entries(), 0);
        assert_eq!(checks, 0);
    }
}
