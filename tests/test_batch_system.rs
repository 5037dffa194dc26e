use clusterpair_rs::{Grid, PackedCoordinates, PruneJob, PruneParams, prune_batch};
use nalgebra::Vector3;
use wide::f64x4;

#[test]
fn test_prune_batch_periodic_images() {
    // Cluster 0 near x = 0.5, cluster 1 near x = 9.5 in a box of length 10.
    let positions: Vec<Vector3<f64>> = [0.5, 9.5]
        .iter()
        .flat_map(|&x| (0..4).map(move |a| Vector3::new(x, 0.1 * a as f64, 0.0)))
        .collect();
    let x = PackedCoordinates::pack::<f64x4>(&positions);
    let grid = Grid::from_coordinates::<f64x4>(&x, 0, 2);
    let params = PruneParams::new(1.5, 0.3).unwrap();

    let jobs = vec![
        // Central image: cluster 1 only sees itself.
        PruneJob {
            icluster: 1,
            shift_index: 0,
            shift: Vector3::zeros(),
            cells: vec![0..=1],
            exclude_sub_diagonal: true,
        },
        // Shifted by -10 in x, cluster 1 sits at -0.5, next to cluster 0.
        PruneJob {
            icluster: 1,
            shift_index: 1,
            shift: Vector3::new(-10.0, 0.0, 0.0),
            cells: vec![0..=1],
            exclude_sub_diagonal: false,
        },
    ];

    let out = prune_batch::<f64x4>(&grid, &x, &jobs, &params).unwrap();
    assert_eq!(out.list.num_i_entries(), 2);

    let central = out.list.i_entries()[0];
    assert_eq!(central.shift(), 0);
    let cj: Vec<usize> = out.list.j_entries_of(&central).iter().map(|e| e.cj).collect();
    assert_eq!(cj, vec![2, 3]);

    let shifted = out.list.i_entries()[1];
    assert_eq!(shifted.shift(), 1);
    let cj: Vec<usize> = out.list.j_entries_of(&shifted).iter().map(|e| e.cj).collect();
    assert_eq!(cj, vec![0, 1]);
    assert!(
        out.list
            .j_entries_of(&shifted)
            .iter()
            .all(|e| e.excl.is_empty())
    );
    assert!(out.num_distance_checks > 0);
}

#[test]
fn test_prune_batch_drops_isolated_clusters() {
    let positions: Vec<Vector3<f64>> = [0.0, 20.0, 40.0]
        .iter()
        .flat_map(|&x| (0..4).map(move |a| Vector3::new(x, 0.1 * a as f64, 0.0)))
        .collect();
    let x = PackedCoordinates::pack::<f64x4>(&positions);
    let grid = Grid::from_coordinates::<f64x4>(&x, 0, 3);
    let params = PruneParams::new(2.0, 0.5).unwrap();

    // Cluster 0 against clusters 1 and 2 only: nothing within range.
    let jobs = vec![PruneJob {
        icluster: 0,
        shift_index: 0,
        shift: Vector3::zeros(),
        cells: vec![1..=2],
        exclude_sub_diagonal: false,
    }];

    let out = prune_batch::<f64x4>(&grid, &x, &jobs, &params).unwrap();
    assert!(out.list.is_empty());
    assert_eq!(out.num_distance_checks, 4 * 2);
}
