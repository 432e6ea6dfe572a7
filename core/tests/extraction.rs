//! Sweep trajectory extraction: ordering, sentinels, end-of-data.

use mulan_core::{
    error::AnalysisError,
    extract::{extract, extract_single, TrajectoryQuery},
    frame::{Field, Frame},
    run::{tag_sweep, Run, RunParams, SweepParam},
    synthetic::SyntheticSweep,
};

fn run_with(tag: f64, index: u32, frames: Vec<Frame>) -> Run {
    let params = RunParams { fixed_y: Some(tag), ..RunParams::default() };
    let mut run = Run::new(format!("run-{index}"), index, params);
    for f in frames {
        run.push_frame(f);
    }
    run
}

fn consumers(t: u64, traits: Vec<f64>, masses: Vec<f64>) -> Frame {
    let n = traits.len();
    Frame::new(t, vec![1; n], traits, masses, vec![0.1; n]).expect("valid frame")
}

/// Element-wise equality where NaN == NaN.
fn assert_same(actual: &[f64], expected: &[f64], what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}: length differs: {actual:?} vs {expected:?}");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a.is_nan() && e.is_nan()) || a == e,
            "{what}[{i}]: got {a}, expected {e} (full: {actual:?})"
        );
    }
}

#[test]
fn two_run_sweep_matches_reference_layout() {
    let runs = vec![
        run_with(0.1, 0, vec![consumers(0, vec![3.0, 1.0, 2.0], vec![30.0, 10.0, 20.0])]),
        run_with(0.2, 1, vec![consumers(0, vec![5.0, 4.0], vec![50.0, 40.0])]),
    ];
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();
    let out = extract(&tagged, &TrajectoryQuery::default())
        .unwrap()
        .expect("every run has a last frame");

    let nan = f64::NAN;
    assert_same(&out.x, &[3.0, 2.0, 1.0, nan, 5.0, 4.0, nan], "x");
    assert_same(&out.z, &[30.0, 20.0, 10.0, nan, 50.0, 40.0, nan], "z");
    assert_same(&out.y, &[0.1, 0.1, 0.1, nan, 0.2, 0.2, nan], "y");
    assert_same(&out.c, &[0.0, 0.0, 0.0, nan, 1.0, 1.0, nan], "c");
}

#[test]
fn synthetic_sweep_satisfies_layout_properties() {
    let runs = SyntheticSweep { runs: 4, frames: 6, ..SyntheticSweep::default() }
        .generate()
        .unwrap();
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();

    for time in [0, 3, 5, -1, -6] {
        let query = TrajectoryQuery::default().at(time);
        let out = extract(&tagged, &query).unwrap().expect("time index within every run");

        // equal lengths
        assert_eq!(out.x.len(), out.y.len());
        assert_eq!(out.x.len(), out.z.len());
        assert_eq!(out.x.len(), out.c.len());

        // length = sum(filtered + 1), non-NaN count = sum(filtered)
        let filtered: Vec<usize> = runs
            .iter()
            .map(|r| {
                let i = if time >= 0 { time as usize } else { r.frames.len() - time.unsigned_abs() as usize };
                r.frames[i].slots_of_type(1).len()
            })
            .collect();
        let total: usize = filtered.iter().sum();
        assert_eq!(out.len(), total + runs.len());
        assert_eq!(out.c.iter().filter(|v| !v.is_nan()).count(), total);

        // blocks in run order, trait non-increasing inside each
        let blocks = out.blocks();
        assert_eq!(blocks.len(), runs.len());
        for (k, block) in blocks.into_iter().enumerate() {
            assert_eq!(block.len(), filtered[k]);
            let xs = &out.x[block.clone()];
            assert!(
                xs.windows(2).all(|w| w[0] >= w[1]),
                "run {k} at time {time} not descending: {xs:?}"
            );
            assert!(out.c[block.clone()].iter().all(|&c| c == k as f64));
            assert!(out.y[block].iter().all(|&y| y == tagged[k].tag));
        }
    }
}

#[test]
fn short_run_ends_the_sweep() {
    let long = (0..3).map(|t| consumers(t, vec![1.0], vec![1.0])).collect();
    let short = (0..2).map(|t| consumers(t, vec![2.0], vec![2.0])).collect();
    let runs = vec![run_with(0.1, 0, long), run_with(0.2, 1, short)];
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();

    let q = TrajectoryQuery::default();
    assert!(extract(&tagged, &q.at(1)).unwrap().is_some());
    assert!(extract(&tagged, &q.at(2)).unwrap().is_none(), "second run has no frame 2");
    assert!(extract(&tagged, &q.at(-2)).unwrap().is_some());
    assert!(extract(&tagged, &q.at(-3)).unwrap().is_none(), "second run has only 2 frames");
}

#[test]
fn empty_run_ends_the_sweep_even_at_last_frame() {
    let runs = vec![
        run_with(0.1, 0, vec![consumers(0, vec![1.0], vec![1.0])]),
        run_with(0.2, 1, vec![]),
    ];
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();
    assert!(extract(&tagged, &TrajectoryQuery::default()).unwrap().is_none());
}

#[test]
fn run_without_matching_species_contributes_only_a_sentinel() {
    let resources = Frame::new(0, vec![0, 0], vec![1.0, 2.0], vec![5.0, 6.0], vec![0.0, 0.0]).unwrap();
    let runs = vec![
        run_with(0.1, 0, vec![resources]),
        run_with(0.2, 1, vec![consumers(0, vec![4.0], vec![40.0])]),
    ];
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();
    let out = extract(&tagged, &TrajectoryQuery::default()).unwrap().unwrap();

    assert_eq!(out.len(), 3);
    assert!(out.x[0].is_nan());
    assert_eq!(out.x[1], 4.0);
    assert_eq!(out.c[1], 1.0);
    assert_eq!(out.blocks(), vec![0..0, 1..2]);
}

#[test]
fn malformed_frame_is_fatal() {
    let mut bad = consumers(0, vec![1.0, 2.0], vec![1.0, 2.0]);
    bad.masses.pop();
    let runs = vec![run_with(0.1, 0, vec![bad])];
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();

    let err = extract(&tagged, &TrajectoryQuery::default()).unwrap_err();
    assert!(
        matches!(err, AnalysisError::MalformedFrame { field: "_masses", expected: 2, actual: 1, .. }),
        "unexpected error: {err:?}"
    );
}

#[test]
fn extraction_is_idempotent() {
    let runs = SyntheticSweep::default().generate().unwrap();
    let tagged = tag_sweep(&runs, SweepParam::FixedY).unwrap();
    let q = TrajectoryQuery::default().at(7);

    let a = extract(&tagged, &q).unwrap().unwrap();
    let b = extract(&tagged, &q).unwrap().unwrap();
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.x), bits(&b.x));
    assert_eq!(bits(&a.y), bits(&b.y));
    assert_eq!(bits(&a.z), bits(&b.z));
    assert_eq!(bits(&a.c), bits(&b.c));
}

#[test]
fn single_run_uses_same_ordering_without_sentinel() {
    let frame = Frame::new(
        0,
        vec![1, 0, 1, 1],
        vec![3.0, 9.0, 1.0, 2.0],
        vec![30.0, 90.0, 10.0, 20.0],
        vec![0.3, 0.9, 0.1, 0.2],
    )
    .unwrap();
    let out = extract_single(&[frame], &TrajectoryQuery::default(), Field::NicheWidth)
        .unwrap()
        .unwrap();
    assert_eq!(out.x, vec![3.0, 2.0, 1.0]);
    assert_eq!(out.y, vec![0.3, 0.2, 0.1]);
    assert_eq!(out.z, vec![30.0, 20.0, 10.0]);

    assert!(extract_single(&[], &TrajectoryQuery::default(), Field::NicheWidth)
        .unwrap()
        .is_none());
}

#[test]
fn alternative_fields_and_tags() {
    let frame = Frame::new(0, vec![1, 1], vec![1.0, 2.0], vec![5.0, 6.0], vec![0.7, 0.3]).unwrap();
    let params = RunParams { dt: Some(0.01), ..RunParams::default() };
    let mut run = Run::new("r", 0, params);
    run.push_frame(frame);
    let runs = vec![run];

    assert!(matches!(
        tag_sweep(&runs, SweepParam::FixedY),
        Err(AnalysisError::MissingParameter { .. })
    ));

    let tagged = tag_sweep(&runs, SweepParam::Dt).unwrap();
    let query = TrajectoryQuery { x: Field::NicheWidth, z: Field::Trait, ..TrajectoryQuery::default() };
    let out = extract(&tagged, &query).unwrap().unwrap();
    assert_eq!(&out.x[..2], &[0.7, 0.3]);
    assert_eq!(&out.z[..2], &[1.0, 2.0]);
    assert_eq!(&out.y[..2], &[0.01, 0.01]);
}
