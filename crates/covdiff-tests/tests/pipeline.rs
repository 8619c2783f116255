//! End-to-end tests: raw bitmaps → snapshots on disk → project → stability,
//! comparison and queries.
//!
//! Every test starts from the fixture campaign in `covdiff_tests`, written
//! to a fresh temporary directory exactly as `covdiff extract` would lay
//! it out.

use covdiff_analysis::query::{self, Query};
use covdiff_analysis::{
    CompareConfig, CompareMode, DifferentialComparator, Project, ProjectStability, overlap,
};
use covdiff_extract::{Compression, read_json, read_project, write_json};
use covdiff_tests::write_campaign;
use covdiff_types::CoverageKind;

fn load() -> (tempfile::TempDir, Project) {
    let dir = tempfile::tempdir().expect("tempdir");
    write_campaign(dir.path()).expect("fixture campaign should extract");
    let fuzzers = read_project(dir.path()).expect("project should load");
    let project = Project::new(fuzzers, 2).expect("project should validate");
    (dir, project)
}

fn lines(rows: &[(String, u8)]) -> Vec<(&str, u8)> {
    rows.iter().map(|(l, s)| (l.as_str(), *s)).collect()
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn campaign_loads_with_shared_universe() {
    let (_dir, project) = load();
    assert_eq!(project.fuzzers().collect::<Vec<_>>(), vec!["afl", "libfuzzer"]);
    assert_eq!(project.universe(), 6);
    assert_eq!(project.available_kinds(), CoverageKind::ALL.to_vec());

    let afl = project.runs("afl").unwrap();
    assert_eq!(afl.len(), 2);
    assert_eq!(afl[0].blocks().len(), 3);
    assert_eq!(afl[0].lines().len(), 2, "block 4 has no line info");
}

// ── Stability ─────────────────────────────────────────────────────────────────

#[test]
fn stability_scores_match_hit_fractions() {
    let (_dir, project) = load();
    let stability = project.stability().unwrap();

    let afl = stability.fuzzer("afl").unwrap();
    let scores: Vec<(u32, u8)> = afl.blocks.iter().map(|(b, s)| (*b, s)).collect();
    assert_eq!(scores, vec![(0, 10), (1, 10), (2, 5), (4, 5)]);

    let lf = stability.fuzzer("libfuzzer").unwrap();
    assert_eq!(lf.lines.score(&"b.c:11".to_string()), Some(5));
    assert_eq!(lf.edges.as_ref().unwrap().score(&2), Some(10));

    for fuzzer in stability.fuzzers.values() {
        for kind in CoverageKind::ALL {
            let histogram = fuzzer.histogram(kind).unwrap();
            assert_eq!(Some(histogram.total()), fuzzer.observed(kind));
        }
    }
}

#[test]
fn stability_record_survives_compressed_storage() {
    let (dir, project) = load();
    let stability = project.stability().unwrap();

    let path = dir.path().join("stability.json.zst");
    write_json(&path, &stability, Compression::Zstd).unwrap();
    let back: ProjectStability = read_json(&path).unwrap();
    assert_eq!(back, stability);
}

// ── Comparison ────────────────────────────────────────────────────────────────

#[test]
fn cumulative_comparison_counts_union_differences() {
    let (_dir, project) = load();
    let config = CompareConfig {
        mode: CompareMode::Cumulative,
        ..CompareConfig::default()
    };
    let results = project
        .compare_all("afl", &CoverageKind::ALL, config)
        .unwrap();
    let lf = &results["libfuzzer"];

    let counts: Vec<(CoverageKind, f64, f64)> = lf
        .iter()
        .map(|c| (c.kind, c.new.value, c.missed.value))
        .collect();
    assert_eq!(
        counts,
        vec![
            (CoverageKind::Lines, 3.0, 2.0),
            (CoverageKind::Blocks, 2.0, 3.0),
            (CoverageKind::Edges, 1.0, 1.0),
        ]
    );
    assert_eq!(lf[1].new_percent.unwrap().value, 50.0);
}

#[test]
fn per_run_comparison_reports_mean_spread_and_test() {
    let (_dir, project) = load();
    let comparator = DifferentialComparator::default();
    let c = comparator
        .compare(
            project.runs("afl").unwrap(),
            project.runs("libfuzzer").unwrap(),
            CoverageKind::Lines,
        )
        .unwrap();

    // run 0: new 3 missed 1; run 1: new 1 missed 2
    assert_eq!(c.new.value, 2.0);
    assert_eq!(c.new.std(), Some(1.0));
    assert_eq!(c.missed.value, 1.5);
    assert_eq!(c.missed.std(), Some(0.5));
    assert_eq!(c.baseline_size, 2.5);
    assert_eq!(c.new_percent.unwrap().value, 80.0);
    assert_eq!(c.missed_percent.unwrap().value, 60.0);

    let ci = c.new.interval().expect("two runs give an interval");
    assert!(ci.low < 2.0 && ci.high > 2.0);

    let mw = c.significance.expect("per-run mode runs the U test");
    assert_eq!(mw.u, 1.5);
    assert!((mw.p_value - 1.0).abs() < 1e-9);
}

#[test]
fn cumulative_new_never_below_any_per_run_new() {
    let (_dir, project) = load();
    let baseline = project.runs("afl").unwrap();
    let candidate = project.runs("libfuzzer").unwrap();

    for kind in CoverageKind::ALL {
        let cumulative = DifferentialComparator::new(CompareConfig {
            mode: CompareMode::Cumulative,
            ..CompareConfig::default()
        })
        .compare(baseline, candidate, kind)
        .unwrap();

        for i in 0..baseline.len() {
            let per_run = DifferentialComparator::default()
                .compare(&baseline[i..=i], &candidate[i..=i], kind)
                .unwrap();
            assert!(
                cumulative.new.value >= per_run.new.value,
                "{kind}: cumulative {} < run {i} {}",
                cumulative.new.value,
                per_run.new.value
            );
        }
    }
}

#[test]
fn overlap_of_first_runs() {
    let (_dir, project) = load();
    let a = &project.runs("afl").unwrap()[0];
    let b = &project.runs("libfuzzer").unwrap()[0];

    let o = overlap(a, b, CoverageKind::Lines).unwrap();
    assert_eq!((o.left, o.right, o.intersection, o.union), (2, 4, 1, 5));
    assert_eq!((o.left_only, o.right_only), (1, 3));
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[test]
fn unique_and_best_lines() {
    let (_dir, project) = load();
    let stability = project.stability().unwrap();

    let unique = query::run(&stability, "libfuzzer", &[], CoverageKind::Lines, Query::Unique).unwrap();
    assert_eq!(lines(&unique), vec![("b.c:10", 10), ("b.c:11", 5), ("b.c:12", 5)]);

    let best = query::run(
        &stability,
        "libfuzzer",
        &["afl".to_string()],
        CoverageKind::Lines,
        Query::Best { diff: 0 },
    )
    .unwrap();
    assert_eq!(best.len(), 4, "a.c:1 ties at 10 and qualifies with diff 0");

    let strict = query::run(
        &stability,
        "libfuzzer",
        &[],
        CoverageKind::Lines,
        Query::Best { diff: 1 },
    )
    .unwrap();
    assert_eq!(strict, unique);
}

#[test]
fn unique_blocks_of_baseline() {
    let (_dir, project) = load();
    let stability = project.stability().unwrap();
    let unique = query::run(&stability, "afl", &[], CoverageKind::Blocks, Query::Unique).unwrap();
    assert_eq!(lines(&unique), vec![("1", 10), ("2", 5), ("4", 5)]);
}
