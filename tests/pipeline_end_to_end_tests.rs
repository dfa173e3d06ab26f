//! End-to-end pipeline tests over the fixture row files

use std::path::Path;
use wlcgsgas::config::PipelineConfig;
use wlcgsgas::pipeline::Pipeline;
use wlcgsgas::record::{Efficiency, KeyField};
use wlcgsgas::source::read_rows;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_two_rows_merge_with_default_scaling() {
    let rows = read_rows(&fixture("rows_2011_03.csv"), None).unwrap();
    let report = Pipeline::new(&PipelineConfig::default())
        .unwrap()
        .run(rows)
        .unwrap();

    assert_eq!(report.records.len(), 1);
    let r = &report.records[0];
    assert_eq!(r.year(), Some(2011));
    assert_eq!(r.month(), Some(3));
    assert_eq!(r.host(), Some("site-A"));
    assert_eq!(r.vo_name(), Some("atlas"));
    assert_eq!(r.user(), Some("u1"));
    assert_eq!(r.n_jobs, Some(12));
    assert_eq!(r.cpu_time, Some(150.0));
    assert_eq!(r.wall_time, Some(300.0));
    assert_eq!(r.ksi2k_cpu_time, Some(262.5));
    assert_eq!(r.ksi2k_wall_time, Some(525.0));
}

#[test]
fn test_csv_and_json_fixtures_agree() {
    let config = PipelineConfig::default();
    let from_csv = Pipeline::new(&config)
        .unwrap()
        .run(read_rows(&fixture("rows_2011_03.csv"), None).unwrap())
        .unwrap();

    let json_rows: Vec<_> = read_rows(&fixture("rows_2011_03.json"), None)
        .unwrap()
        .into_iter()
        .take(2)
        .collect();
    let from_json = Pipeline::new(&config).unwrap().run(json_rows).unwrap();

    assert_eq!(from_csv, from_json);
}

#[test]
fn test_tiered_report() {
    let config = PipelineConfig::from_file(fixture("tiers.toml")).unwrap();
    let rows = read_rows(&fixture("rows_2011_03.json"), None).unwrap();

    let report = Pipeline::new(&config).unwrap().run(rows).unwrap();

    assert_eq!(report.equivalence_days, 31);
    assert_eq!(
        report.missing_scale_hosts.iter().collect::<Vec<_>>(),
        vec!["site-A"]
    );

    let summary: Vec<(&str, &str, Option<u64>)> = report
        .records
        .iter()
        .map(|r| (r.tier().unwrap(), r.vo_name().unwrap(), r.n_jobs))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("NDGF-T1", "atlas", Some(42)),
            ("NO-NORGRID-T2", "alice", Some(8)),
            ("NO-NORGRID-T2", "atlas", Some(10)),
            ("SE-SNIC-T2", "cms", Some(20)),
        ]
    );

    let t1 = &report.records[0];
    assert_eq!(t1.cpu_time, Some(3150.0));
    assert_eq!(t1.wall_time, Some(4050.0));
    assert_eq!(t1.ksi2k_cpu_time, Some(5512.5));
    assert_eq!(t1.ksi2k_wall_time, Some(7087.5));
    for field in [KeyField::Host, KeyField::User, KeyField::VoGroup, KeyField::VoRole] {
        assert!(!t1.has_key(field));
    }

    let derived = t1.derived.unwrap();
    assert_eq!(derived.efficiency, Efficiency::Percent(77));
    assert_eq!(derived.equivalents.cpu, Some(4));
    assert_eq!(derived.equivalents.wall, Some(5));

    let cms = &report.records[3];
    assert_eq!(cms.derived.unwrap().efficiency, Efficiency::Undefined);
}

#[test]
fn test_collapse_rejects_measure_field() {
    let config = PipelineConfig {
        collapse: vec!["cpu_time".to_string()],
        ..PipelineConfig::default()
    };
    let err = Pipeline::new(&config).unwrap_err();
    assert!(err.to_string().contains("Cannot collapse invalid field cpu_time"));
}
