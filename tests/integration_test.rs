use std::{fs, path::PathBuf, process::Command};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn rows(tsv: &str) -> Vec<Vec<String>> {
    tsv.lines()
        .skip(1)
        .map(|line| line.split('\t').map(String::from).collect())
        .collect()
}

#[test]
fn test_inspect() {
    let two_parts = data_dir().join("two_parts.json");
    let freeform = data_dir().join("freeform.json");
    let out_dir = tempfile::tempdir().expect("Could not create temp dir");
    let out_file = out_dir.path().join("summary").join("designs.tsv");

    let status = Command::new(env!("CARGO_BIN_EXE_strandloom"))
        .args([
            "inspect",
            "-i",
            two_parts.to_str().unwrap(),
            freeform.to_str().unwrap(),
            "-o",
            out_file.to_str().unwrap(),
            "-t",
            "2",
            "--emit-signals",
        ])
        .status()
        .expect("Failed to execute strandloom");

    assert!(
        status.success(),
        "Process ended with non-success status: {:?}",
        status
    );

    let actual = fs::read_to_string(&out_file).expect("Could not read output file");
    assert_eq!(
        actual.lines().next().unwrap(),
        "file\tpart\tuuid\tname\tgrid_type\tview\thelices\tstrands\txovers\toligos\tcircular_oligos\tcolors\tinsertions\tskips\tmods"
    );

    let rows = rows(&actual);
    assert_eq!(rows.len(), 3);

    assert!(rows[0][0].ends_with("freeform.json"));
    assert_eq!(
        rows[0][1..],
        ["0", "free", "free", "square", "grid", "2", "0", "0", "0", "0", "0", "0", "0", "0"]
    );

    assert!(rows[1][0].ends_with("two_parts.json"));
    assert_eq!(
        rows[1][1..],
        ["0", "alpha", "alpha", "honeycomb", "none", "2", "4", "3", "2", "1", "2", "1", "1", "1"]
    );
    assert_eq!(
        rows[2][1..],
        ["1", "beta", "beta", "honeycomb", "none", "1", "1", "0", "1", "0", "1", "0", "0", "1"]
    );
}

#[test]
fn test_inspect_rejects_non_tsv_output() {
    let two_parts = data_dir().join("two_parts.json");
    let out_dir = tempfile::tempdir().expect("Could not create temp dir");
    let out_file = out_dir.path().join("designs.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_strandloom"))
        .args([
            "inspect",
            "-i",
            two_parts.to_str().unwrap(),
            "-o",
            out_file.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to execute strandloom");

    assert!(!status.success());
    assert!(!out_file.exists());
}

#[test]
fn test_merge() {
    let target = data_dir().join("two_parts.json");
    let fragment = data_dir().join("fragment.json");
    let out_dir = tempfile::tempdir().expect("Could not create temp dir");
    let out_file = out_dir.path().join("merged.tsv");

    let status = Command::new(env!("CARGO_BIN_EXE_strandloom"))
        .args([
            "merge",
            "-t",
            target.to_str().unwrap(),
            "-f",
            fragment.to_str().unwrap(),
            "--part",
            "0",
            "--dx",
            "20",
            "-o",
            out_file.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to execute strandloom");

    assert!(
        status.success(),
        "Process ended with non-success status: {:?}",
        status
    );

    let actual = fs::read_to_string(&out_file).expect("Could not read output file");
    assert_eq!(
        actual.lines().next().unwrap(),
        "id_num\tname\tx\ty\tz\tsize\tstrands"
    );

    let rows = rows(&actual);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][..2], ["2", "f0.2"]);
    assert_eq!(rows[1][..2], ["3", "f1.3"]);

    let x0: f64 = rows[0][2].parse().unwrap();
    let x1: f64 = rows[1][2].parse().unwrap();
    assert!((x0 - 20.0).abs() < 1e-9);
    assert!((x1 - 21.948557158514987).abs() < 1e-9);
    assert_eq!(rows[0][5..], ["42", "1"]);
}
