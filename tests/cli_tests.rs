//! Command-line tests: exit codes, output formats and error reports.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("contig-dotplot").unwrap()
}

fn write_job(dir: &std::path::Path) {
    std::fs::write(dir.join("target.idx"), "Target\nt1\t1000\nt2\t1000\n").unwrap();
    std::fs::write(dir.join("query.idx"), "Query\nq1\t500\nq2\t500\n").unwrap();
    std::fs::write(
        dir.join("map.paf"),
        "q1\t500\t0\t500\t+\tt2\t1000\t0\t500\t500\t500\t60\n\
         q2\t500\t0\t500\t+\tt1\t1000\t0\t500\t400\t500\t60\n",
    )
    .unwrap();
}

#[test]
fn test_help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge-splits"))
        .stdout(predicate::str::contains("summary"));
}

#[test]
fn test_index_command_writes_index() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("genome.fa");
    std::fs::write(&fasta, ">a\nACGTACGT\n>b\nACG\n").unwrap();
    let output = dir.path().join("genome.idx");

    cmd()
        .arg("index")
        .arg(&fasta)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 2 contigs (11 bp)"));

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("genome\n"));
    assert!(content.contains("a\t8"));
}

#[test]
fn test_split_command_reports_pieces() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("q.fa");
    std::fs::write(&fasta, format!(">long\n{}\n>short\nACGT\n", "A".repeat(25))).unwrap();

    cmd()
        .args(["--format", "json", "split"])
        .arg(&fasta)
        .arg("-o")
        .arg(dir.path().join("q.split.fa"))
        .arg("--index")
        .arg(dir.path().join("q.split.idx"))
        .args(["--size", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pieces\": 4"));

    let index = std::fs::read_to_string(dir.path().join("q.split.idx")).unwrap();
    assert!(index.contains("long_###_1\t10"));
    assert!(index.contains("long_###_2\t10"));
    assert!(index.contains("long_###_3\t5"));
}

#[test]
fn test_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    write_job(dir.path());

    cmd()
        .args(["--format", "json", "summary", "--job"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"-1\": 50.0"));
    assert!(dir.path().join("summary.json").exists());

    cmd()
        .args(["summary", "--status", "--job"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("done"));
}

#[test]
fn test_sort_and_associations() {
    let dir = tempfile::tempdir().unwrap();
    write_job(dir.path());

    cmd()
        .args(["sort", "--job"])
        .arg(dir.path())
        .assert()
        .success();
    assert!(dir.path().join("query.idx.sorted").exists());
    let sorted = std::fs::read_to_string(dir.path().join("query.idx.sorted")).unwrap();
    assert!(sorted.starts_with("Query\nq2\t500"));

    cmd()
        .args(["associations", "--job"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("q1\tt2\t+\t500"));
}

#[test]
fn test_missing_index_reports_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    write_job(dir.path());
    std::fs::remove_file(dir.path().join("target.idx")).unwrap();

    cmd()
        .args(["--format", "json", "plot", "--job"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"kind\":\"index_unavailable\""));
}

#[test]
fn test_reverse_unknown_contig_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_job(dir.path());

    cmd()
        .args(["reverse", "--job"])
        .arg(dir.path())
        .arg("nope")
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnknownContig"));
}
