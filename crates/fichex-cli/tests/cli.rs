//! Exit-code contract of the CLI surface.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_mapping(path: &std::path::Path) {
    std::fs::write(
        path,
        r#"
nome:
  pattern: "Nome completo: (.*)"
  column: B2
"#,
    )
    .unwrap();
}

fn write_template(path: &std::path::Path) {
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_mut(&0).unwrap().get_cell_mut("A1").set_value("Nome");
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[test]
fn run_fails_when_no_inputs_match() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("mapping.yaml");
    let template = dir.path().join("modelo.xlsx");
    write_mapping(&mapping);
    write_template(&template);

    Command::cargo_bin("fichex")
        .unwrap()
        .args(["run", "-i"])
        .arg(dir.path().join("nothing/*.pdf"))
        .arg("-m")
        .arg(&mapping)
        .arg("-t")
        .arg(&template)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no PDF documents found"));
}

#[test]
fn run_fails_when_template_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("mapping.yaml");
    write_mapping(&mapping);
    let pdf = dir.path().join("doc.pdf");
    std::fs::write(&pdf, b"placeholder").unwrap();

    Command::cargo_bin("fichex")
        .unwrap()
        .args(["run", "-i"])
        .arg(&pdf)
        .arg("-m")
        .arg(&mapping)
        .arg("-t")
        .arg(dir.path().join("missing.xlsx"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("template not found"));
}

#[test]
fn check_accepts_a_valid_mapping_and_template() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("mapping.yaml");
    let template = dir.path().join("modelo.xlsx");
    write_mapping(&mapping);
    write_template(&template);

    Command::cargo_bin("fichex")
        .unwrap()
        .args(["check", "-m"])
        .arg(&mapping)
        .arg("-t")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("nome"))
        .stdout(predicate::str::contains("B2"));
}

#[test]
fn check_rejects_a_nonexistent_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("mapping.yaml");
    let template = dir.path().join("modelo.xlsx");
    write_mapping(&mapping);
    write_template(&template);

    Command::cargo_bin("fichex")
        .unwrap()
        .args(["check", "-m"])
        .arg(&mapping)
        .arg("-t")
        .arg(&template)
        .args(["--sheet", "Inexistente"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Inexistente' not found"));
}

#[test]
fn check_rejects_duplicate_target_cells() {
    let dir = tempfile::tempdir().unwrap();
    let mapping = dir.path().join("mapping.yaml");
    let template = dir.path().join("modelo.xlsx");
    std::fs::write(
        &mapping,
        r#"
a:
  pattern: "A: (.*)"
  column: B2
b:
  pattern: "B: (.*)"
  column: B2
"#,
    )
    .unwrap();
    write_template(&template);

    Command::cargo_bin("fichex")
        .unwrap()
        .args(["check", "-m"])
        .arg(&mapping)
        .arg("-t")
        .arg(&template)
        .assert()
        .failure()
        .stderr(predicate::str::contains("both target cell B2"));
}
