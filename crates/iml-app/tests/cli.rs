use assert_cmd::Command;
use iml_lang::{FileCodec, Image, ImageCodec};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_script(dir: &Path, src: &str) -> std::path::PathBuf {
    let path = dir.join("script.iml");
    fs::write(&path, src).expect("write script");
    path
}

fn iml() -> Command {
    Command::cargo_bin("iml").expect("binary exists")
}

#[test]
fn prints_to_stdout() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), r#"print("hello ", 42, "\n");"#);

    iml().arg(&script).assert().success().stdout("hello 42\n");
}

#[test]
fn loads_transforms_and_saves() {
    let dir = tempdir().expect("create temp dir");
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    FileCodec
        .save(input.to_str().unwrap(), &Image::filled(6, 4, [10, 20, 30]).unwrap())
        .expect("write input png");

    let src = format!(
        "image img = load(\"{}\") |> invert() |> rotate(1);\nsave(\"{}\", img);\nprint(img);",
        input.display(),
        output.display(),
    );
    let script = write_script(dir.path(), &src);

    iml().arg(&script).assert().success().stdout("<Image 4x6>");

    let saved = FileCodec.load(output.to_str().unwrap()).expect("read output png");
    assert_eq!(saved, Image::filled(4, 6, [245, 235, 225]).unwrap());
}

#[test]
fn parse_errors_exit_nonzero() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), "int = 3;\nprint(1 2);");

    iml()
        .arg(&script)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[parse]"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn lex_errors_are_labelled() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), "string s = \"open");

    iml().arg(&script).assert().failure().stderr(predicate::str::contains("[lex] [L002]"));
}

#[test]
fn runtime_error_reports_line() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), "print(\"a\");\nprint(missing);\nprint(\"b\");");

    iml()
        .arg(&script)
        .assert()
        .failure()
        .code(1)
        .stdout("a")
        .stderr(predicate::str::contains("[runtime] 2").and(predicate::str::contains("missing")));
}

#[test]
fn missing_input_image_fails() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), "image img = load(\"/no/such/file.png\");");

    iml().arg(&script).assert().failure().stderr(predicate::str::contains("failed to load"));
}

#[test]
fn clamp_warnings_go_to_stderr() {
    let dir = tempdir().expect("create temp dir");
    let input = dir.path().join("in.png");
    FileCodec
        .save(input.to_str().unwrap(), &Image::filled(2, 2, [50, 50, 50]).unwrap())
        .expect("write input png");
    let script = write_script(dir.path(), &format!("image a = load(\"{}\");\nimage b = blend(a, a, 5.0);", input.display()));

    iml()
        .arg(&script)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("blend alpha"));
}

#[test]
fn dump_ast_prints_tree() {
    let dir = tempdir().expect("create temp dir");
    let script = write_script(dir.path(), "int x = 3;");

    iml()
        .arg(&script)
        .arg("--dump-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("Block:").and(predicate::str::contains("Decl: x")));
}

#[test]
fn missing_script_fails() {
    iml().arg("/no/such/script.iml").assert().failure().stderr(predicate::str::contains("cannot read"));
}
