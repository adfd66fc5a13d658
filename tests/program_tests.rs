//! End-to-end compilation of the programs under `test_scripts/`.
//!
//! Every `test_scripts/*.wtr` must compile; the emitted classes are read
//! back and checked for their entry points. Every
//! `test_scripts/errors/*.wtr` starts with two header comments naming
//! the expected exit code and a fragment of the diagnostic:
//!
//! ```text
//! // exit: -2
//! // expect: Semantic Error @
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use water::Options;
use water_classfile::{AccessFlags, ClassFile};

const MAIN_ARGS: &str = "([Ljava/lang/String;)V";

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

fn script(name: &str) -> PathBuf {
    scripts_dir().join(name)
}

/// Compile `files` into a fresh directory and read every class back.
fn compile(files: &[&str]) -> (TempDir, Vec<ClassFile>) {
    let out = TempDir::new().expect("tempdir");
    let options = Options {
        output_dir: Some(out.path().to_path_buf()),
        files: files.iter().map(|name| script(name)).collect(),
        ..Options::default()
    };
    let written = water::run(&options, &mut Vec::new()).unwrap_or_else(|err| panic!("{files:?}: {err}"));
    let classes = written
        .iter()
        .map(|path| {
            let bytes = fs::read(path).expect("class file");
            ClassFile::parse(&bytes).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
        })
        .collect();
    (out, classes)
}

fn class<'c>(classes: &'c [ClassFile], name: &str) -> &'c ClassFile {
    classes
        .iter()
        .find(|class| class.name == name)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn has_entry_point(class: &ClassFile) -> bool {
    class
        .method("main", MAIN_ARGS)
        .is_some_and(|m| m.access.contains(AccessFlags::PUBLIC | AccessFlags::STATIC))
}

#[test]
fn every_script_compiles() {
    let mut scripts: Vec<_> = fs::read_dir(scripts_dir())
        .expect("test_scripts")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "wtr"))
        .collect();
    scripts.sort();
    assert!(!scripts.is_empty());

    for path in scripts {
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
        let (_out, classes) = compile(&[name]);
        assert!(
            classes.iter().any(has_entry_point),
            "{name}: no class with a main entry point"
        );
    }
}

#[test]
fn hello_world_layout() {
    let (out, classes) = compile(&["hello.wtr"]);
    assert!(out.path().join("demo").join("helloWtr.class").is_file());
    let hello = class(&classes, "demo/helloWtr");
    assert_eq!(hello.super_name.as_deref(), Some("java/lang/Object"));
    assert_eq!(hello.source_file.as_deref(), Some("hello.wtr"));
    assert!(hello.method("main", "()V").is_some());
    assert!(has_entry_point(hello));
}

#[test]
fn classes_get_their_own_files() {
    let (out, classes) = compile(&["shapes.wtr"]);
    let dir = out.path().join("demo").join("shapes");
    for name in ["shapesWtr", "Shape", "Circle", "Square"] {
        assert!(dir.join(format!("{name}.class")).is_file(), "{name}");
    }

    let circle = class(&classes, "demo/shapes/Circle");
    assert_eq!(circle.super_name.as_deref(), Some("demo/shapes/Shape"));
    assert!(circle.method("<init>", "(D)V").is_some());
    assert!(circle.method("area", "()D").is_some());
    assert!(circle.field("radius").is_some_and(|f| f.access.contains(AccessFlags::PRIVATE)));
    // Private fields get no accessors.
    assert!(circle.method("getRadius", "()D").is_none());

    let shape = class(&classes, "demo/shapes/Shape");
    assert!(shape.method("describe", "()Ljava/lang/String;").is_some());
    assert!(shape.method("getName", "()Ljava/lang/String;").is_some());
    assert!(shape.method("setName", "(Ljava/lang/String;)V").is_some());
}

#[test]
fn globals_live_on_the_container() {
    let (_out, classes) = compile(&["counter.wtr"]);
    let counter = class(&classes, "counterWtr");
    let limit = counter.field("LIMIT").expect("LIMIT");
    assert!(limit.access.contains(AccessFlags::STATIC | AccessFlags::FINAL));
    assert!(counter.field("total").is_some());
    assert!(counter.method("<clinit>", "()V").is_some());
    assert!(counter.method("square", "(I)I").is_some());
}

#[test]
fn enums_get_their_synthetic_members() {
    let (_out, classes) = compile(&["directions.wtr"]);
    let direction = class(&classes, "demo/Direction");
    assert!(direction.access.contains(AccessFlags::ENUM | AccessFlags::FINAL));
    assert_eq!(direction.super_name.as_deref(), Some("java/lang/Enum"));
    for constant in ["NORTH", "EAST", "SOUTH", "WEST"] {
        assert!(direction.field(constant).is_some(), "{constant}");
    }
    assert!(direction.method("values", "()[Ldemo/Direction;").is_some());
    assert!(direction.method("valueOf", "(Ljava/lang/String;)Ldemo/Direction;").is_some());
}

#[test]
fn throws_clauses_and_explicit_main() {
    let (_out, classes) = compile(&["exceptions.wtr", "join.wtr"]);
    let exceptions = class(&classes, "exceptionsWtr");
    assert!(exceptions.method("check", "(I)V").is_some());

    let join = class(&classes, "joinWtr");
    assert!(join.method("join", "([Ljava/lang/String;)Ljava/lang/String;").is_some());
    assert_eq!(join.methods.iter().filter(|m| m.name == "main").count(), 1);
}

#[test]
fn null_safe_program() {
    let (_out, classes) = compile(&["nullable.wtr"]);
    let nullable = class(&classes, "nullableWtr");
    assert!(nullable.method("length", "(Ljava/lang/String;)I").is_some());
    assert!(
        nullable
            .method("shout", "(Ljava/lang/String;)Ljava/lang/String;")
            .is_some_and(|m| m.nullable.is_some())
    );
    assert!(has_entry_point(nullable));
}

fn water() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("water"))
}

/// Exit status as the operating system reports it.
fn exit_status(code: i32) -> i32 {
    if cfg!(windows) { code } else { code & 0xff }
}

fn header(source: &str, key: &str) -> String {
    let prefix = format!("// {key}:");
    source
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| panic!("missing '{prefix}' header"))
}

#[test]
fn error_scripts_fail_as_documented() {
    let dir = scripts_dir().join("errors");
    let mut scripts: Vec<_> = fs::read_dir(&dir)
        .expect("test_scripts/errors")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    scripts.sort();
    assert!(!scripts.is_empty());

    for path in scripts {
        let source = fs::read_to_string(&path).expect("script");
        let code: i32 = header(&source, "exit").parse().expect("exit code");
        let expected = header(&source, "expect");
        let out = TempDir::new().expect("tempdir");

        water()
            .arg("-d")
            .arg(out.path())
            .arg(&path)
            .assert()
            .code(exit_status(code))
            .stderr(predicate::str::starts_with(format!("[{}:", path.display())))
            .stderr(predicate::str::contains(expected));

        assert!(no_class_files(out.path()), "{}", path.display());
    }
}

fn no_class_files(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut entries| entries.next().is_none()).unwrap_or(true)
}
