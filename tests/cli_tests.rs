//! Command-line behavior of the `water` binary.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn water() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("water"))
}

fn exit_status(code: i32) -> i32 {
    if cfg!(windows) { code } else { code & 0xff }
}

#[test]
fn version() {
    water()
        .arg("-v")
        .assert()
        .success()
        .stdout("Water Compiler (Rust): v0.1.0\n");
    water().arg("--version").assert().success().stdout(predicate::str::starts_with("Water Compiler (Rust)"));
}

#[test]
fn help_lists_the_options() {
    water()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--outputDir"))
        .stdout(predicate::str::contains("--classpath"))
        .stdout(predicate::str::contains("--prettyprint"));
}

#[test]
fn missing_files_is_a_usage_error() {
    water()
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Invalid Parameters:"));
    water().args(["--no-such-flag", "a.wtr"]).assert().code(1);
}

#[test]
fn compiles_next_to_the_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("greeting.wtr");
    source
        .write_str("package app.text;\nfunction main() { println(\"hi\"); }\n")
        .unwrap();

    water().arg(source.path()).assert().success().stdout("").stderr("");
    dir.child("app/text/greetingWtr.class").assert(predicate::path::is_file());
}

#[test]
fn output_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.child("out");
    let source = dir.child("point.wtr");
    source
        .write_str("class Point { var x = 0; var y = 0; }\n")
        .unwrap();

    water().arg("-d").arg(out.path()).arg(source.path()).assert().success();
    out.child("Point.class").assert(predicate::path::is_file());
    // Only classes: no container.
    out.child("pointWtr.class").assert(predicate::path::missing());
}

#[test]
fn container_name_stops_at_the_first_dot() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("app.test.wtr");
    source.write_str("var answer = 42;\n").unwrap();
    water().arg(source.path()).assert().success();
    dir.child("appWtr.class").assert(predicate::path::is_file());
}

#[test]
fn files_see_each_other() {
    let dir = TempDir::new().unwrap();
    let main = dir.child("main.wtr");
    main.write_str("function main() { println(new Counter().next()); }\n").unwrap();
    let counter = dir.child("counter.wtr");
    counter
        .write_str("class Counter { var count = 0; function next() -> int { count++; return count; } }\n")
        .unwrap();

    water().arg(main.path()).arg(counter.path()).assert().success();
    dir.child("mainWtr.class").assert(predicate::path::is_file());
    dir.child("Counter.class").assert(predicate::path::is_file());
}

#[test]
fn pretty_print() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("tree.wtr");
    source.write_str("var x = 1 + 2;\n").unwrap();

    water()
        .arg("-pp")
        .arg(source.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("==== {} ====", source.path().display())));
}

#[test]
fn unreadable_source() {
    let dir = TempDir::new().unwrap();
    let missing = dir.child("missing.wtr");
    water()
        .arg(missing.path())
        .assert()
        .code(2)
        .stderr(format!("Failure reading file '{}': NotFound\n", missing.path().display()));
}

#[test]
fn unwritable_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("a.wtr");
    source.write_str("var x = 1;\n").unwrap();
    // A file where the output directory should be.
    let blocker = dir.child("blocked");
    blocker.write_str("").unwrap();

    water()
        .arg("-d")
        .arg(blocker.path())
        .arg(source.path())
        .assert()
        .code(3)
        .stderr(predicate::str::starts_with("Failure writing file '"));
}

#[test]
fn syntax_errors() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("bad.wtr");
    source.write_str("function main( {\n").unwrap();
    water()
        .arg(source.path())
        .assert()
        .code(exit_status(-1))
        .stderr(predicate::str::starts_with(format!("[{}:1:", source.path().display())));

    source.write_str("function main() {\n").unwrap();
    water()
        .arg(source.path())
        .assert()
        .code(exit_status(-1))
        .stderr(predicate::str::contains("Unexpected EOF"));
}

#[test]
fn semantic_errors() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("types.wtr");
    source.write_str("function main() {\n    var s: String = 1;\n}\n").unwrap();
    water()
        .arg(source.path())
        .assert()
        .code(exit_status(-2))
        .stderr(predicate::str::starts_with(format!("[{}:2:", source.path().display())))
        .stderr(predicate::str::contains("Semantic Error @"));
    dir.child("typesWtr.class").assert(predicate::path::missing());
}

#[test]
fn optimization_config() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("opt.wtr");
    source.write_str("var x = 1 + 2;\n").unwrap();
    let config = dir.child("opt.properties");
    config.write_str("# no folding\ndefaults=false\n").unwrap();

    water().arg("-o").arg(config.path()).arg(source.path()).assert().success();

    water()
        .arg("--optimize")
        .arg(dir.child("absent.properties").path())
        .arg(source.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("absent.properties"));
}

#[test]
fn classpath_classes_can_be_used() {
    let dir = TempDir::new().unwrap();
    let lib_dir = dir.child("lib");
    let lib = dir.child("lib.wtr");
    lib.write_str("package util;\nclass Greeter { function greet(name: String) = \"hi \" + name; }\n")
        .unwrap();
    water().arg("-d").arg(lib_dir.path()).arg(lib.path()).assert().success();

    let app = dir.child("app.wtr");
    app.write_str("import util.Greeter;\nfunction main() { println(new Greeter().greet(\"you\")); }\n")
        .unwrap();
    water()
        .arg("-cp")
        .arg(lib_dir.path())
        .arg(app.path())
        .assert()
        .success();
    dir.child("appWtr.class").assert(predicate::path::is_file());

    water()
        .arg(app.path())
        .assert()
        .code(exit_status(-2))
        .stderr(predicate::str::contains("util.Greeter"));
}

#[test]
fn verbose_logging_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("a.wtr");
    source.write_str("var x = 1;\n").unwrap();
    water()
        .arg("--verbose")
        .arg(source.path())
        .env_remove("WATER_LOG")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("compilation finished"));
}
