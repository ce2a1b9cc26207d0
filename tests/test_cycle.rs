#![cfg(unix)]

use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use act::compiler::Compiler;
use act::config::Config;
use act::runner::LocalRunner;
use act::{ActError, Tester};

/// Stands in for g++: "compiles" any source into a shell script that sums two integers
#[derive(Default, Clone)]
struct ScriptCompiler {
    calls: Arc<AtomicUsize>,
    script: Option<&'static str>,
}

#[async_trait]
impl Compiler for ScriptCompiler {
    async fn compile(&self, _source: &Path, output: &Path) -> act::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .script
            .unwrap_or("#!/bin/sh\nread a b\necho $((a + b))\n");
        std::fs::write(output, script).map_err(|e| ActError::io("write artifact", e))?;
        std::fs::set_permissions(output, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| ActError::io("chmod artifact", e))?;
        Ok(())
    }
}

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.cc"),
        "#include <iostream>\nint main() { int a, b; std::cin >> a >> b; std::cout << a + b << std::endl; }\n",
    )
    .unwrap();
    std::fs::create_dir(dir.path().join("sample")).unwrap();
    std::fs::write(dir.path().join("sample/a-01-in.txt"), "1 2\n").unwrap();
    std::fs::write(dir.path().join("sample/a-01-out.txt"), "3\n").unwrap();
    dir
}

#[tokio::test]
async fn sample_passes_end_to_end() {
    let dir = setup();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        ScriptCompiler::default(),
        LocalRunner::new(),
    );

    let report = tester.run_test("a", "01").await.unwrap();

    assert!(report.matched);
    assert_eq!(report.output, "3\n");
    assert_eq!(
        report.to_string(),
        "[output]\n3\n\n[expected]\n3\n\n[diff]\ntrue\n\n"
    );
    assert!(dir.path().join("cache/a.out").is_file());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("cache/a.cc.sha512sum.txt"))
            .unwrap()
            .len(),
        128
    );
}

#[tokio::test]
async fn second_run_reuses_artifact() {
    let dir = setup();
    let compiler = ScriptCompiler::default();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        compiler.clone(),
        LocalRunner::new(),
    );

    let first = tester.run_test("a", "1").await.unwrap();
    let modified = std::fs::metadata(dir.path().join("cache/a.out"))
        .unwrap()
        .modified()
        .unwrap();

    let second = tester.run_test("a", "01").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        std::fs::metadata(dir.path().join("cache/a.out"))
            .unwrap()
            .modified()
            .unwrap(),
        modified
    );
}

#[tokio::test]
async fn wrong_answer_is_reported_not_failed() {
    let dir = setup();
    std::fs::write(dir.path().join("sample/a-01-out.txt"), "4\n").unwrap();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        ScriptCompiler::default(),
        LocalRunner::new(),
    );

    let report = tester.run_test("a", "01").await.unwrap();
    assert!(!report.matched);
    assert!(report.to_string().ends_with("[diff]\nfalse\n\n"));
}

#[tokio::test]
async fn crashing_program_is_run_error() {
    let dir = setup();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        ScriptCompiler {
            script: Some("#!/bin/sh\nexit 139\n"),
            ..Default::default()
        },
        LocalRunner::new(),
    );

    let err = tester.run_test("a", "01").await.unwrap_err();
    assert!(matches!(err, ActError::Run { .. }));
}

#[tokio::test]
async fn timeout_bounds_runaway_program() {
    let dir = setup();
    let mut config = Config::with_root(dir.path());
    config.run_timeout = Some(Duration::from_millis(300));
    let tester = Tester::new(
        config,
        ScriptCompiler {
            script: Some("#!/bin/sh\nwhile :; do :; done\n"),
            ..Default::default()
        },
        LocalRunner::new(),
    );

    let err = tester.run_test("a", "01").await.unwrap_err();
    assert!(matches!(err, ActError::Run { .. }));
}

#[tokio::test]
async fn missing_source_is_not_found() {
    let dir = setup();
    let compiler = ScriptCompiler::default();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        compiler.clone(),
        LocalRunner::new(),
    );

    let err = tester.run_test("b", "01").await.unwrap_err();
    assert!(matches!(err, ActError::NotFound { .. }));
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn debug_output_on_stderr_keeps_its_place() {
    let dir = setup();
    let tester = Tester::new(
        Config::with_root(dir.path()),
        ScriptCompiler {
            script: Some("#!/bin/sh\nread a b\necho a\nsleep 0.1\necho b 1>&2\nsleep 0.1\necho c\n"),
            ..Default::default()
        },
        LocalRunner::new(),
    );

    let report = tester.run_test("a", "01").await.unwrap();
    assert_eq!(report.output, "a\nb\nc\n");
    assert!(!report.matched);
}
