//! End-to-end builds through [`BuildContext`] on on-disk projects.
//!
//! Every test lays out one or more containers in a temporary directory,
//! runs builds with the demo language registered, and checks the committed
//! index state and the files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_build::{BuildContext, BuildError, ExternalBuildRequest, OutletDescription};
use kiln_common::{ContainerHandle, Encoding, SourceUri};
use kiln_debuginfo::{read_debug_info, sidecar_path, InstallDebugInfoRequest, LineMapping, SourceInstallerConfig};
use kiln_diagnostics::MemorySink;
use kiln_index::QualifiedName;
use kiln_lang::LanguageRegistry;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn context() -> BuildContext {
    let catalog = kiln_demo_lang::catalog();
    let registry = LanguageRegistry::from_setups(&catalog, [kiln_demo_lang::SETUP_ID], Encoding::Utf8)
        .expect("demo language registers");
    BuildContext::new(registry, Vec::new())
}

/// A container rooted at `<workspace>/<name>` with sources in `src/` and
/// outputs in `gen/`.
struct Project {
    root: PathBuf,
    name: &'static str,
}

impl Project {
    fn new(workspace: &TempDir, name: &'static str) -> Self {
        let root = workspace.path().join(name);
        fs::create_dir_all(root.join("src")).unwrap();
        Self { root, name }
    }

    fn write(&self, file: &str, text: &str) {
        fs::write(self.root.join("src").join(file), text).unwrap();
    }

    fn remove(&self, file: &str) {
        fs::remove_file(self.root.join("src").join(file)).unwrap();
    }

    fn generated(&self, file: &str) -> PathBuf {
        self.root.join("gen").join(file)
    }

    fn uri(&self, file: &str) -> SourceUri {
        SourceUri::from_absolute(&self.root.join("src").join(file))
    }

    fn handle(&self) -> ContainerHandle {
        ContainerHandle::new(self.name)
    }

    fn request(&self) -> ExternalBuildRequest {
        ExternalBuildRequest::new(&self.root, self.name)
            .outlet(kiln_demo_lang::LANGUAGE_ID, OutletDescription::new("default", "gen"))
    }

    fn request_dirty(&self, files: &[&str]) -> ExternalBuildRequest {
        files
            .iter()
            .fold(self.request(), |req, f| req.dirty(Path::new("src").join(f)))
    }
}

// ===========================================================================
// Single container
// ===========================================================================

#[test]
fn first_build_generates_and_commits() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("B.lang", "use A.foo\n");

    let ctx = context();
    let report = ctx.build(&app.request_dirty(&["A.lang", "B.lang"]), &MemorySink::new()).unwrap();

    assert_eq!(report.generation, 1);
    assert_eq!(report.directly_dirty.len(), 2);
    assert!(report.transitively_dirty.is_empty());
    assert_eq!(report.written.len(), 2);
    assert!(app.generated("A.out").is_file());
    assert!(sidecar_path(&app.generated("A.out")).is_file());

    let b = fs::read_to_string(app.generated("B.out")).unwrap();
    assert!(b.contains("import A.foo from"));

    let state = ctx.store().get_state(&app.handle());
    assert_eq!(state.descriptions().len(), 2);
    assert_eq!(state.mapping().generated_for(&app.uri("A.lang")).len(), 1);
}

#[test]
fn renamed_export_fails_dependents_but_still_commits() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("B.lang", "use A.foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang", "B.lang"]), &MemorySink::new()).unwrap();
    let b_before = fs::read(app.generated("B.out")).unwrap();

    app.write("A.lang", "export bar(int)\n");
    let sink = MemorySink::new();
    let err = ctx.build(&app.request_dirty(&["A.lang"]), &sink).unwrap_err();
    match err {
        BuildError::ValidationFailed { container, errors } => {
            assert_eq!(container, app.handle());
            assert_eq!(errors, 1);
        }
        other => panic!("expected a validation failure, got {other}"),
    }

    let reported = sink.diagnostics();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].code, kiln_demo_lang::validator::UNRESOLVED_USE);
    assert_eq!(reported[0].location.as_ref().unwrap().uri, app.uri("B.lang"));

    // A was regenerated, B kept its last good output.
    let a = fs::read_to_string(app.generated("A.out")).unwrap();
    assert!(a.contains("fn A.bar(int)"));
    assert_eq!(fs::read(app.generated("B.out")).unwrap(), b_before);

    let state = ctx.store().get_state(&app.handle());
    assert_eq!(state.generation(), 2);
    let a_desc = state.descriptions().get(&app.uri("A.lang")).unwrap();
    assert_eq!(a_desc.exported[0].name.as_str(), "A.bar");
}

#[test]
fn run_reports_transitive_units_without_failing() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("B.lang", "use A.foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang", "B.lang"]), &MemorySink::new()).unwrap();

    app.write("A.lang", "export bar(int)\n");
    let report = ctx.run(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();
    assert!(!report.is_error_free());
    assert_eq!(report.transitively_dirty, vec![app.uri("B.lang")]);
}

#[test]
fn unchanged_rebuild_writes_nothing() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\nlet x = foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();
    let before = ctx.store().get_state(&app.handle());

    let report = ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();
    assert!(report.written.is_empty());
    assert!(report.removed.is_empty());

    let after = ctx.store().get_state(&app.handle());
    assert_eq!(after.generation(), before.generation() + 1);
    assert_eq!(
        after.descriptions().data().iter().collect::<Vec<_>>(),
        before.descriptions().data().iter().collect::<Vec<_>>()
    );
}

#[test]
fn empty_request_is_a_no_op_commit() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    let ctx = context();
    let report = ctx.build(&app.request(), &MemorySink::new()).unwrap();
    assert!(report.directly_dirty.is_empty());
    assert!(report.written.is_empty());
    assert!(ctx.store().get_snapshot(&app.handle()).is_empty());
}

#[test]
fn empty_request_after_builds_keeps_committed_state() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("B.lang", "use A.foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang", "B.lang"]), &MemorySink::new()).unwrap();
    let before = ctx.store().get_state(&app.handle());
    let a_before = fs::read(app.generated("A.out")).unwrap();

    let report = ctx.build(&app.request(), &MemorySink::new()).unwrap();
    assert!(report.directly_dirty.is_empty());
    assert!(report.transitively_dirty.is_empty());
    assert!(report.written.is_empty());
    assert!(report.removed.is_empty());

    let after = ctx.store().get_state(&app.handle());
    assert_eq!(after.generation(), before.generation() + 1);
    assert_eq!(after.descriptions(), before.descriptions());
    assert_eq!(after.mapping(), before.mapping());
    assert_eq!(fs::read(app.generated("A.out")).unwrap(), a_before);
}

#[test]
fn deletion_removes_outputs_and_mapping() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("C.lang", "export baz(int)\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang", "C.lang"]), &MemorySink::new()).unwrap();
    assert!(app.generated("C.out").is_file());

    app.remove("C.lang");
    let report = ctx
        .build(&app.request().deleted("src/C.lang"), &MemorySink::new())
        .unwrap();
    assert_eq!(report.deleted, vec![app.uri("C.lang")]);
    assert_eq!(report.removed, vec![app.generated("C.out")]);
    assert!(!app.generated("C.out").exists());
    assert!(!sidecar_path(&app.generated("C.out")).exists());
    assert!(app.generated("A.out").is_file());

    let state = ctx.store().get_state(&app.handle());
    assert!(state.descriptions().get(&app.uri("C.lang")).is_none());
    assert!(state.mapping().generated_for(&app.uri("C.lang")).is_empty());
    assert!(!state.mapping().is_generated(&app.generated("C.out")));
}

#[test]
fn deleting_an_export_invalidates_users() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    app.write("B.lang", "use A.foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang", "B.lang"]), &MemorySink::new()).unwrap();

    app.remove("A.lang");
    let report = ctx.run(&app.request().deleted("src/A.lang"), &MemorySink::new()).unwrap();
    assert_eq!(report.transitively_dirty, vec![app.uri("B.lang")]);
    assert_eq!(report.errors, 1);
}

#[test]
fn missing_project_dir_commits_nothing() {
    let ws = tempfile::tempdir().unwrap();
    let ctx = context();
    let req = ExternalBuildRequest::new(ws.path().join("nope"), "ghost").dirty("src/A.lang");
    let err = ctx.build(&req, &MemorySink::new()).unwrap_err();
    assert!(matches!(err, BuildError::Environment { .. }));
    assert_eq!(ctx.store().get_state(&ContainerHandle::new("ghost")).generation(), 0);
}

#[test]
fn classpath_resources_resolve_for_require() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    fs::create_dir_all(app.root.join("res")).unwrap();
    fs::write(app.root.join("res/palette.txt"), "red").unwrap();
    app.write("A.lang", "require palette.txt\n");

    let ctx = context();
    let ok = app.request_dirty(&["A.lang"]).classpath_entry("res");
    ctx.build(&ok, &MemorySink::new()).unwrap();

    app.write("A.lang", "require fonts.txt\n");
    let err = ctx
        .build(&app.request_dirty(&["A.lang"]).classpath_entry("res"), &MemorySink::new())
        .unwrap_err();
    assert!(err.is_validation_failure());
}

// ===========================================================================
// Multiple containers
// ===========================================================================

#[test]
fn references_resolve_across_containers() {
    let ws = tempfile::tempdir().unwrap();
    let core = Project::new(&ws, "core");
    let app = Project::new(&ws, "app");
    core.write("Lib.lang", "export f(int)\n");
    app.write("Main.lang", "use Lib.f\n");

    let ctx = context();
    ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    let report = ctx
        .build(&app.request_dirty(&["Main.lang"]).depends_on("core"), &MemorySink::new())
        .unwrap();
    assert!(report.is_error_free());
    let main = fs::read_to_string(app.generated("Main.out")).unwrap();
    assert!(main.contains("[core]"));
}

#[test]
fn changed_export_reports_affected_containers() {
    let ws = tempfile::tempdir().unwrap();
    let core = Project::new(&ws, "core");
    let app = Project::new(&ws, "app");
    let tools = Project::new(&ws, "tools");
    core.write("Lib.lang", "export f(int)\n");
    app.write("Main.lang", "use Lib.f\n");
    tools.write("Unrelated.lang", "export g(int)\n");

    let ctx = context();
    ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    ctx.build(&app.request_dirty(&["Main.lang"]), &MemorySink::new()).unwrap();
    ctx.build(&tools.request_dirty(&["Unrelated.lang"]), &MemorySink::new()).unwrap();

    core.write("Lib.lang", "export f(string)\n");
    let report = ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    assert_eq!(report.affected_containers, vec![app.handle()]);

    // The other container is not rebuilt by the call, only invalidated.
    let main = ctx.store().get_state(&app.handle());
    assert_eq!(main.generation(), 1);
    let pending: Vec<_> = ctx.store().invalidations(&app.handle()).names().cloned().collect();
    assert_eq!(pending, vec![QualifiedName::new("Lib.f")]);
    assert!(ctx.store().invalidations(&tools.handle()).is_empty());
}

#[test]
fn renamed_export_reaches_other_container_on_its_next_build() {
    let ws = tempfile::tempdir().unwrap();
    let core = Project::new(&ws, "core");
    let app = Project::new(&ws, "app");
    core.write("Lib.lang", "export f(int)\n");
    app.write("Main.lang", "use Lib.f\n");
    app.write("Other.lang", "export h(int)\n");

    let ctx = context();
    ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    ctx.build(&app.request_dirty(&["Main.lang", "Other.lang"]), &MemorySink::new()).unwrap();

    core.write("Lib.lang", "export g(int)\n");
    let report = ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    assert_eq!(report.affected_containers, vec![app.handle()]);

    app.write("Other.lang", "export h(string)\n");
    let sink = MemorySink::new();
    let report = ctx.run(&app.request_dirty(&["Other.lang"]), &sink).unwrap();
    assert_eq!(report.transitively_dirty, vec![app.uri("Main.lang")]);
    assert_eq!(report.errors, 1);
    assert_eq!(sink.diagnostics()[0].code, kiln_demo_lang::validator::UNRESOLVED_USE);
    assert!(ctx.store().invalidations(&app.handle()).is_empty());

    // Once acknowledged, the invalidation does not spread again.
    let report = ctx.run(&app.request(), &MemorySink::new()).unwrap();
    assert!(report.transitively_dirty.is_empty());
}

#[test]
fn new_export_fixes_earlier_unresolved_reference() {
    let ws = tempfile::tempdir().unwrap();
    let core = Project::new(&ws, "core");
    let app = Project::new(&ws, "app");
    app.write("Main.lang", "use Lib.f\n");
    core.write("Lib.lang", "export f(int)\n");

    let ctx = context();
    let first = ctx.run(&app.request_dirty(&["Main.lang"]), &MemorySink::new()).unwrap();
    assert_eq!(first.errors, 1);
    let report = ctx.build(&core.request_dirty(&["Lib.lang"]), &MemorySink::new()).unwrap();
    assert_eq!(report.affected_containers, vec![app.handle()]);

    let report = ctx.build(&app.request(), &MemorySink::new()).unwrap();
    assert_eq!(report.transitively_dirty, vec![app.uri("Main.lang")]);
    assert!(app.generated("Main.out").is_file());
}

#[test]
fn different_containers_build_concurrently() {
    let ws = tempfile::tempdir().unwrap();
    let projects: Vec<Project> = ["c0", "c1", "c2", "c3"]
        .into_iter()
        .map(|name| {
            let p = Project::new(&ws, name);
            for i in 0..8 {
                p.write(&format!("U{i}.lang"), &format!("export f{i}(int)\nlet v = f{i}\n"));
            }
            p
        })
        .collect();
    let ctx = Arc::new(context());

    std::thread::scope(|s| {
        for project in &projects {
            let ctx = Arc::clone(&ctx);
            s.spawn(move || {
                let files: Vec<String> = (0..8).map(|i| format!("U{i}.lang")).collect();
                let names: Vec<&str> = files.iter().map(String::as_str).collect();
                ctx.build(&project.request_dirty(&names), &MemorySink::new()).unwrap();
            });
        }
    });

    for project in &projects {
        let state = ctx.store().get_state(&project.handle());
        assert_eq!(state.generation(), 1);
        assert_eq!(state.descriptions().len(), 8);
    }
    assert_eq!(ctx.store().containers().len(), 4);
}

#[test]
fn same_container_builds_are_serialized() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    for i in 0..6 {
        app.write(&format!("U{i}.lang"), &format!("export f{i}(int)\n"));
    }
    let ctx = context();

    std::thread::scope(|s| {
        for i in 0..6 {
            let ctx = &ctx;
            let app = &app;
            s.spawn(move || {
                let file = format!("U{i}.lang");
                ctx.build(&app.request_dirty(&[file.as_str()]), &MemorySink::new()).unwrap();
            });
        }
    });

    // Each build started from the previous commit, so no unit was lost.
    let state = ctx.store().get_state(&app.handle());
    assert_eq!(state.generation(), 6);
    assert_eq!(state.descriptions().len(), 6);
    for i in 0..6 {
        assert!(app.generated(&format!("U{i}.out")).is_file());
    }
}

// ===========================================================================
// Debug information
// ===========================================================================

#[test]
fn installs_debug_info_for_built_container() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\nlet _t = foo\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();

    let classes = ws.path().join("classes");
    fs::create_dir_all(&classes).unwrap();
    fs::write(classes.join("A.class"), b"\xCA\xFE\xBA\xBEbody").unwrap();

    let request = InstallDebugInfoRequest::new(&classes, "app").with_installer(
        "out",
        SourceInstallerConfig {
            hide_synthetic_variables: true,
            ..SourceInstallerConfig::default()
        },
    );
    let sink = MemorySink::new();
    let report = ctx.install_debug_info(&request, &sink);
    assert!(report.is_success());
    assert_eq!(report.installed, vec![classes.join("A.class")]);
    assert!(sink.diagnostics().is_empty());

    let raw = fs::read(classes.join("A.class")).unwrap();
    assert!(raw.starts_with(b"\xCA\xFE\xBA\xBEbody"));
    let info = read_debug_info(&raw).unwrap().unwrap();
    assert_eq!(info.source_name, "A.lang");
    assert_eq!(info.lines.len(), 2);
    assert!(info.locals.is_empty());
}

#[test]
fn moved_source_lines_reach_installed_debug_info() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();

    app.write("A.lang", "\n\n\nexport foo(int)\n");
    let report = ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();
    assert!(report.written.is_empty());

    let classes = ws.path().join("classes");
    fs::create_dir_all(&classes).unwrap();
    fs::write(classes.join("A.class"), b"body").unwrap();
    let request = InstallDebugInfoRequest::new(&classes, "app").with_installer("out", SourceInstallerConfig::default());
    let install = ctx.install_debug_info(&request, &MemorySink::new());
    assert!(install.is_success());

    let info = read_debug_info(&fs::read(classes.join("A.class")).unwrap()).unwrap().unwrap();
    assert_eq!(info.lines, vec![LineMapping { generated_line: 2, source_line: 4 }]);
}

#[test]
fn install_failures_go_to_the_sink() {
    let ws = tempfile::tempdir().unwrap();
    let app = Project::new(&ws, "app");
    app.write("A.lang", "export foo(int)\n");
    let ctx = context();
    ctx.build(&app.request_dirty(&["A.lang"]), &MemorySink::new()).unwrap();
    fs::remove_file(app.generated("A.out")).unwrap();

    let request = InstallDebugInfoRequest::new(ws.path().join("classes"), "app")
        .with_installer("out", SourceInstallerConfig::default());
    let sink = MemorySink::new();
    let report = ctx.install_debug_info(&request, &sink);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(sink.diagnostics().len(), 1);
    assert_eq!(sink.diagnostics()[0].code, kiln_build::context::INSTALL_FAILED);
}
