//! Project-level enhancement: toggle, persistence and compilation events

use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tqe_core::{EnhancementService, EnhancementToggle, ProjectRegistry, SharedFactory};
use tqe_enhance::{CompileContext, LocalCompileContext, Severity, COMPLETION_MESSAGE};
use tqe_test_utils::{class_file_bytes, compiled_set, is_enhanced, ScriptedFactory, TempProject};

fn shared(factory: &ScriptedFactory) -> SharedFactory {
    Arc::new(factory.clone())
}

/// Module `app` declaring `com.acme.domain` with one compiled query bean
fn shop() -> TempProject {
    let project = TempProject::new().with_module("app");
    project.write_output_manifest("app", &["com.acme.domain"]);
    project.write_source("app", "com.acme.domain.QOrder");
    project.write_class("app", "com.acme.domain.QOrder");
    project
}

#[test]
fn new_project_starts_disabled() {
    let fixture = shop();
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();

    assert!(!service.is_enabled());
    assert_eq!(service.bus().listener_count(), 0);
}

#[test]
fn toggle_state_survives_reopening() {
    let fixture = shop();
    let factory = ScriptedFactory::new();

    let service = EnhancementService::open(fixture.root(), shared(&factory)).unwrap();
    service.set_enabled(true).unwrap();
    service.close().unwrap();
    assert!(fixture.root().join(".tqe/workspace.json").is_file());

    let reopened = EnhancementService::open(fixture.root(), shared(&factory)).unwrap();
    assert!(reopened.is_enabled());
    assert_eq!(reopened.bus().listener_count(), 1);
}

#[test]
fn close_stops_listening_but_keeps_the_saved_state() {
    let fixture = shop();
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();
    service.set_enabled(true).unwrap();
    let bus = Arc::clone(service.bus());

    service.close().unwrap();

    assert_eq!(bus.listener_count(), 0);
    let saved = fs::read_to_string(fixture.root().join(".tqe/workspace.json")).unwrap();
    assert!(saved.contains("avajeTypeQueryEnhancement"));
    assert!(saved.contains("true"));
}

#[test]
fn enabling_twice_registers_one_listener() {
    let fixture = shop();
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();

    service.set_enabled(true).unwrap();
    service.set_enabled(true).unwrap();

    assert_eq!(service.bus().listener_count(), 1);
}

#[test]
fn compilation_event_enhances_only_when_enabled() {
    let fixture = shop();
    let file = fixture.output_dir("app").join("com/acme/domain/QOrder.class");
    let compiled = compiled_set([("com.acme.domain.QOrder", file.clone())]);
    let factory = ScriptedFactory::new();
    let service = EnhancementService::open(fixture.root(), shared(&factory)).unwrap();
    let ctx = LocalCompileContext::new(service.build_project().unwrap());

    assert!(service.compilation_finished(&ctx, &compiled).is_none());
    assert_eq!(fs::read(&file).unwrap(), class_file_bytes("com/acme/domain/QOrder"));
    assert!(factory.record().calls.is_empty());

    service.set_enabled(true).unwrap();
    let report = service.compilation_finished(&ctx, &compiled).unwrap();

    assert_eq!(report.transformed.len(), 1);
    assert!(report.completed);
    assert!(is_enhanced(&fs::read(&file).unwrap()));
    assert!(ctx.messages().contains(Severity::Information, COMPLETION_MESSAGE));
}

#[test]
fn forced_enhancement_runs_while_disabled() {
    let fixture = shop();
    let file = fixture.output_dir("app").join("com/acme/domain/QOrder.class");
    let compiled = compiled_set([("com.acme.domain.QOrder", file.clone())]);
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();
    let ctx = LocalCompileContext::new(service.build_project().unwrap());

    let report = service.enhance(&ctx, &compiled);

    assert!(!service.is_enabled());
    assert_eq!(report.transformed.len(), 1);
    assert!(is_enhanced(&fs::read(&file).unwrap()));
}

#[test]
fn project_config_is_read_from_tqe_toml() {
    let fixture = shop();
    fixture.write(
        "tqe.toml",
        "settings_path = \"state/toggle.json\"\n\n[enhance.agent]\ndebug = 0\n",
    );
    let file = fixture.output_dir("app").join("com/acme/domain/QOrder.class");
    let compiled = compiled_set([("com.acme.domain.QOrder", file)]);
    let factory = ScriptedFactory::new();
    let service = EnhancementService::open(fixture.root(), shared(&factory)).unwrap();

    service.set_enabled(true).unwrap();
    assert!(fixture.root().join("state/toggle.json").is_file());
    assert!(!fixture.root().join(".tqe/workspace.json").exists());

    let ctx = LocalCompileContext::new(service.build_project().unwrap());
    service.compilation_finished(&ctx, &compiled).unwrap();
    assert_eq!(factory.record().agent_args.as_deref(), Some("debug=0"));
}

#[test]
fn invalid_tqe_toml_fails_to_open() {
    let fixture = shop();
    fixture.write("tqe.toml", "modules = 3\n");

    let err = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap_err();
    assert!(err.to_string().starts_with("configuration error: invalid config"));
}

#[test]
fn packages_merge_output_and_resource_manifests() {
    let fixture = TempProject::new().with_module("app").with_module("model");
    fixture.write_output_manifest("app", &["com.foo"]);
    fixture.write_resource_manifest("model", &["com.foo", "com.bar"]);
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();
    let ctx = LocalCompileContext::new(service.build_project().unwrap());

    let packages = service.packages(&ctx);

    assert_eq!(packages.iter().collect::<Vec<_>>(), vec!["com.bar", "com.foo"]);
}

#[test]
fn built_project_detects_modules_and_libraries() {
    let fixture = TempProject::new().with_module("app").with_module("model");
    fixture.write_source("model", "com.acme.model.Customer");
    fixture.write_library_class("org.lib.BaseModel");
    fixture.write("tqe.toml", "library_dirs = [\"lib\"]\n");
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();

    let project = service.build_project().unwrap();
    let ctx = LocalCompileContext::new(project);

    let names: Vec<&str> = ctx.project().modules().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["app", "model"]);
    assert!(ctx.project().index().find_class("com.acme.model.Customer").is_some());
    assert!(ctx.project().index().find_class("org.lib.BaseModel").is_some());
    assert_eq!(
        ctx.project().module("model").and_then(|m| m.output_dir()),
        Some(fixture.output_dir("model").as_path())
    );
}

#[test]
fn toggle_reaches_registered_service() {
    let fixture = shop();
    let service = EnhancementService::open(fixture.root(), shared(&ScriptedFactory::new())).unwrap();
    let registry = ProjectRegistry::new();
    service.register(&registry, "shop");
    let toggle = EnhancementToggle::new(&registry);

    toggle.set_selected("shop", true);

    assert!(service.is_enabled());
    assert!(toggle.is_selected("shop"));
    assert!(!toggle.is_selected("blog"));
}
