mod common;

use std::path::Path;

use common::FakeRegistry;
use jobwright_core::{
    manifest_store, JobDefinitionModel, JobManifest, JobName, TemplateReference, ValidationError,
};
use jobwright_sync::{
    pipeline::{self, ApplyAction, ApplyScope},
    state_store, DocumentBuilder, Plan, Reconciler, SyncError,
};
use tempfile::TempDir;

fn write_manifest(home: &Path, key: &str, name: &str, template: &str) {
    let mut manifest = JobManifest::with_template(name, TemplateReference::new(template));
    manifest.parameters.insert("branch".into(), "main".into());
    manifest_store::save_manifest_at(home, key, &manifest).expect("save manifest");
}

fn edit_manifest(home: &Path, key: &str, edit: impl FnOnce(&mut JobManifest)) {
    let mut manifest = manifest_store::load_manifest_at(home, key).expect("load");
    edit(&mut manifest);
    manifest_store::save_manifest_at(home, key, &manifest).expect("save");
}

fn apply(home: &Path, registry: &FakeRegistry, key: &str) -> ApplyAction {
    let reconciler = Reconciler::new(registry);
    pipeline::run(home, &reconciler, ApplyScope::Job(key.to_string()))
        .expect("apply")
        .remove(0)
        .action
}

#[test]
fn first_apply_creates_and_records_state() {
    common::init_logging();
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<branch>${Parameters.branch}</branch>");
    let registry = FakeRegistry::new();

    assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Created);

    assert_eq!(
        registry.document("api-build").as_deref(),
        Some("<branch>main</branch>")
    );
    let state = state_store::load_at(home.path(), "api").unwrap().expect("state");
    assert_eq!(state.record.id, JobName::from("api-build"));
    assert_eq!(state.parameters.parameters["branch"], "main");
}

#[test]
fn second_apply_is_unchanged_and_keeps_state() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    let before = state_store::load_at(home.path(), "api").unwrap();
    registry.clear_calls();

    assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Unchanged);
    assert!(registry.mutations().is_empty(), "{:?}", registry.calls());
    assert_eq!(state_store::load_at(home.path(), "api").unwrap(), before);
}

#[test]
fn changed_parameters_replace_the_job() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<b>${Parameters.branch}</b>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    edit_manifest(home.path(), "api", |m| {
        m.parameters.insert("branch".into(), "develop".into());
    });
    registry.clear_calls();

    assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Replaced);
    assert_eq!(registry.mutations(), vec!["delete api-build", "create api-build"]);
    assert_eq!(registry.document("api-build").as_deref(), Some("<b>develop</b>"));
}

#[test]
fn renamed_manifest_renames_remote_job() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    edit_manifest(home.path(), "api", |m| m.name = "api-ci".into());

    assert_eq!(
        apply(home.path(), &registry, "api"),
        ApplyAction::Updated {
            renamed_from: Some(JobName::from("api-build")),
            document_updated: false,
        }
    );
    assert_eq!(registry.job_names(), vec!["api-ci"]);
    let state = state_store::load_at(home.path(), "api").unwrap().unwrap();
    assert_eq!(state.record.id, JobName::from("api-ci"));
}

#[test]
fn stale_reference_suffix_settles_after_first_push() {
    let home = TempDir::new().unwrap();
    write_manifest(
        home.path(),
        "api",
        "api-build",
        "<a/>@00000000000000000000000000000000",
    );
    let registry = FakeRegistry::new();

    assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Created);
    registry.clear_calls();
    for _ in 0..3 {
        assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Unchanged);
    }
    assert!(registry.mutations().is_empty(), "{:?}", registry.calls());

    let state = state_store::load_at(home.path(), "api").unwrap().unwrap();
    assert_eq!(
        state.record.acknowledged_suffix.as_deref(),
        Some("00000000000000000000000000000000")
    );
}

#[test]
fn definition_description_change_updates_in_place() {
    let home = TempDir::new().unwrap();
    let manifest = JobManifest::with_definition("nightly", JobDefinitionModel::default());
    manifest_store::save_manifest_at(home.path(), "nightly", &manifest).unwrap();
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "nightly");
    edit_manifest(home.path(), "nightly", |m| {
        if let Some(definition) = m.definition.as_mut() {
            definition.description = Some("nightly build".into());
        }
    });
    registry.clear_calls();

    assert_eq!(
        apply(home.path(), &registry, "nightly"),
        ApplyAction::Updated {
            renamed_from: None,
            document_updated: true,
        }
    );
    assert_eq!(registry.mutations(), vec!["update nightly"]);
    assert!(registry
        .document("nightly")
        .unwrap()
        .contains("<description>nightly build</description>"));
}

#[test]
fn definition_with_template_bindings_is_rejected() {
    let home = TempDir::new().unwrap();
    let mut manifest = JobManifest::with_definition("nightly", JobDefinitionModel::default());
    manifest.description = Some("ignored".into());
    manifest_store::save_manifest_at(home.path(), "nightly", &manifest).unwrap();
    let registry = FakeRegistry::new();
    let reconciler = Reconciler::new(&registry);

    let err = pipeline::run(home.path(), &reconciler, ApplyScope::Job("nightly".into()))
        .unwrap_err();
    assert!(
        matches!(
            err,
            SyncError::Validation(ValidationError::DefinitionBinding { field: "description" })
        ),
        "got: {err}"
    );
    assert!(registry.calls().is_empty());
}

#[test]
fn job_deleted_out_of_band_is_recreated() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    registry.remove_out_of_band("api-build");

    assert_eq!(apply(home.path(), &registry, "api"), ApplyAction::Recreated);
    assert_eq!(registry.job_names(), vec!["api-build"]);
}

#[test]
fn failed_update_leaves_previous_state() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    let before = state_store::load_at(home.path(), "api").unwrap();

    edit_manifest(home.path(), "api", |m| {
        m.template = Some(TemplateReference::new("<b/>"));
    });
    registry.fail_on("update");
    let reconciler = Reconciler::new(&registry);
    let err = pipeline::run(home.path(), &reconciler, ApplyScope::Job("api".into()))
        .unwrap_err();

    assert!(matches!(err, SyncError::Update { .. }), "got: {err}");
    assert_eq!(state_store::load_at(home.path(), "api").unwrap(), before);
}

#[test]
fn rename_that_landed_before_failed_update_is_adopted() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    edit_manifest(home.path(), "api", |m| {
        m.name = "api-ci".into();
        m.template = Some(TemplateReference::new("<b/>"));
    });

    registry.fail_on("update");
    let reconciler = Reconciler::new(&registry);
    pipeline::run(home.path(), &reconciler, ApplyScope::Job("api".into())).unwrap_err();
    assert_eq!(registry.job_names(), vec!["api-ci"]);
    let stale = state_store::load_at(home.path(), "api").unwrap().unwrap();
    assert_eq!(stale.record.id, JobName::from("api-build"));

    registry.recover();
    registry.clear_calls();
    assert_eq!(
        apply(home.path(), &registry, "api"),
        ApplyAction::Updated {
            renamed_from: None,
            document_updated: true,
        }
    );
    assert_eq!(registry.mutations(), vec!["update api-ci"]);
    assert_eq!(registry.document("api-ci").as_deref(), Some("<b/>"));
    let state = state_store::load_at(home.path(), "api").unwrap().unwrap();
    assert_eq!(state.record.id, JobName::from("api-ci"));
}

#[test]
fn dry_run_touches_nothing() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");

    let results = pipeline::plan(home.path(), &DocumentBuilder::new(), ApplyScope::All).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].action, ApplyAction::Planned(Plan::Create));
    assert!(results[0].template_hash.is_none());
    assert!(state_store::load_at(home.path(), "api").unwrap().is_none());
}

#[test]
fn dry_run_reports_would_replace() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    edit_manifest(home.path(), "api", |m| m.disabled = true);
    registry.clear_calls();

    let results =
        pipeline::plan(home.path(), &DocumentBuilder::new(), ApplyScope::Job("api".into()))
            .unwrap();
    assert_eq!(results[0].action, ApplyAction::WouldReplace);
    assert!(registry.calls().is_empty());
}

#[test]
fn apply_all_processes_every_manifest_in_key_order() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "b", "job-b", "<b/>");
    write_manifest(home.path(), "a", "job-a", "<a/>");
    let registry = FakeRegistry::new();
    let reconciler = Reconciler::new(&registry);

    let results = pipeline::run(home.path(), &reconciler, ApplyScope::All).unwrap();
    let keys: Vec<_> = results.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(registry.job_names(), vec!["job-a", "job-b"]);
}

#[test]
fn invalid_manifest_is_rejected_before_any_call() {
    let home = TempDir::new().unwrap();
    let mut manifest = JobManifest::with_template("api-build", TemplateReference::new("<a/>"));
    manifest.definition = Some(Default::default());
    manifest_store::save_manifest_at(home.path(), "api", &manifest).unwrap();
    let registry = FakeRegistry::new();
    let reconciler = Reconciler::new(&registry);

    let err = pipeline::run(home.path(), &reconciler, ApplyScope::Job("api".into()))
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)), "got: {err}");
    assert!(registry.calls().is_empty());
}

#[test]
fn destroy_deletes_job_and_state() {
    let home = TempDir::new().unwrap();
    write_manifest(home.path(), "api", "api-build", "<a/>");
    let registry = FakeRegistry::new();
    apply(home.path(), &registry, "api");
    let reconciler = Reconciler::new(&registry);

    let deleted = pipeline::destroy(home.path(), &reconciler, "api").unwrap();
    assert_eq!(deleted.map(|r| r.id), Some(JobName::from("api-build")));
    assert!(registry.job_names().is_empty());
    assert!(state_store::load_at(home.path(), "api").unwrap().is_none());

    assert_eq!(pipeline::destroy(home.path(), &reconciler, "api").unwrap(), None);
}
