//! End-to-end resolver scenarios: project fixtures on disk through to the
//! generated output file.

mod common;

use common::TestEnv;
use o3de_cli::resolver::{resolve_gem_dependencies, write_resolution_file};

#[test]
fn resolves_exact_and_bare_tokens_to_expected_paths() {
    let env = TestEnv::new();
    let project = env.write_project("proj", "Sample", None, &["gemA==1.2.3", "gemB"]);
    let gems = project.join("Gems");
    let a123 = env.write_gem(&gems, "gemA", Some("1.2.3"));
    env.write_gem(&gems, "gemA", Some("2.3.4"));
    env.write_gem(&gems, "gemB", None);
    env.write_gem(&gems, "gemB", Some("1.0.0"));
    let b2 = env.write_gem(&gems, "gemB", Some("2.0.0"));

    let manifest = env.load_manifest();
    let resolved =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap();

    let output = env.home().join("gem_paths");
    write_resolution_file(&output, &resolved).unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        format!("gemA;{};gemB;{}", a123.display(), b2.display())
    );
}

#[test]
fn single_candidate_resolves_and_returns_success() {
    let env = TestEnv::new();
    let project = env.write_project("proj", "Sample", None, &["gemA"]);
    let a = env.write_gem(&project.join("Gems"), "gemA", Some("1.2.3"));

    let manifest = env.load_manifest();
    let resolved =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap();

    let output = env.home().join("gem_paths");
    write_resolution_file(&output, &resolved).unwrap();
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        format!("gemA;{}", a.display())
    );
}

#[test]
fn unsatisfiable_token_fails_and_writes_no_output() {
    let env = TestEnv::new();
    let project = env.write_project("proj", "Sample", None, &["gemA==2.0.0"]);
    env.write_gem(&project.join("Gems"), "gemA", Some("1.2.3"));

    let manifest = env.load_manifest();
    let err =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap_err();
    assert!(err.to_string().contains("gemA==2.0.0"));

    // The caller writes the output only on success; nothing exists.
    assert!(!env.home().join("gem_paths").exists());
}

#[test]
fn empty_gem_names_writes_empty_string() {
    let env = TestEnv::new();
    let project = env.write_project("proj", "Sample", None, &[]);

    let manifest = env.load_manifest();
    let resolved =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap();

    let output = env.home().join("gem_paths");
    write_resolution_file(&output, &resolved).unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[test]
fn each_gem_name_is_emitted_at_most_once() {
    let env = TestEnv::new();
    let project =
        env.write_project("proj", "Sample", Some("o3de"), &["gemA", "gemA==1.0.0", "gemB"]);
    let gems = project.join("Gems");
    env.write_gem(&gems, "gemA", Some("1.0.0"));
    env.write_gem(&gems, "gemB", Some("1.0.0"));

    // The bound engine also asks for gemA; it must not appear twice.
    let engine_dir = env.write_engine("eng", "o3de", "1.0.0");
    let engine_json = engine_dir.join("engine.json");
    let mut engine: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&engine_json).unwrap()).unwrap();
    engine["gem_names"] = serde_json::json!(["gemA"]);
    std::fs::write(&engine_json, engine.to_string()).unwrap();

    let mut manifest = env.load_manifest();
    o3de_cli::registration::register_path(
        &mut manifest,
        o3de_cli::models::ObjectKind::Engine,
        &engine_dir,
        false,
    )
    .unwrap();

    let resolved =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap();
    let names: Vec<&str> = resolved.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["gemA", "gemB"]);
}

#[test]
fn manifest_registered_gems_are_visible_to_projects() {
    let env = TestEnv::new();
    let project = env.write_project("proj", "Sample", None, &["shared"]);
    let shared_root = env.home().join("shared-gems");
    let shared = env.write_gem(&shared_root, "shared", Some("1.0.0"));

    let mut manifest = env.load_manifest();
    o3de_cli::registration::register_path(
        &mut manifest,
        o3de_cli::models::ObjectKind::Gem,
        &shared,
        false,
    )
    .unwrap();

    let resolved =
        resolve_gem_dependencies(&manifest, env.home(), &project, None, &[]).unwrap();
    assert_eq!(resolved[0].name, "shared");
}
