use autogen_jobs::commands::builtin_commands;
use autogen_jobs::config::Settings;
use autogen_jobs::execution::{CommandRegistry, ErrorKind, RegistryError};
use autogen_jobs::queue::{JobPaths, JobStatus};
use autogen_jobs::runtime::{JobOutcome, JobRunner};
use autogen_jobs::world::{guid_for_path, Host, ObjectRef, Vec3};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn runner(root: &Path) -> JobRunner {
    let settings = Settings {
        enable_runner: false,
        ..Settings::default()
    };
    let host = Host::open(root, &settings.scene_file).expect("open host");
    let mut runner = JobRunner::new(JobPaths::from_project_root(root), settings, host);
    runner.initialize().expect("initialize");
    runner
}

fn run_job(runner: &JobRunner, job_id: &str, commands: Value) -> JobOutcome {
    let body = json!({"jobId": job_id, "commands": commands});
    fs::write(
        runner.paths().inbox.join(format!("{job_id}.job.json")),
        body.to_string(),
    )
    .expect("write job");
    runner
        .process_next_job()
        .expect("process")
        .expect("job available")
}

fn assert_done(outcome: &JobOutcome) {
    let finished = outcome.finished().expect("finished");
    assert_eq!(
        finished.result.status,
        JobStatus::Done,
        "{:?}",
        finished.result.error
    );
}

#[test]
fn commands_module_builtins_register_once() {
    let names: Vec<String> = builtin_commands()
        .iter()
        .map(|command| command.name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "CreateGameObject",
            "AddComponent",
            "SetTransform",
            "SetSerializedProperty",
            "CreateScriptableObject",
            "ImportAssets",
            "SaveAssets",
            "PingObject",
            "SelectObject",
            "InstantiatePrefabInScene",
            "CreateOrEditPrefab",
        ]
    );

    let mut registry = CommandRegistry::with_builtins().expect("builtins");
    let err = registry
        .register(builtin_commands().remove(0))
        .expect_err("duplicate");
    assert_eq!(err, RegistryError::Duplicate("CreateGameObject".to_string()));
    assert!(registry.contains("creategameobject"));
}

#[test]
fn commands_module_builds_and_saves_a_scene() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let outcome = run_job(
        &runner,
        "scene",
        json!([
            {"cmd": "CreateGameObject", "args": {"name": "Enemy", "position": [1, 2, 3]},
             "out": {"go": "$enemy"}},
            {"cmd": "AddComponent", "args": {"target": {"ref": "$enemy"}, "type": "Rigidbody"},
             "out": {"component": "$body"}},
            {"cmd": "SetSerializedProperty",
             "args": {"target": {"ref": "$enemy"}, "componentType": "Rigidbody",
                      "propertyPath": "mass", "value": 5}},
            {"cmd": "SetTransform", "args": {"target": "Enemy", "scale": {"x": 2, "y": 2, "z": 2}}},
            {"cmd": "SelectObject", "args": {"target": "$enemy"}},
            {"cmd": "PingObject", "args": {"target": {"ref": "$body"}}},
            {"cmd": "SaveAssets", "args": {"refresh": true}}
        ]),
    );
    assert_done(&outcome);

    let host = runner.host();
    let host = host.lock().expect("host lock");
    let enemy = host.scene.find_by_name("Enemy").expect("enemy");
    let transform = host.scene.transform_of(enemy).expect("transform");
    assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(transform.scale, Vec3::new(2.0, 2.0, 2.0));
    let body = host.scene.component_of(enemy, Some("Rigidbody")).expect("body");
    assert_eq!(host.selection, vec![ObjectRef::GameObject(enemy)]);
    assert_eq!(host.pinged, vec![ObjectRef::Component(body)]);
    assert!(!host.scene.is_dirty());

    let saved = fs::read_to_string(tmp.path().join(&runner.settings().scene_file)).expect("scene");
    assert!(saved.contains("\"Enemy\""));
    assert!(saved.contains("\"mass\": 5"));
}

#[test]
fn commands_module_creates_configures_and_reuses_assets() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let asset_path = "Assets/AutoGen/Configs/enemy.asset";
    let outcome = run_job(
        &runner,
        "assets",
        json!([
            {"cmd": "CreateScriptableObject",
             "args": {"type": "EnemyConfig", "assetPath": asset_path, "init": {"health": 10}},
             "out": {"asset": "$cfg"}},
            {"cmd": "SetSerializedProperty",
             "args": {"target": {"ref": "$cfg"}, "propertyPath": "stats.speed", "value": 3}},
            {"cmd": "SaveAssets"}
        ]),
    );
    assert_done(&outcome);

    let raw = fs::read_to_string(tmp.path().join(asset_path)).expect("asset file");
    let document: Value = serde_json::from_str(&raw).expect("asset json");
    assert_eq!(document["type"], "EnemyConfig");
    assert_eq!(document["guid"], guid_for_path(asset_path).as_str());
    assert_eq!(document["fields"]["health"], 10);
    assert_eq!(document["fields"]["stats"]["speed"], 3);

    let again = run_job(
        &runner,
        "assets-again",
        json!([
            {"cmd": "CreateScriptableObject",
             "args": {"type": "EnemyConfig", "assetPath": asset_path}}
        ]),
    );
    assert_done(&again);
    let record = &again.finished().expect("finished").result.commands[0];
    assert_eq!(record.message, "Asset already exists");
    assert!(record.outputs.contains_key("asset"));
}

#[test]
fn commands_module_import_stays_inside_assets() {
    let tmp = tempdir().expect("tempdir");
    let texture = tmp.path().join("Assets/Textures/hero.png");
    fs::create_dir_all(texture.parent().expect("parent")).expect("mkdir");
    fs::write(&texture, [0x89, b'P', b'N', b'G']).expect("texture");
    let runner = runner(tmp.path());

    let outside = run_job(
        &runner,
        "import-outside",
        json!([{"cmd": "ImportAssets", "args": {"paths": ["Assets/Textures/hero.png", "Packages/x.png"]}}]),
    );
    assert_eq!(
        outside.error().map(|error| error.kind),
        Some(ErrorKind::PolicyViolation)
    );

    let inside = run_job(
        &runner,
        "import-inside",
        json!([{"cmd": "ImportAssets", "args": {"paths": ["Assets/Textures/hero.png", " "], "force": true}}]),
    );
    assert_done(&inside);
    let host = runner.host();
    let mut host = host.lock().expect("host lock");
    let id = host
        .assets
        .load_by_path("Assets/Textures/hero.png")
        .expect("imported");
    assert_eq!(host.assets.type_of(id).as_deref(), Some("Texture2D"));
}

#[test]
fn commands_module_missing_arguments_fail_the_command() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let outcome = run_job(
        &runner,
        "bad-args",
        json!([{"cmd": "SetSerializedProperty", "args": {"target": "Nothing", "propertyPath": "x"}}]),
    );
    let error = outcome.error().expect("error");
    assert_eq!(error.kind, ErrorKind::CommandFailure);
    assert_eq!(error.message, "Missing 'value' argument");
}

#[test]
fn commands_module_prefabs_are_authored_then_instantiated() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let prefab_path = "Assets/AutoGen/Prefabs/Turret.prefab";
    let authored = run_job(
        &runner,
        "prefab-author",
        json!([
            {"cmd": "CreateGameObject", "args": {"name": "Level"}},
            {"cmd": "CreateOrEditPrefab",
             "args": {"prefabPath": prefab_path, "edits": [
                 {"cmd": "AddComponent", "args": {"target": {"ref": "$prefabRoot"}, "type": "Rigidbody"},
                  "out": {"component": "$body"}},
                 {"cmd": "SetSerializedProperty",
                  "args": {"target": {"ref": "$body"}, "propertyPath": "mass", "value": 7}},
                 {"cmd": "CreateGameObject", "args": {"name": "Barrel", "parentPath": "Turret"}}
             ]},
             "out": {"prefab": "$turret"}},
            {"cmd": "InstantiatePrefabInScene",
             "args": {"prefabPath": prefab_path, "parentPath": "Level",
                      "nameOverride": "TurretA", "position": [4, 0, 1]},
             "out": {"instance": "$a"}}
        ]),
    );
    assert_done(&authored);
    let record = &authored.finished().expect("finished").result.commands[1];
    assert_eq!(record.message, format!("Created prefab {prefab_path}"));

    let raw = fs::read_to_string(tmp.path().join(prefab_path)).expect("prefab file");
    let document: Value = serde_json::from_str(&raw).expect("prefab json");
    assert_eq!(document["type"], "Prefab");
    assert_eq!(document["fields"]["root"]["name"], "Turret");
    assert_eq!(document["fields"]["root"]["components"][0]["type"], "Rigidbody");
    assert_eq!(document["fields"]["root"]["components"][0]["fields"]["mass"], 7);
    assert_eq!(document["fields"]["root"]["children"][0]["name"], "Barrel");

    let host = runner.host();
    let host = host.lock().expect("host lock");
    assert!(host.scene.find_by_name("Turret").is_none());
    let instance = host.scene.find_by_path("Level/TurretA").expect("instance");
    assert!(host.scene.find_by_path("Level/TurretA/Barrel").is_some());
    assert_eq!(
        host.scene.transform_of(instance).map(|t| t.position),
        Some(Vec3::new(4.0, 0.0, 1.0))
    );
    assert!(host.scene.component_of(instance, Some("Rigidbody")).is_some());
}

#[test]
fn commands_module_prefab_edits_reload_existing_contents() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let prefab_path = "Assets/AutoGen/Prefabs/Crate.prefab";
    assert_done(&run_job(
        &runner,
        "prefab-create",
        json!([{"cmd": "CreateOrEditPrefab", "args": {"prefabPath": prefab_path, "rootName": "Box"}}]),
    ));

    let edited = run_job(
        &runner,
        "prefab-edit",
        json!([{"cmd": "CreateOrEditPrefab", "args": {"prefabPath": prefab_path, "edits": [
            {"cmd": "AddComponent", "args": {"target": "$prefabRoot", "type": "BoxCollider"}}
        ]}}]),
    );
    assert_done(&edited);
    let record = &edited.finished().expect("finished").result.commands[0];
    assert_eq!(record.message, format!("Edited prefab {prefab_path}"));

    let raw = fs::read_to_string(tmp.path().join(prefab_path)).expect("prefab file");
    let document: Value = serde_json::from_str(&raw).expect("prefab json");
    assert_eq!(document["fields"]["root"]["name"], "Box");
    assert_eq!(document["fields"]["root"]["components"][0]["type"], "BoxCollider");
}

#[test]
fn commands_module_prefab_writes_stay_in_the_sandbox() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let outcome = run_job(
        &runner,
        "prefab-escape",
        json!([{"cmd": "CreateOrEditPrefab", "args": {"prefabPath": "Assets/Elsewhere/Bad.prefab"}}]),
    );
    assert_eq!(
        outcome.error().map(|error| error.kind),
        Some(ErrorKind::PolicyViolation)
    );
    assert!(!tmp.path().join("Assets/Elsewhere/Bad.prefab").exists());

    let missing = run_job(
        &runner,
        "prefab-missing",
        json!([{"cmd": "InstantiatePrefabInScene", "args": {"prefabPath": "Assets/AutoGen/Nope.prefab"}}]),
    );
    assert_eq!(
        missing.error().map(|error| error.kind),
        Some(ErrorKind::ResolutionMiss)
    );
}

#[test]
fn commands_module_failed_prefab_edit_restores_the_scene() {
    let tmp = tempdir().expect("tempdir");
    let runner = runner(tmp.path());
    let prefab_path = "Assets/AutoGen/Prefabs/Broken.prefab";
    let outcome = run_job(
        &runner,
        "prefab-broken",
        json!([
            {"cmd": "CreateGameObject", "args": {"name": "Outer"}},
            {"cmd": "CreateOrEditPrefab", "args": {"prefabPath": prefab_path, "edits": [
                {"cmd": "SetTransform", "args": {"target": "Outer", "position": [1, 1, 1]}}
            ]}}
        ]),
    );
    let error = outcome.error().expect("error");
    assert_eq!(error.kind, ErrorKind::ResolutionMiss);
    assert!(error.message.starts_with("Nested command SetTransform failed"));
    assert!(!tmp.path().join(prefab_path).exists());

    let host = runner.host();
    let host = host.lock().expect("host lock");
    assert!(host.scene.find_by_name("Outer").is_some());
    assert!(host.scene.find_by_name("Broken").is_none());
}
