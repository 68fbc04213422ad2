use autogen_jobs::path_guard::{check_write_allowed, PathGuard};
use tempfile::tempdir;

fn roots() -> Vec<String> {
    vec!["Assets/AutoGen".to_string(), "Assets/Generated".to_string()]
}

#[test]
fn path_guard_module_rejects_every_escape_shape() {
    let tmp = tempdir().expect("tempdir");
    let guard = PathGuard::new(tmp.path(), &roots()).with_case_insensitive(false);

    for candidate in [
        "../outside.asset",
        "Assets/AutoGen/../../../etc/passwd",
        "Assets\\AutoGen\\..\\..\\..\\escape.asset",
        "/etc/passwd",
        "",
        "   ",
        "Assets/AutoGenExtra/x.asset",
        "Assets/Other/x.asset",
    ] {
        let decision = guard.check_write_allowed(candidate, "Assets/AutoGen");
        assert!(!decision.allowed, "`{candidate}` should be rejected");
        assert!(decision.normalized.is_none());
        assert!(!decision.reason.is_empty());
    }
}

#[test]
fn path_guard_module_normalizes_accepted_paths() {
    let tmp = tempdir().expect("tempdir");
    let guard = PathGuard::new(tmp.path(), &roots()).with_case_insensitive(false);

    let decision = guard.check_write_allowed("Assets\\AutoGen\\./Configs//enemy.asset", "Assets/AutoGen");
    assert!(decision.allowed, "{}", decision.reason);
    assert_eq!(decision.normalized.as_deref(), Some("Assets/AutoGen/Configs/enemy.asset"));

    let absolute = tmp.path().join("Assets/Generated/level.asset");
    let decision = guard.check_write_allowed(&absolute.display().to_string(), "Assets/AutoGen");
    assert!(decision.allowed, "{}", decision.reason);
    assert_eq!(decision.normalized.as_deref(), Some("Assets/Generated/level.asset"));

    assert_eq!(
        guard.to_absolute("Assets/AutoGen/a.asset"),
        tmp.path().join("Assets").join("AutoGen").join("a.asset")
    );
}

#[test]
fn path_guard_module_free_function_agrees_with_the_guard() {
    let tmp = tempdir().expect("tempdir");
    let guard = PathGuard::new(tmp.path(), &roots());
    for candidate in ["Assets/AutoGen/a.asset", "../b.asset", "Assets/Generated/c.asset"] {
        assert_eq!(
            check_write_allowed(candidate, "Assets/AutoGen", &roots(), tmp.path()),
            guard.check_write_allowed(candidate, "Assets/AutoGen")
        );
    }
}

#[test]
fn path_guard_module_write_root_must_sit_under_an_allowed_root() {
    let tmp = tempdir().expect("tempdir");
    let guard = PathGuard::new(tmp.path(), &roots()).with_case_insensitive(false);

    assert!(guard.check_write_root("Assets/AutoGen/Level1").allowed);
    assert!(guard.check_write_root("Assets/AutoGen").allowed);
    assert!(!guard.check_write_root("Assets").allowed);
    assert!(!guard.check_write_root("Assets/AutoGen/../../Secrets").allowed);
    assert!(guard.is_under_assets("Assets/Textures/a.png"));
    assert!(!guard.is_under_assets("Packages/a.png"));
}
