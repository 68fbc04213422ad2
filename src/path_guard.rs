use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    pub allowed: bool,
    pub reason: String,
    pub normalized: Option<String>,
}

impl PathDecision {
    fn allow(normalized: String, reason: String) -> Self {
        Self {
            allowed: true,
            reason,
            normalized: Some(normalized),
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason,
            normalized: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    project_root: PathBuf,
    root_components: Vec<String>,
    allowed_roots: Vec<String>,
    case_insensitive: bool,
}

impl PathGuard {
    pub fn new(project_root: impl Into<PathBuf>, allowed_roots: &[String]) -> Self {
        let project_root = project_root.into();
        let root_components = lexical_components(&project_root).unwrap_or_default();
        Self {
            project_root,
            root_components,
            allowed_roots: allowed_roots.to_vec(),
            case_insensitive: cfg!(any(windows, target_os = "macos")),
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn allowed_roots(&self) -> &[String] {
        &self.allowed_roots
    }

    pub fn check_write_allowed(&self, candidate: &str, write_root: &str) -> PathDecision {
        let components = match self.sandbox_components(candidate) {
            Ok(components) => components,
            Err(reason) => return PathDecision::deny(format!("write path `{candidate}` {reason}")),
        };
        if components.is_empty() {
            return PathDecision::deny(format!(
                "write path `{candidate}` resolves to the project root itself"
            ));
        }
        let normalized = components.join("/");

        if let Ok(root) = self.sandbox_components(write_root) {
            if !root.is_empty() && self.is_descendant(&components, &root) {
                return PathDecision::allow(
                    normalized,
                    format!("under job write root `{write_root}`"),
                );
            }
        }

        for allowed in &self.allowed_roots {
            let Ok(root) = self.sandbox_components(allowed) else {
                continue;
            };
            if !root.is_empty() && self.is_descendant(&components, &root) {
                return PathDecision::allow(normalized, format!("under allowed root `{allowed}`"));
            }
        }

        PathDecision::deny(format!(
            "write path `{candidate}` (normalized `{normalized}`) is outside write root `{write_root}` and allowed roots [{}]",
            self.allowed_roots.join(", ")
        ))
    }

    pub fn is_write_allowed(&self, candidate: &str, write_root: &str) -> bool {
        self.check_write_allowed(candidate, write_root).allowed
    }

    pub fn check_write_root(&self, write_root: &str) -> PathDecision {
        let components = match self.sandbox_components(write_root) {
            Ok(components) => components,
            Err(reason) => return PathDecision::deny(format!("write root `{write_root}` {reason}")),
        };
        if components.is_empty() {
            return PathDecision::deny(format!(
                "write root `{write_root}` resolves to the project root itself"
            ));
        }
        let normalized = components.join("/");
        for allowed in &self.allowed_roots {
            let Ok(root) = self.sandbox_components(allowed) else {
                continue;
            };
            if !root.is_empty() && self.is_descendant(&components, &root) {
                return PathDecision::allow(normalized, format!("under allowed root `{allowed}`"));
            }
        }
        PathDecision::deny(format!(
            "write root `{write_root}` is not under any allowed root [{}]",
            self.allowed_roots.join(", ")
        ))
    }

    pub fn normalize(&self, raw: &str) -> Result<String, String> {
        self.sandbox_components(raw)
            .map(|components| components.join("/"))
            .map_err(|reason| format!("path `{raw}` {reason}"))
    }

    pub fn is_under_assets(&self, raw: &str) -> bool {
        self.sandbox_components(raw)
            .ok()
            .and_then(|components| components.first().map(|first| self.fold(first) == self.fold("Assets")))
            .unwrap_or(false)
    }

    pub fn to_absolute(&self, normalized: &str) -> PathBuf {
        normalized
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.project_root.clone(), |acc, part| acc.join(part))
    }

    fn sandbox_components(&self, raw: &str) -> Result<Vec<String>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("is empty".to_string());
        }
        let unified = trimmed.replace('\\', "/");

        if unified.starts_with('/') || Path::new(&unified).is_absolute() {
            let absolute = lexical_components(Path::new(&unified))?;
            if !self.is_descendant(&absolute, &self.root_components) {
                return Err("is outside the project sandbox".to_string());
            }
            return Ok(absolute[self.root_components.len()..].to_vec());
        }

        let mut stack: Vec<String> = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        return Err("escapes the project sandbox".to_string());
                    }
                }
                other => stack.push(other.to_string()),
            }
        }
        Ok(stack)
    }

    fn is_descendant(&self, candidate: &[String], root: &[String]) -> bool {
        root.len() <= candidate.len()
            && root
                .iter()
                .zip(candidate)
                .all(|(a, b)| self.fold(a) == self.fold(b))
    }

    fn fold(&self, value: &str) -> String {
        if self.case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }
}

pub fn check_write_allowed(
    candidate: &str,
    write_root: &str,
    allowed_roots: &[String],
    project_root: &Path,
) -> PathDecision {
    PathGuard::new(project_root, allowed_roots).check_write_allowed(candidate, write_root)
}

fn lexical_components(path: &Path) -> Result<Vec<String>, String> {
    let mut normalized = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                normalized.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if normalized.pop().is_none() {
                    return Err("escapes filesystem root".to_string());
                }
            }
            Component::Normal(value) => normalized.push(value.to_string_lossy().into_owned()),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PathGuard {
        PathGuard::new(
            "/projects/game",
            &["Assets/AutoGen".to_string(), "Assets/Generated".to_string()],
        )
        .with_case_insensitive(false)
    }

    #[test]
    fn accepts_descendants_of_write_root() {
        let guard = guard();
        for candidate in [
            "Assets/AutoGen/Configs/a.asset",
            "Assets/AutoGen",
            "./Assets/AutoGen/x.asset",
            "Assets/AutoGen/./Prefabs/../Configs/b.asset",
            "Assets\\AutoGen\\Configs\\c.asset",
            "Assets/AutoGen\\Mixed/d.asset",
            "Assets//AutoGen///e.asset",
            "/projects/game/Assets/AutoGen/f.asset",
        ] {
            let decision = guard.check_write_allowed(candidate, "Assets/AutoGen");
            assert!(decision.allowed, "{candidate}: {}", decision.reason);
        }
    }

    #[test]
    fn rejects_traversal_and_foreign_paths() {
        let guard = guard();
        for candidate in [
            "",
            "   ",
            "../outside.asset",
            "Assets/AutoGen/../../../etc/passwd",
            "Assets/AutoGen/../Scripts/Player.cs",
            "Assets\\AutoGen\\..\\..\\x",
            "Assets/AutoGenX/evil.asset",
            "Assets",
            "/etc/passwd",
            "/projects/game/../other/Assets/AutoGen/a.asset",
            "/projects/gameplay/Assets/AutoGen/a.asset",
            ".",
        ] {
            let decision = guard.check_write_allowed(candidate, "Assets/AutoGen");
            assert!(!decision.allowed, "{candidate} should be rejected");
            assert!(!decision.reason.is_empty());
        }
    }

    #[test]
    fn allow_listed_roots_are_accepted_alongside_write_root() {
        let guard = guard();
        let decision = guard.check_write_allowed("Assets/Generated/x.asset", "Assets/AutoGen/Sub");
        assert!(decision.allowed);
        assert_eq!(decision.normalized.as_deref(), Some("Assets/Generated/x.asset"));

        let decision = guard.check_write_allowed("Assets/AutoGen/Other/y.asset", "Assets/AutoGen/Sub");
        assert!(decision.allowed, "global root still covers siblings of the job root");
    }

    #[test]
    fn case_folding_follows_configuration() {
        let sensitive = guard();
        assert!(!sensitive.is_write_allowed("assets/autogen/a.asset", "Assets/AutoGen"));

        let insensitive = guard().with_case_insensitive(true);
        assert!(insensitive.is_write_allowed("assets/autogen/a.asset", "Assets/AutoGen"));
    }

    #[test]
    fn decisions_are_deterministic() {
        let guard = guard();
        let a = guard.check_write_allowed("Assets/AutoGen/../x", "Assets/AutoGen");
        let b = guard.check_write_allowed("Assets/AutoGen/../x", "Assets/AutoGen");
        assert_eq!(a, b);
    }

    #[test]
    fn write_root_preflight_requires_allow_listed_root() {
        let guard = guard();
        assert!(guard.check_write_root("Assets/AutoGen").allowed);
        assert!(guard.check_write_root("Assets/AutoGen/Levels").allowed);
        assert!(!guard.check_write_root("Assets").allowed);
        assert!(!guard.check_write_root("Assets/Scripts").allowed);
        assert!(!guard.check_write_root("").allowed);
        assert!(!guard.check_write_root("../Assets/AutoGen").allowed);
    }

    #[test]
    fn free_function_matches_guard() {
        let decision = check_write_allowed(
            "Assets/AutoGen/a.asset",
            "Assets/AutoGen",
            &["Assets/AutoGen".to_string()],
            Path::new("/projects/game"),
        );
        assert!(decision.allowed);
    }

    #[test]
    fn to_absolute_joins_under_project_root() {
        let guard = guard();
        assert_eq!(
            guard.to_absolute("Assets/AutoGen/a.asset"),
            PathBuf::from("/projects/game/Assets/AutoGen/a.asset")
        );
        assert!(guard.is_under_assets("Assets/Textures/a.png"));
        assert!(!guard.is_under_assets("Packages/x"));
    }
}
