use super::command::CommandExecResult;
use super::log::JobLog;
use super::registry::CommandRegistry;
use super::resolver;
use super::target::TargetRef;
use super::variables::{normalize_var_name, VariableTable};
use crate::path_guard::PathGuard;
use crate::queue::Job;
use crate::world::{Capability, Host, ObjectRef};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLookup {
    Found(ObjectRef),
    Deferred(String),
}

impl TargetLookup {
    pub fn found(&self) -> Option<ObjectRef> {
        match self {
            Self::Found(object) => Some(*object),
            Self::Deferred(_) => None,
        }
    }
}

pub struct CommandContext<'a> {
    job: &'a Job,
    host: &'a mut Host,
    guard: &'a PathGuard,
    log: &'a mut JobLog,
    registry: Option<&'a CommandRegistry>,
    vars: VariableTable,
    write_root: String,
    dry_run: bool,
    command_index: usize,
    declared: BTreeSet<String>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        job: &'a Job,
        host: &'a mut Host,
        guard: &'a PathGuard,
        log: &'a mut JobLog,
        write_root: &str,
    ) -> Self {
        Self {
            job,
            host,
            guard,
            log,
            registry: None,
            vars: VariableTable::new(),
            write_root: write_root.to_string(),
            dry_run: job.dry_run,
            command_index: 0,
            declared: BTreeSet::new(),
        }
    }

    pub fn with_registry(mut self, registry: &'a CommandRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn registry(&self) -> Option<&'a CommandRegistry> {
        self.registry
    }

    pub fn job(&self) -> &Job {
        self.job
    }

    pub fn job_id(&self) -> &str {
        &self.job.job_id
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn write_root(&self) -> &str {
        &self.write_root
    }

    pub fn command_index(&self) -> usize {
        self.command_index
    }

    pub fn host(&self) -> &Host {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut *self.host
    }

    pub fn guard(&self) -> &PathGuard {
        self.guard
    }

    pub fn log(&mut self) -> &mut JobLog {
        &mut *self.log
    }

    pub fn vars(&self) -> &VariableTable {
        &self.vars
    }

    pub fn describe(&self, object: ObjectRef) -> String {
        self.host.describe(object)
    }

    pub(crate) fn begin_command(&mut self, index: usize, name: &str) {
        self.command_index = index;
        self.log.set_command(Some(name.to_string()));
    }

    pub(crate) fn end_command(&mut self, declared_outputs: impl IntoIterator<Item = String>) {
        for name in declared_outputs {
            if let Some(key) = normalize_var_name(&name) {
                self.declared.insert(key);
            }
        }
        self.log.set_command(None);
    }

    pub(crate) fn set_var(&mut self, name: &str, object: ObjectRef) {
        match self.vars.set(name, object) {
            Some(key) => {
                let described = self.host.describe(object);
                self.log.debug(format!("Set variable {key} = {described}"));
            }
            None => self
                .log
                .warn("Ignoring variable binding with an empty name".to_string()),
        }
    }

    pub(crate) fn swap_vars(&mut self, vars: VariableTable) -> VariableTable {
        std::mem::replace(&mut self.vars, vars)
    }

    pub fn get_var(&self, name: &str) -> Option<ObjectRef> {
        self.vars.get(name)
    }

    pub fn get_var_as(&mut self, name: &str, capability: &Capability) -> Option<ObjectRef> {
        let object = self.vars.get(name)?;
        if resolver::kind_matches(self.host, self.log, name, object, capability) {
            Some(object)
        } else {
            None
        }
    }

    pub fn resolve_target(&mut self, target: &TargetRef) -> Option<ObjectRef> {
        resolver::resolve(self.host, &self.vars, self.log, target)
    }

    pub fn resolve_target_as(
        &mut self,
        target: &TargetRef,
        capability: &Capability,
    ) -> Option<ObjectRef> {
        let object = self.resolve_target(target)?;
        self.coerce(object, capability)
    }

    pub fn coerce(&mut self, object: ObjectRef, capability: &Capability) -> Option<ObjectRef> {
        resolver::coerce(self.host, self.log, object, capability)
    }

    pub fn is_path_allowed(&self, path: &str) -> bool {
        self.guard.is_write_allowed(path, &self.write_root)
    }

    pub fn validate_write_path(&mut self, path: &str) -> bool {
        let decision = self.guard.check_write_allowed(path, &self.write_root);
        if !decision.allowed {
            self.log
                .error(format!("Write path rejected: {}", decision.reason));
        }
        decision.allowed
    }

    pub fn check_write_path(&mut self, path: &str) -> Result<String, CommandExecResult> {
        let decision = self.guard.check_write_allowed(path, &self.write_root);
        match decision.normalized {
            Some(normalized) if decision.allowed => Ok(normalized),
            _ => {
                self.log
                    .error(format!("Write path rejected: {}", decision.reason));
                Err(CommandExecResult::policy_violation(decision.reason))
            }
        }
    }

    pub fn is_declared_output(&self, name: &str) -> bool {
        normalize_var_name(name).is_some_and(|key| self.declared.contains(&key))
    }

    pub fn expect_target(
        &mut self,
        args: &Map<String, Value>,
        key: &str,
        capability: &Capability,
    ) -> Result<TargetLookup, CommandExecResult> {
        self.lookup_target(args, key, Some(capability))
    }

    pub fn expect_any_target(
        &mut self,
        args: &Map<String, Value>,
        key: &str,
    ) -> Result<TargetLookup, CommandExecResult> {
        self.lookup_target(args, key, None)
    }

    fn lookup_target(
        &mut self,
        args: &Map<String, Value>,
        key: &str,
        capability: Option<&Capability>,
    ) -> Result<TargetLookup, CommandExecResult> {
        let raw = args
            .get(key)
            .ok_or_else(|| CommandExecResult::failure(format!("Missing '{key}' argument")))?;
        let target = TargetRef::from_value(raw).map_err(|err| {
            CommandExecResult::failure(format!("Invalid '{key}' format: {err}"))
        })?;

        if self.dry_run {
            if let Some(name) = target.var_name() {
                if self.vars.get(name).is_none() && self.is_declared_output(name) {
                    self.log.info(format!(
                        "[DryRun] {name} is produced by an earlier command; treating as resolvable"
                    ));
                    return Ok(TargetLookup::Deferred(name.to_string()));
                }
            }
        }

        let resolved = match capability {
            Some(capability) => self.resolve_target_as(&target, capability),
            None => self.resolve_target(&target),
        };
        match (resolved, capability) {
            (Some(object), _) => Ok(TargetLookup::Found(object)),
            (None, Some(capability)) => Err(CommandExecResult::resolution_miss(format!(
                "Target not found: {target} (as {capability})"
            ))),
            (None, None) => Err(CommandExecResult::resolution_miss(format!(
                "Target not found: {target}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ErrorKind;
    use serde_json::json;
    use tempfile::tempdir;

    fn job(dry_run: bool) -> Job {
        let raw = json!({"jobId": "t1", "dryRun": dry_run}).to_string();
        Job::parse(&raw, "t1").expect("job")
    }

    #[test]
    fn write_path_checks_use_job_root_and_log_violations() {
        let dir = tempdir().expect("tempdir");
        let job = job(false);
        let mut host = Host::in_memory(dir.path());
        let guard = PathGuard::new(dir.path(), &["Assets/AutoGen".to_string()]);
        let mut log = JobLog::new("t1", false);
        let mut ctx = CommandContext::new(&job, &mut host, &guard, &mut log, "Assets/AutoGen");

        assert!(ctx.is_path_allowed("Assets/AutoGen/a.asset"));
        assert!(ctx.validate_write_path("Assets/AutoGen/a.asset"));
        assert!(!ctx.validate_write_path("../escape.asset"));
        let err = ctx
            .check_write_path("Assets/Other/b.asset")
            .expect_err("outside");
        assert_eq!(err.error_kind, Some(ErrorKind::PolicyViolation));
        assert_eq!(log.count_at(crate::execution::LogLevel::Error), 2);
    }

    #[test]
    fn variables_bind_with_marker_and_kind_filter_warns() {
        let dir = tempdir().expect("tempdir");
        let job = job(false);
        let mut host = Host::in_memory(dir.path());
        let go = host.scene.create_object("Spawner", None).expect("go");
        let guard = PathGuard::new(dir.path(), &["Assets/AutoGen".to_string()]);
        let mut log = JobLog::new("t1", false);
        let mut ctx = CommandContext::new(&job, &mut host, &guard, &mut log, "Assets/AutoGen");

        ctx.set_var("spawner", ObjectRef::GameObject(go));
        ctx.set_var("", ObjectRef::GameObject(go));
        assert_eq!(ctx.get_var("$spawner"), Some(ObjectRef::GameObject(go)));
        assert_eq!(ctx.get_var_as("$spawner", &Capability::GameObject), Some(ObjectRef::GameObject(go)));
        assert_eq!(ctx.get_var_as("$spawner", &Capability::Asset), None);
        assert_eq!(ctx.get_var_as("$missing", &Capability::Asset), None);
        assert_eq!(ctx.vars().len(), 1);
    }

    #[test]
    fn dry_run_defers_declared_but_unbound_variables() {
        let dir = tempdir().expect("tempdir");
        let job = job(true);
        let mut host = Host::in_memory(dir.path());
        let guard = PathGuard::new(dir.path(), &["Assets/AutoGen".to_string()]);
        let mut log = JobLog::new("t1", false);
        let mut ctx = CommandContext::new(&job, &mut host, &guard, &mut log, "Assets/AutoGen");

        let args = json!({"target": {"ref": "$thing"}}).as_object().cloned().expect("map");
        let miss = ctx
            .expect_target(&args, "target", &Capability::GameObject)
            .expect_err("not declared yet");
        assert_eq!(miss.error_kind, Some(ErrorKind::ResolutionMiss));

        ctx.begin_command(0, "CreateThing");
        ctx.end_command(vec!["$thing".to_string()]);
        let deferred = ctx
            .expect_target(&args, "target", &Capability::GameObject)
            .expect("deferred");
        assert_eq!(deferred, TargetLookup::Deferred("$thing".to_string()));
        assert_eq!(deferred.found(), None);

        let missing = ctx
            .expect_target(&Map::new(), "target", &Capability::GameObject)
            .expect_err("missing arg");
        assert_eq!(missing.error_kind, Some(ErrorKind::CommandFailure));
    }
}
