use super::{settle, Outcome};
use crate::execution::args::{optional_string_arg, optional_vec3_arg, required_string_arg};
use crate::execution::{CommandContext, CommandExecResult, CommandRegistry, ErrorKind, JobCommand};
use crate::queue::CommandInvocation;
use crate::world::{AssetId, GameObjectId, MemoryScene, ObjectRef, PrefabNode, PREFAB_TYPE};
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

pub const PREFAB_ROOT_VAR: &str = "$prefabRoot";

pub struct CreateOrEditPrefab;

pub struct InstantiatePrefabInScene;

impl JobCommand for CreateOrEditPrefab {
    fn name(&self) -> &str {
        "CreateOrEditPrefab"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(create_or_edit(ctx, args))
    }
}

impl JobCommand for InstantiatePrefabInScene {
    fn name(&self) -> &str {
        "InstantiatePrefabInScene"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(instantiate(ctx, args))
    }
}

fn create_or_edit(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let prefab_path = required_string_arg(args, "prefabPath")?;
    let prefab_path = ctx.check_write_path(&prefab_path)?;
    let root_name = match optional_string_arg(args, "rootName")? {
        Some(name) => name,
        None => Path::new(&prefab_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Prefab")
            .to_string(),
    };
    let edits = parse_edits(args)?;

    ctx.log()
        .info(format!("Creating/editing prefab: {prefab_path}"));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would create/edit prefab");
        return Ok(CommandExecResult::ok("DryRun: would create/edit prefab"));
    }

    let (contents, is_new) = match ctx.host_mut().assets.load_by_path(&prefab_path) {
        Some(existing) => (load_prefab(ctx, existing)?, false),
        None => {
            ctx.log()
                .debug(format!("Creating new prefab with root: {root_name}"));
            (PrefabNode::empty(&root_name), true)
        }
    };

    let mut staging = MemoryScene::new();
    let root = contents
        .instantiate(&mut staging, None)
        .map_err(|err| CommandExecResult::failure(format!("Failed to load/create prefab: {err}")))?;
    let edited = edit_contents(ctx, staging, root, &edits)?;

    let fields = edited
        .to_fields()
        .map_err(|err| CommandExecResult::failure(err.to_string()))?;
    let assets = &mut ctx.host_mut().assets;
    let id = assets
        .create(&prefab_path, PREFAB_TYPE, fields, true)
        .map_err(|err| CommandExecResult::failure(format!("Failed to save prefab: {err}")))?;
    assets
        .save(id)
        .map_err(|err| CommandExecResult::failure(format!("Failed to save prefab: {err}")))?;

    ctx.log().info(format!("Saved prefab: {prefab_path}"));
    let message = if is_new {
        format!("Created prefab {prefab_path}")
    } else {
        format!("Edited prefab {prefab_path}")
    };
    Ok(CommandExecResult::ok(message).with_output("prefab", ObjectRef::Asset(id)))
}

fn parse_edits(args: &Map<String, Value>) -> Result<Vec<CommandInvocation>, CommandExecResult> {
    match args.get("edits") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<CommandInvocation>(item.clone())
                    .ok()
                    .filter(|edit| !edit.cmd.trim().is_empty())
                    .ok_or_else(|| {
                        CommandExecResult::failure(format!(
                            "Argument 'edits[{index}]' must be an object with a 'cmd'"
                        ))
                    })
            })
            .collect(),
        Some(other) => Err(CommandExecResult::failure(format!(
            "Argument 'edits' must be an array, got `{other}`"
        ))),
    }
}

fn load_prefab(ctx: &mut CommandContext<'_>, id: AssetId) -> Result<PrefabNode, CommandExecResult> {
    let assets = &ctx.host().assets;
    let type_name = assets.type_of(id).unwrap_or_default();
    if type_name != PREFAB_TYPE {
        return Err(CommandExecResult::failure(format!(
            "{} is a {type_name}, not a {PREFAB_TYPE}",
            ctx.describe(ObjectRef::Asset(id))
        )));
    }
    let fields = assets.fields_of(id).unwrap_or_default();
    PrefabNode::from_fields(&fields).map_err(|err| CommandExecResult::failure(err.to_string()))
}

// Nested edits run against the prefab contents; outer host state is restored afterwards.
fn edit_contents(
    ctx: &mut CommandContext<'_>,
    staging: MemoryScene,
    root: GameObjectId,
    edits: &[CommandInvocation],
) -> Result<PrefabNode, CommandExecResult> {
    if edits.is_empty() {
        return PrefabNode::capture(&staging, root)
            .map_err(|err| CommandExecResult::failure(err.to_string()));
    }
    let registry = ctx
        .registry()
        .ok_or_else(|| CommandExecResult::failure("Nested edits need a command registry"))?;

    ctx.log()
        .debug(format!("Executing {} nested edits", edits.len()));
    let outer_scene = std::mem::replace(&mut ctx.host_mut().scene, Box::new(staging));
    let outer_selection = ctx.host().selection.clone();
    let outer_pinged = ctx.host().pinged.len();
    let scoped = ctx.vars().clone();
    let outer_vars = ctx.swap_vars(scoped);
    ctx.set_var(PREFAB_ROOT_VAR, ObjectRef::GameObject(root));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_edits(ctx, registry, edits)));

    let staging = std::mem::replace(&mut ctx.host_mut().scene, outer_scene);
    ctx.swap_vars(outer_vars);
    let host = ctx.host_mut();
    host.selection = outer_selection;
    host.pinged.truncate(outer_pinged);

    match outcome {
        Ok(Ok(())) => PrefabNode::capture(&*staging, root)
            .map_err(|err| CommandExecResult::failure(err.to_string())),
        Ok(Err(failure)) => Err(failure),
        Err(_) => Err(CommandExecResult::failure("Nested edit panicked")),
    }
}

fn run_edits(
    ctx: &mut CommandContext<'_>,
    registry: &CommandRegistry,
    edits: &[CommandInvocation],
) -> Result<(), CommandExecResult> {
    for edit in edits {
        let Some(command) = registry.lookup(&edit.cmd) else {
            ctx.log()
                .warn(format!("Unknown nested command: {}", edit.cmd));
            continue;
        };
        ctx.log().debug(format!("Executing nested: {}", edit.cmd));
        let result = command.execute(ctx, &edit.args);
        if !result.success {
            return Err(CommandExecResult::fail(
                result.error_kind.unwrap_or(ErrorKind::CommandFailure),
                format!("Nested command {} failed: {}", edit.cmd, result.message),
            ));
        }
        for (logical, variable) in &edit.out {
            if let Some(object) = result.output(logical) {
                ctx.set_var(variable, object);
            }
        }
    }
    Ok(())
}

fn instantiate(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let prefab_guid = optional_string_arg(args, "prefabGuid")?;
    let prefab_path = optional_string_arg(args, "prefabPath")?;
    if prefab_guid.is_none() && prefab_path.is_none() {
        return Err(CommandExecResult::failure(
            "Missing 'prefabGuid' or 'prefabPath' argument",
        ));
    }
    let parent_path = optional_string_arg(args, "parentPath")?;
    let name_override = optional_string_arg(args, "nameOverride")?;
    let position = optional_vec3_arg(args, "position")?;
    let wanted = prefab_path
        .clone()
        .or_else(|| prefab_guid.clone())
        .unwrap_or_default();

    let assets = &mut ctx.host_mut().assets;
    let found = prefab_guid
        .as_deref()
        .and_then(|guid| assets.load_by_guid(guid))
        .or_else(|| prefab_path.as_deref().and_then(|path| assets.load_by_path(path)));
    let Some(id) = found else {
        if ctx.is_dry_run() {
            ctx.log().info(format!(
                "[DryRun] Prefab {wanted} does not exist yet; would instantiate it"
            ));
            return Ok(CommandExecResult::ok("DryRun: would instantiate prefab"));
        }
        return Err(CommandExecResult::resolution_miss(format!(
            "Prefab not found: {wanted}"
        )));
    };
    let mut contents = load_prefab(ctx, id)?;

    let under = parent_path
        .as_deref()
        .map(|parent| format!(" under {parent}"))
        .unwrap_or_default();
    let renamed = name_override
        .as_deref()
        .map(|name| format!(" as {name}"))
        .unwrap_or_default();
    ctx.log()
        .info(format!("Instantiating prefab: {}{under}{renamed}", contents.name));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would instantiate prefab");
        return Ok(CommandExecResult::ok("DryRun: would instantiate prefab"));
    }

    let parent = match parent_path.as_deref() {
        Some(path) => {
            let scene = &ctx.host().scene;
            let parent = scene.find_by_path(path).or_else(|| scene.find_by_name(path));
            if parent.is_none() {
                ctx.log()
                    .warn(format!("Parent not found: {path}, instantiating at root"));
            }
            parent
        }
        None => None,
    };

    if let Some(name) = name_override {
        contents.name = name;
    }
    if let Some(position) = position {
        contents.transform.position = position;
    }
    let scene = &mut *ctx.host_mut().scene;
    let instance = contents
        .instantiate(scene, parent)
        .map_err(|err| CommandExecResult::failure(format!("Failed to instantiate prefab: {err}")))?;

    let described = ctx.describe(ObjectRef::GameObject(instance));
    ctx.log().info(format!("Instantiated {described} in scene"));
    Ok(CommandExecResult::ok(format!("Instantiated {}", contents.name))
        .with_output("instance", ObjectRef::GameObject(instance)))
}
