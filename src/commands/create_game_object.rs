use super::{settle, Outcome, TransformArgs};
use crate::execution::args::{optional_bool_arg, optional_string_arg, required_string_arg};
use crate::execution::{CommandContext, CommandExecResult, JobCommand};
use crate::world::{GameObjectId, ObjectRef};
use serde_json::{Map, Value};

pub struct CreateGameObject;

impl JobCommand for CreateGameObject {
    fn name(&self) -> &str {
        "CreateGameObject"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(create(ctx, args))
    }
}

fn create(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let name = required_string_arg(args, "name")?;
    let parent_path = optional_string_arg(args, "parentPath")?;
    let ensure = optional_bool_arg(args, "ensure", false)?;
    let ensure_tag = optional_string_arg(args, "ensureTag")?;
    let transform = TransformArgs::parse(args)?;

    let under = parent_path
        .as_deref()
        .map(|parent| format!(" under {parent}"))
        .unwrap_or_default();
    let mode = if ensure { " (ensure mode)" } else { "" };
    ctx.log()
        .info(format!("Creating GameObject: {name}{under}{mode}"));

    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would create GameObject");
        return Ok(CommandExecResult::ok("DryRun: would create GameObject"));
    }

    if ensure {
        if let Some(existing) = find_existing(ctx, &name, parent_path.as_deref(), ensure_tag.as_deref()) {
            let described = ctx.describe(ObjectRef::GameObject(existing));
            ctx.log()
                .info(format!("[Ensure] Found existing {described}"));
            transform
                .apply(ctx.host_mut(), existing)
                .map_err(|err| CommandExecResult::failure(err.to_string()))?;
            return Ok(CommandExecResult::ok(format!("Reused existing {name}"))
                .with_output("go", ObjectRef::GameObject(existing)));
        }
    }

    let parent = match parent_path.as_deref() {
        Some(path) => Some(find_parent(ctx, path).ok_or_else(|| {
            CommandExecResult::resolution_miss(format!("Parent not found: {path}"))
        })?),
        None => None,
    };

    let host = ctx.host_mut();
    let go = host
        .scene
        .create_object(&name, parent)
        .map_err(|err| CommandExecResult::failure(format!("Failed to create GameObject: {err}")))?;
    if let Some(tag) = ensure_tag.as_deref() {
        host.scene
            .set_tag(go, tag)
            .map_err(|err| CommandExecResult::failure(err.to_string()))?;
    }
    transform
        .apply(host, go)
        .map_err(|err| CommandExecResult::failure(err.to_string()))?;

    let described = ctx.describe(ObjectRef::GameObject(go));
    ctx.log().info(format!("Created {described}"));
    Ok(CommandExecResult::ok(format!("Created {name}")).with_output("go", ObjectRef::GameObject(go)))
}

fn find_parent(ctx: &CommandContext<'_>, path: &str) -> Option<GameObjectId> {
    let scene = &ctx.host().scene;
    scene.find_by_path(path).or_else(|| scene.find_by_name(path))
}

fn find_existing(
    ctx: &CommandContext<'_>,
    name: &str,
    parent_path: Option<&str>,
    ensure_tag: Option<&str>,
) -> Option<GameObjectId> {
    let scene = &ctx.host().scene;
    if let Some(found) = ensure_tag.and_then(|tag| scene.find_by_tag(tag)) {
        return Some(found);
    }
    let full_path = match parent_path {
        Some(parent) => format!("{}/{name}", parent.trim_end_matches('/')),
        None => name.to_string(),
    };
    scene.find_by_path(&full_path)
}
