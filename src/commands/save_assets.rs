use super::{settle, Outcome};
use crate::execution::args::optional_bool_arg;
use crate::execution::{CommandContext, CommandExecResult, JobCommand};
use serde_json::{Map, Value};

pub struct SaveAssets;

impl JobCommand for SaveAssets {
    fn name(&self) -> &str {
        "SaveAssets"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(save(ctx, args))
    }
}

fn save(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let refresh = optional_bool_arg(args, "refresh", false)?;
    ctx.log().info(format!("Saving assets (refresh={refresh})"));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would save assets");
        return Ok(CommandExecResult::ok("DryRun: would save assets"));
    }

    let dirty = ctx.host().assets.dirty_assets();
    let mut pending = Vec::with_capacity(dirty.len());
    for id in dirty {
        let Some(path) = ctx.host().assets.path_of(id) else {
            continue;
        };
        if !ctx.validate_write_path(&path) {
            return Err(CommandExecResult::policy_violation(format!(
                "Refusing to save asset outside the write roots: {path}"
            )));
        }
        pending.push(id);
    }

    for id in &pending {
        ctx.host_mut()
            .assets
            .save(*id)
            .map_err(|err| CommandExecResult::failure(format!("Failed to save asset: {err}")))?;
    }

    let scene_saved = if ctx.host().scene.is_dirty() {
        ctx.host_mut()
            .scene
            .save()
            .map_err(|err| CommandExecResult::failure(format!("Failed to save scene: {err}")))?
    } else {
        None
    };
    if let Some(path) = scene_saved {
        ctx.log().debug(format!("Scene written to {}", path.display()));
    }

    if refresh {
        let known = ctx.host().assets.asset_count();
        ctx.log().debug(format!("Asset database holds {known} assets"));
    }

    ctx.log().info("Assets saved");
    Ok(CommandExecResult::ok(format!(
        "Assets saved ({} written)",
        pending.len()
    )))
}
