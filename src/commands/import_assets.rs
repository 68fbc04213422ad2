use super::{settle, Outcome};
use crate::execution::args::optional_bool_arg;
use crate::execution::{CommandContext, CommandExecResult, JobCommand};
use serde_json::{Map, Value};

pub struct ImportAssets;

impl JobCommand for ImportAssets {
    fn name(&self) -> &str {
        "ImportAssets"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(import(ctx, args))
    }
}

fn import(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let force = optional_bool_arg(args, "force", false)?;
    let raw_paths = match args.get("paths") {
        Some(Value::String(single)) => vec![single.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    CommandExecResult::failure(format!("Argument 'paths' must contain strings, got `{item}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CommandExecResult::failure("Missing 'paths' argument")),
    };

    let mut paths = Vec::with_capacity(raw_paths.len());
    for path in raw_paths {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            ctx.log().warn("Skipping empty path");
            continue;
        }
        paths.push(trimmed.to_string());
    }

    if let Some(outside) = paths.iter().find(|path| !ctx.guard().is_under_assets(path)) {
        return Err(CommandExecResult::policy_violation(format!(
            "Path not under Assets/: {outside}"
        )));
    }

    ctx.log()
        .info(format!("Importing {} assets (force={force})", paths.len()));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would import assets");
        return Ok(CommandExecResult::ok("DryRun: would import assets"));
    }

    for path in &paths {
        ctx.log().debug(format!("Importing: {path}"));
        ctx.host_mut()
            .assets
            .import(path, force)
            .map_err(|err| CommandExecResult::failure(format!("Failed to import {path}: {err}")))?;
    }
    Ok(CommandExecResult::ok(format!("Imported {} assets", paths.len())))
}
