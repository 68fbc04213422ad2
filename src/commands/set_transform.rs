use super::{settle, Outcome, TransformArgs};
use crate::execution::{CommandContext, CommandExecResult, JobCommand, TargetLookup};
use crate::world::{Capability, ObjectRef};
use serde_json::{Map, Value};

pub struct SetTransform;

impl JobCommand for SetTransform {
    fn name(&self) -> &str {
        "SetTransform"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(set(ctx, args))
    }
}

fn set(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let transform = TransformArgs::parse(args)?;
    if transform.is_empty() {
        return Err(CommandExecResult::failure(
            "SetTransform needs at least one of 'position', 'rotation' or 'scale'",
        ));
    }
    let go = match ctx.expect_target(args, "target", &Capability::GameObject)? {
        TargetLookup::Deferred(_) => {
            return Ok(CommandExecResult::ok("DryRun: would set transform"));
        }
        TargetLookup::Found(ObjectRef::GameObject(go)) => go,
        TargetLookup::Found(other) => {
            return Err(CommandExecResult::failure(format!(
                "Target is not a GameObject: {}",
                ctx.describe(other)
            )))
        }
    };

    let described = ctx.describe(ObjectRef::GameObject(go));
    ctx.log().info(format!("Setting transform on {described}"));
    if ctx.is_dry_run() {
        return Ok(CommandExecResult::ok("DryRun: would set transform"));
    }

    transform
        .apply(ctx.host_mut(), go)
        .map_err(|err| CommandExecResult::failure(err.to_string()))?;
    Ok(CommandExecResult::ok(format!("Updated transform of {described}"))
        .with_output("go", ObjectRef::GameObject(go)))
}
