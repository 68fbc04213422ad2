use super::{settle, Outcome};
use crate::execution::{CommandContext, CommandExecResult, JobCommand, TargetLookup};
use serde_json::{Map, Value};

pub struct PingObject;

pub struct SelectObject;

impl JobCommand for PingObject {
    fn name(&self) -> &str {
        "PingObject"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(highlight(ctx, args, false))
    }
}

impl JobCommand for SelectObject {
    fn name(&self) -> &str {
        "SelectObject"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(highlight(ctx, args, true))
    }
}

fn highlight(ctx: &mut CommandContext<'_>, args: &Map<String, Value>, select: bool) -> Outcome {
    let verb = if select { "select" } else { "ping" };
    let object = match ctx.expect_any_target(args, "target")? {
        TargetLookup::Deferred(_) => {
            return Ok(CommandExecResult::ok(format!("DryRun: would {verb} object")));
        }
        TargetLookup::Found(object) => object,
    };

    let described = ctx.describe(object);
    ctx.log().info(if select {
        format!("Selecting object: {described}")
    } else {
        format!("Pinging object: {described}")
    });
    if ctx.is_dry_run() {
        return Ok(CommandExecResult::ok(format!("DryRun: would {verb} object")));
    }

    let host = ctx.host_mut();
    if select {
        host.selection = vec![object];
        Ok(CommandExecResult::ok(format!("Selected {described}")))
    } else {
        host.pinged.push(object);
        Ok(CommandExecResult::ok(format!("Pinged {described}")))
    }
}
