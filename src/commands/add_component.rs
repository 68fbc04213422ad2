use super::{settle, Outcome};
use crate::execution::args::{optional_bool_arg, required_string_arg};
use crate::execution::{CommandContext, CommandExecResult, JobCommand, TargetLookup};
use crate::world::{Capability, ObjectRef};
use serde_json::{Map, Value};

pub struct AddComponent;

impl JobCommand for AddComponent {
    fn name(&self) -> &str {
        "AddComponent"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(add(ctx, args))
    }
}

fn add(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let type_name = required_string_arg(args, "type")?;
    let if_missing = optional_bool_arg(args, "ifMissing", true)?;
    let lookup = ctx.expect_target(args, "target", &Capability::GameObject)?;

    let go = match lookup {
        TargetLookup::Deferred(name) => {
            ctx.log()
                .info(format!("[DryRun] Would add {type_name} to {name}"));
            return Ok(CommandExecResult::ok("DryRun: would add component"));
        }
        TargetLookup::Found(ObjectRef::GameObject(go)) => go,
        TargetLookup::Found(other) => {
            return Err(CommandExecResult::failure(format!(
                "Target is not a GameObject or Component: {}",
                ctx.describe(other)
            )))
        }
    };

    let described = ctx.describe(ObjectRef::GameObject(go));
    ctx.log().info(format!("Adding {type_name} to {described}"));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would add component");
        return Ok(CommandExecResult::ok("DryRun: would add component"));
    }

    if if_missing {
        if let Some(existing) = ctx.host().scene.component_of(go, Some(type_name.as_str())) {
            ctx.log()
                .info(format!("{type_name} already present on {described}"));
            return Ok(
                CommandExecResult::ok(format!("{type_name} already exists on {described}"))
                    .with_output("component", ObjectRef::Component(existing)),
            );
        }
    }

    let component = ctx
        .host_mut()
        .scene
        .add_component(go, &type_name)
        .map_err(|err| CommandExecResult::failure(format!("Failed to add {type_name}: {err}")))?;
    Ok(CommandExecResult::ok(format!("Added {type_name} to {described}"))
        .with_output("component", ObjectRef::Component(component)))
}
