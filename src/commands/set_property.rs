use super::{settle, Outcome};
use crate::execution::args::{optional_string_arg, required_string_arg};
use crate::execution::{CommandContext, CommandExecResult, JobCommand, TargetLookup};
use crate::world::{Capability, ObjectRef};
use serde_json::{Map, Value};

pub struct SetSerializedProperty;

impl JobCommand for SetSerializedProperty {
    fn name(&self) -> &str {
        "SetSerializedProperty"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(set_property(ctx, args))
    }
}

fn set_property(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let property_path = required_string_arg(args, "propertyPath")?;
    let component_type = optional_string_arg(args, "componentType")?;
    let value = args
        .get("value")
        .cloned()
        .ok_or_else(|| CommandExecResult::failure("Missing 'value' argument"))?;

    let object = match ctx.expect_any_target(args, "target")? {
        TargetLookup::Deferred(name) => {
            ctx.log()
                .info(format!("[DryRun] Would set {property_path} on {name}"));
            return Ok(CommandExecResult::ok("DryRun: would set property"));
        }
        TargetLookup::Found(object) => object,
    };

    let object = match object {
        ObjectRef::Asset(_) => object,
        _ => ctx
            .coerce(object, &Capability::Component(component_type.clone()))
            .ok_or_else(|| {
                CommandExecResult::resolution_miss(format!(
                    "No {} to receive {property_path}",
                    component_type.as_deref().unwrap_or("component")
                ))
            })?,
    };

    let described = ctx.describe(object);
    ctx.log()
        .info(format!("Setting {property_path} on {described}"));
    if ctx.is_dry_run() {
        return Ok(CommandExecResult::ok("DryRun: would set property"));
    }

    let host = ctx.host_mut();
    let applied = match object {
        ObjectRef::Asset(id) => host.assets.set_field(id, &property_path, value),
        ObjectRef::Component(id) => host.scene.set_component_field(id, &property_path, value),
        ObjectRef::GameObject(_) => {
            return Err(CommandExecResult::failure(format!(
                "{described} has no serialized properties"
            )))
        }
    };
    applied.map_err(|err| {
        CommandExecResult::failure(format!("Failed to set {property_path}: {err}"))
    })?;
    Ok(CommandExecResult::ok(format!("Set {property_path} on {described}")))
}
