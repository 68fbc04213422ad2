use super::{settle, Outcome};
use crate::execution::args::{optional_bool_arg, required_string_arg};
use crate::execution::{CommandContext, CommandExecResult, JobCommand};
use crate::world::ObjectRef;
use serde_json::{Map, Value};

pub struct CreateScriptableObject;

impl JobCommand for CreateScriptableObject {
    fn name(&self) -> &str {
        "CreateScriptableObject"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult {
        settle(create(ctx, args))
    }
}

fn create(ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> Outcome {
    let type_name = required_string_arg(args, "type")?;
    let asset_path = required_string_arg(args, "assetPath")?;
    let overwrite = optional_bool_arg(args, "overwrite", false)?;
    let init = match args.get("init") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(init)) => init.clone(),
        Some(other) => {
            return Err(CommandExecResult::failure(format!(
                "Argument 'init' must be an object, got `{other}`"
            )))
        }
    };

    let asset_path = ctx.check_write_path(&asset_path)?;
    ctx.log()
        .info(format!("Creating ScriptableObject: {type_name} at {asset_path}"));
    if ctx.is_dry_run() {
        ctx.log().info("[DryRun] Would create ScriptableObject");
        return Ok(CommandExecResult::ok("DryRun: would create ScriptableObject"));
    }

    if !overwrite {
        if let Some(existing) = ctx.host_mut().assets.load_by_path(&asset_path) {
            ctx.log().warn(format!(
                "Asset already exists at {asset_path}, returning existing"
            ));
            return Ok(CommandExecResult::ok("Asset already exists")
                .with_output("asset", ObjectRef::Asset(existing)));
        }
    }

    let id = ctx
        .host_mut()
        .assets
        .create(&asset_path, &type_name, Map::new(), overwrite)
        .map_err(|err| CommandExecResult::failure(format!("Failed to create {type_name}: {err}")))?;

    for (property, value) in init {
        if let Err(err) = ctx.host_mut().assets.set_field(id, &property, value) {
            ctx.log()
                .warn(format!("Failed to set property {property}: {err}"));
        }
    }

    ctx.log()
        .info(format!("Created ScriptableObject at {asset_path}"));
    Ok(CommandExecResult::ok(format!("Created {type_name}"))
        .with_output("asset", ObjectRef::Asset(id)))
}
