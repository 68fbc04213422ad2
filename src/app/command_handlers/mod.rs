use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::{split_global_args, Workspace};

pub mod jobs;
pub mod runner;
pub mod workspace;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let (project, args) = split_global_args(args)?;
    if args.is_empty() {
        return Ok(help_text());
    }

    let verb = parse_cli_verb(args[0].as_str());
    match verb {
        CliVerb::Help => return Ok(help_text()),
        CliVerb::Unknown => return Err(format!("unknown command `{}`", args[0])),
        _ => {}
    }

    let ws = Workspace::resolve(project.as_deref())?;
    let rest = &args[1..];
    match verb {
        CliVerb::Init => workspace::cmd_init(&ws),
        CliVerb::InstallExtensions => workspace::cmd_install_extensions(&ws, rest),
        CliVerb::ToggleRunner => workspace::cmd_toggle_runner(&ws),
        CliVerb::ToggleVerbose => workspace::cmd_toggle_verbose(&ws),
        CliVerb::ResetSettings => workspace::cmd_reset_settings(&ws),
        CliVerb::Status => runner::cmd_status(&ws),
        CliVerb::Commands => runner::cmd_commands(),
        CliVerb::ProcessNext => runner::cmd_process_next(&ws),
        CliVerb::Run => runner::cmd_run(&ws, rest),
        CliVerb::Stop => runner::cmd_stop(&ws),
        CliVerb::Recover => runner::cmd_recover(&ws),
        CliVerb::Submit => jobs::cmd_submit(&ws, rest),
        CliVerb::Check => jobs::cmd_check(&ws, rest),
        CliVerb::Help | CliVerb::Unknown => Ok(help_text()),
    }
}
