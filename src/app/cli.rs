#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Init,
    InstallExtensions,
    ToggleRunner,
    ToggleVerbose,
    Status,
    Commands,
    ProcessNext,
    Run,
    Stop,
    ResetSettings,
    Submit,
    Check,
    Recover,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "init" => CliVerb::Init,
        "install-extensions" => CliVerb::InstallExtensions,
        "toggle-runner" => CliVerb::ToggleRunner,
        "toggle-verbose" => CliVerb::ToggleVerbose,
        "status" => CliVerb::Status,
        "commands" => CliVerb::Commands,
        "process-next" => CliVerb::ProcessNext,
        "run" => CliVerb::Run,
        "stop" => CliVerb::Stop,
        "reset-settings" => CliVerb::ResetSettings,
        "submit" => CliVerb::Submit,
        "check" => CliVerb::Check,
        "recover" => CliVerb::Recover,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: autogen-jobs [--project DIR] <command>".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  init                                 Create the job directories, settings and a sample job"
            .to_string(),
        "  install-extensions [--source DIR]    Copy agent skill files into .agent/skills".to_string(),
        "  toggle-runner                        Enable or disable the background runner".to_string(),
        "  toggle-verbose                       Enable or disable debug job logging".to_string(),
        "  status                               Show runner settings and queue depths".to_string(),
        "  commands                             List registered job commands".to_string(),
        "  process-next                         Process one job from the inbox".to_string(),
        "  run [--once]                         Poll the inbox until AutoGenJobs/runner.stop appears"
            .to_string(),
        "  stop                                 Ask a running poller to stop".to_string(),
        "  reset-settings                       Restore default runner settings".to_string(),
        "  submit <file>                        Copy a job file into the inbox".to_string(),
        "  check <jobId> [--wait SECS]          Print the result artifact for a job".to_string(),
        "  recover                              Sweep jobs orphaned in working/".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}
