#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Run,
    Stop,
    Status,
    Show,
    Open(Option<String>),
    Save,
    Export(Option<String>),
    Reset,
    ForceReset,
    Models,
    Quit,
    ForceQuit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|rest| !rest.is_empty())),
        None => (trimmed, None),
    };
    let argument = argument.map(str::to_string);

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/run" => SlashCommand::Run,
        "/stop" => SlashCommand::Stop,
        "/status" => SlashCommand::Status,
        "/show" => SlashCommand::Show,
        "/open" => SlashCommand::Open(argument),
        "/save" => SlashCommand::Save,
        "/export" => SlashCommand::Export(argument),
        "/reset" => SlashCommand::Reset,
        "/reset!" => SlashCommand::ForceReset,
        "/models" => SlashCommand::Models,
        "/quit" => SlashCommand::Quit,
        "/quit!" => SlashCommand::ForceQuit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
