use crate::errors::AppError;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Vec<String>),
    Left,
    History,
    ClearRecent,
    ClearAll,
    Ask(String),
    Help,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Left => "left",
            Command::History => "history",
            Command::ClearRecent | Command::ClearAll => "clear",
            Command::Ask(_) => "q",
            Command::Help => "help",
        }
    }

    /// Parses `content` if it starts with `prefix` and names a known command.
    ///
    /// `None` means the message is not for us. `Some(Err(Validation))`
    /// carries a usage hint for a known command with bad arguments.
    pub fn parse(content: &str, prefix: &str) -> Option<Result<Command, AppError>> {
        let body = content.trim_start().strip_prefix(prefix)?;
        let (name, args) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body.trim_end(), ""),
        };

        let parsed = match name {
            "add" => parse_add(args, prefix),
            "left" => Ok(Command::Left),
            "history" => Ok(Command::History),
            "clear" => match args.split_whitespace().next() {
                Some("r") => Ok(Command::ClearRecent),
                _ => Ok(Command::ClearAll),
            },
            "q" if args.is_empty() => Err(AppError::Validation(format!(
                "Please ask a question, e.g. `{prefix}q What are good sources of protein?`"
            ))),
            "q" => Ok(Command::Ask(args.to_string())),
            "help" => Ok(Command::Help),
            _ => return None,
        };
        Some(parsed)
    }
}

fn parse_add(args: &str, prefix: &str) -> Result<Command, AppError> {
    let items: Vec<String> = args
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() {
        return Err(AppError::Validation(format!(
            "Please tell me what you ate, e.g. `{prefix}add 2 eggs, toast`"
        )));
    }
    Ok(Command::Add(items))
}

pub fn help_text(prefix: &str) -> String {
    format!(
        "**Commands:**\n\
         `{prefix}add <food>, <food>, ...` log food and estimate calories/protein\n\
         `{prefix}left` calories and protein left for today\n\
         `{prefix}history` today's food log\n\
         `{prefix}clear r` remove the most recent entry\n\
         `{prefix}clear` clear everything for today\n\
         `{prefix}q <question>` ask a nutrition question"
    )
}
