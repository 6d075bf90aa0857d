use crate::telegram::Update;

/// Commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Summary,
    Now,
}

pub const HELP_TEXT: &str = "Perp DEX monitor bot is running.\n\n\
Commands:\n\
/summary - fetch and send the latest report\n\
/now - same as /summary\n\n\
Reports are also pushed on a schedule.";

impl BotCommand {
    /// `/summary`, `/summary@my_bot` and `/summary extra args` all parse.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" | "help" => Some(BotCommand::Start),
            "summary" => Some(BotCommand::Summary),
            "now" => Some(BotCommand::Now),
            _ => None,
        }
    }

    /// Whether answering requires running an aggregation pass.
    pub fn needs_report(&self) -> bool {
        matches!(self, BotCommand::Summary | BotCommand::Now)
    }
}

/// Command carried by `update`, if it came from `allowed_chat`.
pub fn command_from_update(update: &Update, allowed_chat: i64) -> Option<BotCommand> {
    let msg = update.message.as_ref()?;
    if msg.chat.id != allowed_chat {
        return None;
    }
    BotCommand::parse(msg.text.as_deref()?)
}
