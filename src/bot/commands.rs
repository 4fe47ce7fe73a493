//! Bot commands and `/keyword@bot args` parsing.

use teloxide::types::BotCommand;

/// Commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Welcome text
    Start,
    /// Same as `Start`
    Help,
    /// Forward a question to the LLM
    Ask,
    /// Show the payment QR code
    Unlock,
    /// Redeem a transaction ID
    Verify,
    /// Download the paid file
    Getfile,
}

impl Command {
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::Help,
        Self::Ask,
        Self::Unlock,
        Self::Verify,
        Self::Getfile,
    ];

    /// Keyword without the leading slash
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Ask => "ask",
            Self::Unlock => "unlock",
            Self::Verify => "verify",
            Self::Getfile => "getfile",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Start the bot",
            Self::Help => "Show available commands",
            Self::Ask => "Ask the AI a question",
            Self::Unlock => "Get the payment QR code",
            Self::Verify => "Verify your payment: /verify <transaction_id>",
            Self::Getfile => "Download the notes after verification",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.keyword().eq_ignore_ascii_case(keyword))
    }

    /// Splits `text` into a command and its trimmed argument string.
    ///
    /// Returns `None` for plain text, unknown keywords, and commands addressed
    /// to a different bot (`/start@other_bot`). When `bot_username` is unknown
    /// any `@mention` is accepted.
    #[must_use]
    pub fn parse<'a>(text: &'a str, bot_username: Option<&str>) -> Option<(Self, &'a str)> {
        let rest = text.strip_prefix('/')?;
        let (word, args) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));

        let keyword = match word.split_once('@') {
            Some((keyword, mention)) => {
                if let Some(username) = bot_username {
                    if !username.trim_start_matches('@').eq_ignore_ascii_case(mention) {
                        return None;
                    }
                }
                keyword
            }
            None => word,
        };

        Self::from_keyword(keyword).map(|cmd| (cmd, args.trim()))
    }

    /// Command list registered with Telegram for the client-side menu
    #[must_use]
    pub fn menu() -> Vec<BotCommand> {
        Self::ALL
            .into_iter()
            .map(|cmd| BotCommand::new(cmd.keyword(), cmd.description()))
            .collect()
    }
}
