use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::config::ResolvedBot;
use crate::error::ValidationError;

fn bot_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"bot\d+$").expect("static regex is valid"))
}

/// Validate a resolved cluster batch. The first violation rejects the whole batch.
///
/// Checks, in order, for every bot: required fields are non-empty, `git_url`
/// has an HTTP(S) scheme, `bot_number` ends in `bot<digits>`, and no two bots
/// share that suffix.
pub fn validate_clusters(bots: &[ResolvedBot]) -> Result<(), ValidationError> {
    let mut seen_suffixes = HashSet::new();

    for bot in bots {
        if let Err(e) = validate_one(bot, &mut seen_suffixes) {
            error!("❌ {}", e);
            return Err(e);
        }
    }

    info!("✅ Configuration validation successful ({} bots)", bots.len());
    Ok(())
}

fn validate_one(bot: &ResolvedBot, seen: &mut HashSet<String>) -> Result<(), ValidationError> {
    // bot_number carries the prefix, so only the part after it can be empty
    let bot_number_value = bot.bot_number.rsplit(' ').next().unwrap_or_default();
    let required = [
        ("bot_number", bot_number_value),
        ("git_url", bot.git_url.as_str()),
        ("branch", bot.branch.as_str()),
        ("run_command", bot.run_command.as_str()),
    ];
    if let Some(&(field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ValidationError::MissingField {
            name: bot.name.clone(),
            field,
        });
    }

    if !(bot.git_url.starts_with("http://") || bot.git_url.starts_with("https://")) {
        return Err(ValidationError::InvalidGitUrl {
            name: bot.name.clone(),
            url: bot.git_url.clone(),
        });
    }

    let suffix = match bot_suffix_pattern().find(&bot.bot_number) {
        Some(m) => m.as_str().to_string(),
        None => {
            return Err(ValidationError::InvalidBotNumber {
                name: bot.name.clone(),
                bot_number: bot.bot_number.clone(),
            })
        }
    };

    if !seen.insert(suffix.clone()) {
        return Err(ValidationError::DuplicateSuffix {
            suffix,
            bot_number: bot.bot_number.clone(),
        });
    }

    Ok(())
}
