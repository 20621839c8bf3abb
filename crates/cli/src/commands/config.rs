use deckhand_core::config::{AppConfig, LoadOptions, LogFormat};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (precedence: overrides > env > file > default):".to_string()];
    lines.push(render_line("aws.region", &config.aws.region));
    lines.push(render_line("aws.access_key_id", &redact(&config.aws.access_key_id)));
    lines.push(render_line(
        "aws.secret_access_key",
        &redact(config.aws.secret_access_key.expose_secret()),
    ));
    lines.push(render_line("storage.bucket", &display_or_unset(&config.storage.bucket)));
    lines.push(render_line(
        "storage.presign_expiry_secs",
        &config.storage.presign_expiry_secs.to_string(),
    ));
    lines.push(render_line("notify.topic_arn", &display_or_unset(&config.notify.topic_arn)));
    lines.push(render_line("notify.subject", &config.notify.subject));
    lines.push(render_line("search.endpoint", &config.search.endpoint));
    lines.push(render_line("search.region", &config.search.region));
    lines.push(render_line("search.max_results", &config.search.max_results.to_string()));
    lines.push(render_line("agent.agent_id", &display_or_unset(&config.agent.agent_id)));
    lines.push(render_line(
        "agent.agent_alias_id",
        &display_or_unset(&config.agent.agent_alias_id),
    ));
    lines.push(render_line("logging.level", &config.logging.level));
    lines.push(render_line("logging.format", format_name(config.logging.format)));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

fn display_or_unset(value: &str) -> String {
    if value.is_empty() { "(unset)".to_string() } else { value.to_string() }
}

fn format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        return "(unset)".to_string();
    }
    if value.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &value[..4])
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn secrets_keep_only_a_short_prefix() {
        assert_eq!(redact("AKIDEXAMPLE"), "AKID****");
        assert_eq!(redact("key"), "****");
        assert_eq!(redact(""), "(unset)");
    }
}
