use std::io;

use deckhand_chat::{ChatRunner, HttpAgentGateway, NoopAgentGateway};
use deckhand_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

/// Runs the terminal chat loop. Without configured agent identifiers the
/// loop still starts, backed by the no-op gateway, so the command is usable
/// offline.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("chat", "config", error.to_string(), 1),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("chat", "runtime", error.to_string(), 1),
    };

    let outcome = runtime.block_on(async {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        match HttpAgentGateway::from_config(&config.aws, &config.agent) {
            Ok(gateway) => ChatRunner::new(gateway).run(stdin.lock(), &mut stdout).await,
            Err(_) => ChatRunner::new(NoopAgentGateway).run(stdin.lock(), &mut stdout).await,
        }
    });

    match outcome {
        Ok(()) => CommandResult::success("chat", "session closed"),
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), 1),
    }
}
