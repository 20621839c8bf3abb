use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use deckhand_core::{Deck, DeckWriter};

use super::CommandResult;

/// Builds a deck entirely locally: no storage, no links, just the parser
/// and the PPTX writer against a file on disk.
pub fn run(topic: &str, content_file: &Path, out: Option<&Path>) -> CommandResult {
    let content = match fs::read_to_string(content_file) {
        Ok(content) => content,
        Err(error) => {
            return CommandResult::failure(
                "deck",
                "read_content",
                format!("could not read `{}`: {error}", content_file.display()),
                1,
            )
        }
    };

    let deck = Deck::build(topic, &content, Utc::now().date_naive());
    let bytes = match DeckWriter::write(&deck) {
        Ok(bytes) => bytes,
        Err(error) => return CommandResult::failure("deck", "serialize", error.to_string(), 1),
    };

    let out_path: PathBuf =
        out.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(deck.file_name()));
    if let Err(error) = fs::write(&out_path, &bytes) {
        return CommandResult::failure(
            "deck",
            "write_artifact",
            format!("could not write `{}`: {error}", out_path.display()),
            1,
        );
    }

    CommandResult::success(
        "deck",
        format!(
            "wrote {} slides to `{}` ({} bytes)",
            deck.slides.len() + 1,
            out_path.display(),
            bytes.len()
        ),
    )
}
