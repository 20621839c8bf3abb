use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Title used for a content block that carries no text at all, e.g. the empty
/// block produced by a run of three or more consecutive blank lines.
pub const FALLBACK_SLIDE_TITLE: &str = "Details";

pub const DECK_EXTENSION: &str = "pptx";

/// One content slide: a heading plus zero or more body lines in render order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub body: Vec<String>,
}

impl Slide {
    /// Builds a slide from one blank-line-delimited block of the source text.
    ///
    /// The first line becomes the title and every remaining line one body
    /// line, each independently stripped of its leading bullet marker. An
    /// empty block falls back to a placeholder title instead of indexing
    /// into an empty line list.
    fn from_block(block: &str) -> Self {
        if block.is_empty() {
            return Self { title: FALLBACK_SLIDE_TITLE.to_string(), body: Vec::new() };
        }

        let mut lines = block.split('\n').map(strip_bullet);
        let title = lines.next().unwrap_or_default();
        Self { title, body: lines.collect() }
    }

    pub fn body_text(&self) -> String {
        self.body.join("\n")
    }
}

/// The full artifact produced from one request: a title slide (topic and
/// generation date) followed by one content slide per source block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub topic: String,
    pub generated_on: NaiveDate,
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Parses free-form content into a deck. Total over any string input:
    /// empty or missing topic/content still produce a well-formed deck.
    ///
    /// The generation date is injected by the caller so the builder stays a
    /// pure function of its arguments.
    pub fn build(topic: &str, content: &str, generated_on: NaiveDate) -> Self {
        Self { topic: topic.to_string(), generated_on, slides: parse_blocks(content) }
    }

    /// Subtitle rendered on the title slide.
    pub fn subtitle(&self) -> String {
        format!("Created: {}", self.generated_on.format("%Y-%m-%d"))
    }

    /// Storage key and download file name derived from the topic. Identical
    /// topics collide and overwrite the prior artifact; accepted behavior.
    pub fn file_name(&self) -> String {
        deck_file_name(&self.topic)
    }
}

pub fn deck_file_name(topic: &str) -> String {
    format!("{}.{DECK_EXTENSION}", topic.replace(' ', "_"))
}

/// Splits trimmed content on the literal blank-line separator into one slide
/// per block. Splitting is purely syntactic: three or more consecutive blank
/// lines yield one or more empty blocks, each producing a fallback slide.
pub fn parse_blocks(content: &str) -> Vec<Slide> {
    content.trim().split("\n\n").map(Slide::from_block).collect()
}

fn strip_bullet(line: &str) -> String {
    line.trim_start_matches(['-', ' ']).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{deck_file_name, parse_blocks, Deck, FALLBACK_SLIDE_TITLE};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
    }

    #[test]
    fn single_block_yields_one_slide_with_title_and_body() {
        let slides = parse_blocks("A\nB");

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "A");
        assert_eq!(slides[0].body, vec!["B".to_string()]);
    }

    #[test]
    fn bullet_markers_are_stripped_from_every_line_independently() {
        let slides = parse_blocks("- A\n- B\n\n- C\n- D");

        assert_eq!(slides.len(), 2);
        assert_eq!((slides[0].title.as_str(), slides[0].body_text()), ("A", "B".to_string()));
        assert_eq!((slides[1].title.as_str(), slides[1].body_text()), ("C", "D".to_string()));
    }

    #[test]
    fn run_of_blank_lines_produces_an_extra_empty_block() {
        let slides = parse_blocks("first\n\n\n\nsecond");

        assert_eq!(slides.len(), 3);
        assert_eq!(slides[0].title, "first");
        assert_eq!(slides[1].title, FALLBACK_SLIDE_TITLE);
        assert!(slides[1].body.is_empty());
        assert_eq!(slides[2].title, "second");
    }

    #[test]
    fn empty_content_yields_exactly_one_fallback_slide() {
        let deck = Deck::build("T", "", date());

        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.slides[0].title, FALLBACK_SLIDE_TITLE);
        assert!(deck.slides[0].body.is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_before_splitting() {
        let slides = parse_blocks("\n\n  intro\nline\n\noutro\n\n");

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].title, "intro");
        assert_eq!(slides[1].title, "outro");
    }

    #[test]
    fn leading_dash_and_space_run_is_stripped_like_the_marker() {
        let slides = parse_blocks("-- heading\n - point");

        assert_eq!(slides[0].title, "heading");
        assert_eq!(slides[0].body, vec!["point".to_string()]);
    }

    #[test]
    fn slide_order_follows_block_order() {
        let deck = Deck::build("T", "one\n\ntwo\n\nthree", date());

        let titles: Vec<&str> = deck.slides.iter().map(|slide| slide.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[test]
    fn subtitle_carries_the_generation_date() {
        let deck = Deck::build("T", "A", date());

        assert_eq!(deck.subtitle(), "Created: 2025-03-14");
    }

    #[test]
    fn file_name_replaces_spaces_and_appends_extension() {
        assert_eq!(deck_file_name("quarterly sales review"), "quarterly_sales_review.pptx");
        assert_eq!(deck_file_name("solo"), "solo.pptx");
        assert_eq!(deck_file_name(""), ".pptx");
    }

    #[test]
    fn identical_topics_derive_identical_file_names() {
        let first = Deck::build("weekly report", "A", date());
        let second = Deck::build("weekly report", "B\n\nC", date());

        assert_eq!(first.file_name(), second.file_name());
    }
}
