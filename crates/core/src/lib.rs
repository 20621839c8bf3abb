pub mod aws;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pptx;

pub use aws::{AwsCredentials, RequestSigner, SignedRequest, SigningError, SigningRequest};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::deck::{deck_file_name, Deck, Slide};
pub use domain::envelope::{ActionEvent, ActionResponse, Parameter};
pub use errors::{ApplicationError, InterfaceError};
pub use pptx::{DeckWriter, PptxError};
