//! murmur-composer: mention and emoji autocomplete over an editable surface.
//!
//! A [`CompositionSession`] wires the pieces together:
//! - selection tracking and trigger detection around the caret word
//! - candidate lists and the popup that shows them
//! - committing mentions and emoji into the document
//! - emoji image transforms, live emoticon conversion and paste rewriting
//! - typing indicator and submit throttling

pub mod candidates;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod gate;
pub mod insertion;
pub mod popup;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod transform;
pub mod trigger;

pub use candidates::{Candidate, CandidateList, CandidateView, Direction, QueryTicket};
pub use config::{ComposerConfig, PasteStage};
pub use directory::{DirectoryEntry, DirectoryQuery, UserDirectory};
pub use error::{ComposerError, ConfigError, LookupError};
pub use events::ComposerEvent;
pub use gate::{GateTimer, SubmitGate, SubmitState, TypingGate};
pub use insertion::{MENTION_CLASS, mention_html};
pub use popup::{PopupController, PopupKind, PopupState, PopupTransition};
pub use scheduler::{Scheduler, TimerId};
pub use selection::{SelectionTracker, caret_word};
pub use session::CompositionSession;
pub use transform::{AsciiConverter, EMOJI_DATA_ATTR, EMOJI_IMG_CLASS, EmojiRenderer};
pub use trigger::{Trigger, TriggerDetector};
