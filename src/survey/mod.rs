//! Survey model: pages, participant intake, content loading and the
//! page-progression state machine.
//!
//! Pages progress linearly: Welcome → Instructions → training pairs →
//! generated pairs → Closing. Pair pages gate `advance` on a selection.

pub mod content;
pub mod page;
pub mod participant;
pub mod state;

pub use content::{RewriteSource, SurveyContent, TrainingRow};
pub use page::{Choice, Page, PageKind, PairContent, PairOrder};
pub use participant::{Group, Participant};
pub use state::{Advance, SelectionHistory, SurveyState};
