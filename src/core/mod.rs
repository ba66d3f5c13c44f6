//! Core modules for DigiManifest

pub mod clock;
pub mod quota;
pub mod validator;
pub mod synthesizer;
pub mod daily_code;
pub mod repository;
pub mod social;
pub mod json_store;
pub mod orchestrator;
pub mod api;

pub use clock::{Clock, SystemClock, ManualClock};
pub use quota::{QuotaPolicy, QuotaTracker, ReservedSlot};
pub use validator::SettingsValidator;
pub use synthesizer::{EventSynthesizer, SENDERS, BANKS};
pub use daily_code::{code_of_day, daily_index};
pub use repository::{Repository, InMemoryRepository, UserRecord, HISTORY_CAPACITY, STORY_CAPACITY};
pub use json_store::JsonFileRepository;
pub use orchestrator::ManifestationOrchestrator;
pub use api::{create_router, run_server};
