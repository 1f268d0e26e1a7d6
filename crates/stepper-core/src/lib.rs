pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod gating;
pub mod io;
pub mod paths;
pub mod persistence;
pub mod progress;
pub mod registry;
pub mod state;
pub mod types;

pub use controller::{ActiveStep, ControllerOptions, Navigation, SaveOutcome, WizardController};
pub use error::{Result, StepperError};
pub use form::{FormSet, StepForm};
pub use gating::{Decision, DenyReason};
pub use persistence::{FileAdapter, MemoryAdapter, PersistenceAdapter};
pub use progress::{ProgressStore, StepProgress};
pub use registry::StepRegistry;
pub use state::{WizardSnapshot, WizardState};
pub use types::{Section, Step};
