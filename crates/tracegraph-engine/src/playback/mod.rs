pub mod channel;
pub mod scheduler;

pub use channel::{ActiveLink, StepEvent, StepTimer, TraceChannel};
pub use scheduler::{PlaybackEvent, PlaybackScheduler, MAX_STEPS_PER_ADVANCE};
