pub mod clock;
pub mod digest;
pub mod health;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{DigestScheduler, DigestService, DigestSettings, TickReport};
pub use health::HealthService;
