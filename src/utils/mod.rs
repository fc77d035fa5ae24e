pub mod datetime;
pub mod feedback;
pub mod format;
pub mod logging;
pub mod validation;
