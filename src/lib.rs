pub mod billing;
pub mod config;
pub mod error;
pub mod link;
pub mod registry;
pub mod session;

// Re-export commonly used items
pub use billing::{calculate_bill, current_tier, RateSchedule, Tier};
pub use config::Config;
pub use error::{AppError, Result};
pub use link::{ConnectionState, LinkEvent, TelemetryLink, TelemetryReading};
pub use registry::{DeviceRecord, DeviceRegistry};
pub use session::EnergySession;
