pub mod hub;
pub mod trigger;

pub use crate::domain::model::{EventData, TriggerType};
pub use crate::domain::ports::{Backend, EventTrigger, TriggerConfig};
pub use crate::utils::error::Result;
