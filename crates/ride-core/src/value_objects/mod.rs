//! Value objects - immutable types that represent domain concepts

mod capabilities;
mod roles;
mod snowflake;

pub use capabilities::{RideCapabilities, SystemCapabilities};
pub use roles::{ClubRole, SystemRole};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError, MAX_WORKER_ID};
