//! JSON shapes exchanged with the REST and live APIs.
//!
//! These are passive records: field names follow the wire format, unknown
//! fields are ignored and missing fields take their default value.

mod account;
mod hub;
mod machines;
mod stats;
mod withdraw;

pub use account::*;
pub use hub::*;
pub use machines::*;
pub use stats::*;
pub use withdraw::*;
