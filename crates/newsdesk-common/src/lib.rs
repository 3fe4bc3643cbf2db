pub mod fs;
pub mod interp;

pub use crate::fs::{read_json, Profile};
pub use crate::interp::{format_number, Doc};
