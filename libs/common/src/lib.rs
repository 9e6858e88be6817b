pub mod id;
pub mod team_code;

pub use id::PrefixedId;
