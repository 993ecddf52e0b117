pub mod date;
pub mod id;

pub use date::parse_iso_date;
pub use id::generate_key;
