// Database models
//
// - config_entry.rs: one row of the key/value configuration table

mod config_entry;

pub use config_entry::ConfigEntry;
