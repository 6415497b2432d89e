//! One-shot migration of the legacy toolkit's Berkeley-style key/value
//! dumps into a relational schema: staged per-table imports, a
//! consolidation pass that reconciles the two diary key-format eras, and a
//! drop-and-recreate pipeline driver.

pub mod config;
pub mod consolidate;
pub mod db;
pub mod import;
pub mod pipeline;
pub mod source;
