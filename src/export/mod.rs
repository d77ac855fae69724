//! Persisting sampled trajectories to disk.
//!
//! Each replicate is written as three files sharing a label:
//!
//! ```text
//! {label}_poptraj.csv     counts, one row per slot
//! {label}_phenotraj.csv   traits, one row per slot
//! {label}_summary.json    run counters and final population statistics
//! ```
//!
//! The first row of both tables holds the sample times, so column `j` of
//! every later row is the slot's value at sample `j`.

mod replicate;
mod table;

pub use replicate::{ExportPaths, save_replicate};
pub use table::{write_counts_csv, write_traits_csv};
