//! Comma-separated tables of sampled trajectories.

use std::fmt::Display;
use std::io::{self, Write};

use crate::compute::Trajectory;

/// Write the count table: a header of sample times, then one row per slot.
pub fn write_counts_csv<W: Write>(trajectory: &Trajectory, writer: &mut W) -> io::Result<()> {
    write_header(trajectory, writer)?;
    for slot in 0..trajectory.slots() {
        write_row(writer, trajectory.slot_counts(slot))?;
    }
    Ok(())
}

/// Write the trait table: a header of sample times, then one row per slot.
pub fn write_traits_csv<W: Write>(trajectory: &Trajectory, writer: &mut W) -> io::Result<()> {
    write_header(trajectory, writer)?;
    for slot in 0..trajectory.slots() {
        write_row(writer, trajectory.slot_traits(slot))?;
    }
    Ok(())
}

fn write_header<W: Write>(trajectory: &Trajectory, writer: &mut W) -> io::Result<()> {
    write_row(writer, trajectory.times())
}

fn write_row<W: Write, T: Display>(writer: &mut W, values: &[T]) -> io::Result<()> {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        write!(writer, "{}", value)?;
    }
    writer.write_all(b"\n")
}
