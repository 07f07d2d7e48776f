//! Library components of the `cde-mapper` command-line tool.

pub mod logging;
pub mod pipeline;
