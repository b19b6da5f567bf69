//! CSV batch input and reservation output used by the command-line transport.

pub mod request_reader;
pub mod reservation_writer;
