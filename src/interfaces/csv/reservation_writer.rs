use crate::domain::reservation::Reservation;
use crate::error::Result;
use std::io::Write;

/// Column names written before any record, so an empty listing still has a header.
pub const HEADER: [&str; 8] = [
    "id",
    "item_id",
    "user_id",
    "item_type",
    "status",
    "expires_at",
    "created_at",
    "updated_at",
];

/// Writes reservations as CSV, one row per reservation.
pub struct ReservationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReservationWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    /// Writes the header followed by every reservation, then flushes.
    pub fn write_reservations<I>(&mut self, reservations: I) -> Result<()>
    where
        I: IntoIterator<Item = Reservation>,
    {
        self.writer.write_record(HEADER)?;
        for reservation in reservations {
            self.writer.serialize(reservation)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
