use rusqlite::Row;

/// Maps a result row selected with `SELECT *` (or matching aliases) into a model.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}
