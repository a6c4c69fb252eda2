use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rate of Perceived Exertion, a self-reported intensity from 1 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rpe(u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("RPE must be an integer between 1 and 10, got {0}")]
pub struct InvalidRpe(pub i64);

impl Rpe {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, InvalidRpe> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidRpe(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rpe {
    type Error = InvalidRpe;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rpe> for u8 {
    fn from(rpe: Rpe) -> Self {
        rpe.0
    }
}

impl ToSql for Rpe {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.0)))
    }
}

impl FromSql for Rpe {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Rpe::new(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpe_accepts_scale_bounds() {
        assert_eq!(Rpe::new(1).unwrap().value(), 1);
        assert_eq!(Rpe::new(10).unwrap().value(), 10);
    }

    #[test]
    fn test_rpe_rejects_out_of_range() {
        assert_eq!(Rpe::new(0), Err(InvalidRpe(0)));
        assert_eq!(Rpe::new(11), Err(InvalidRpe(11)));
        assert_eq!(Rpe::new(-3), Err(InvalidRpe(-3)));
    }

    #[test]
    fn test_rpe_deserialize_validates() {
        let rpe: Rpe = serde_json::from_str("7").unwrap();
        assert_eq!(rpe.value(), 7);
        assert!(serde_json::from_str::<Rpe>("12").is_err());
        assert!(serde_json::from_str::<Rpe>("7.5").is_err());
    }

    #[test]
    fn test_rpe_serializes_as_number() {
        let rpe = Rpe::new(8).unwrap();
        assert_eq!(serde_json::to_string(&rpe).unwrap(), "8");
    }
}
