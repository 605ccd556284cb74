use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

pub const RESERVATION_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses a reservation time given either as a unix timestamp or as a local
/// date in the `YYYY-MM-DD HH:MM` format.
pub fn parse_reservation(value: &str) -> anyhow::Result<i64> {
    if let Ok(timestamp) = value.trim().parse::<i64>() {
        return Ok(timestamp);
    }
    let datetime = NaiveDateTime::parse_from_str(value.trim(), RESERVATION_FORMAT).map_err(|_| {
        anyhow::anyhow!("Invalid reservation '{value}', expected a unix timestamp or 'YYYY-MM-DD HH:MM'")
    })?;
    Local
        .from_local_datetime(&datetime)
        .single()
        .map(|datetime| datetime.timestamp())
        .ok_or_else(|| anyhow::anyhow!("Reservation '{value}' is ambiguous in the local time zone"))
}

/// Formats a unix timestamp as a local date.
pub fn format_reservation(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(datetime) => datetime
            .with_timezone(&Local)
            .format(RESERVATION_FORMAT)
            .to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp() {
        assert_eq!(parse_reservation("1700000000").unwrap(), 1_700_000_000);
    }

    #[test]
    fn parse_local_date_round_trip() {
        let timestamp = parse_reservation("2030-05-17 14:30").unwrap();
        assert_eq!(format_reservation(timestamp), "2030-05-17 14:30");
    }

    #[test]
    fn parse_invalid_date() {
        assert!(parse_reservation("tomorrow").is_err());
        assert!(parse_reservation("2030-13-01 10:00").is_err());
    }
}
