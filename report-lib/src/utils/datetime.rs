use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

pub fn utc_timestamp() -> String {
    return chrono::Utc::now().to_rfc3339();
}

/// Render an Excel serial date (1900 date system) the way it reads in the sheet.
///
/// Midnight values are shown as a plain date.
pub fn excel_serial_to_string(serial: f64) -> Option<String> {
    let datetime = excel_serial_to_datetime(serial)?;
    if datetime.num_seconds_from_midnight() == 0 {
        Some(datetime.date().format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let excel_base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - days as f64) * 86400.0).round() as i64;
    excel_base.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial_date_only() {
        assert_eq!(excel_serial_to_string(45000.0).as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn test_excel_serial_with_time() {
        assert_eq!(
            excel_serial_to_string(45000.5).as_deref(),
            Some("2023-03-15 12:00:00")
        );
    }

    #[test]
    fn test_excel_serial_rejects_negative() {
        assert_eq!(excel_serial_to_string(-1.0), None);
        assert_eq!(excel_serial_to_string(f64::NAN), None);
    }
}
