use chrono::NaiveDate;

/// Acquisition date encoded in an NSIDC raster file name, e.g. `N_20200101_concentration_v3.0.tif`.
///
/// The date is the first 8 characters of the second `_` separated field, as `YYYYMMDD`.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let field = name.split('_').nth(1)?;
    let digits = field.get(..8)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = digits[..4].parse().ok()?;
    let month = digits[4..6].parse().ok()?;
    let day = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Table keys for a date: 4 digit year, zero padded month and day.
pub fn date_keys(date: NaiveDate) -> (String, String, String) {
    (
        date.format("%Y").to_string(),
        date.format("%m").to_string(),
        date.format("%d").to_string(),
    )
}
