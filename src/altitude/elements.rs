use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::error::AltitudeError;

/// Width of a two-line element set line, checksum included.
pub const TLE_LINE_LENGTH: usize = 69;

const MICROSECONDS_PER_DAY: f64 = 86_400_000_000.0;

/// Orbital elements parsed from a two-line element set.
///
/// The raw lines are kept alongside the decoded fields so the SGP4 backend can
/// consume them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    pub catalog_id: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch: DateTime<Utc>,
    /// Epoch exactly as written in columns 19-32 of line 1.
    pub epoch_text: String,
    /// First derivative of mean motion, rev/day^2.
    pub mean_motion_dot: f64,
    /// B* drag term, 1/earth radii.
    pub drag_term: f64,
    pub inclination_deg: f64,
    pub right_ascension_deg: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Mean motion, rev/day.
    pub mean_motion: f64,
    pub revolution_number: u32,
    pub(crate) line1: String,
    pub(crate) line2: String,
}

impl OrbitalElements {
    /// Validates and decodes element lines 1 and 2.
    pub fn from_tle(line1: &str, line2: &str) -> Result<Self, AltitudeError> {
        let line1 = check_line(line1, '1')?;
        let line2 = check_line(line2, '2')?;

        let catalog_id: u32 = parse_field(line1, 1, 3, 7, "catalog number")?;
        let catalog_id_2: u32 = parse_field(line2, 2, 3, 7, "catalog number")?;
        if catalog_id != catalog_id_2 {
            return Err(malformed(format!(
                "catalog number mismatch between lines ({} vs {})",
                catalog_id, catalog_id_2
            )));
        }

        let epoch_text = column(line1, 19, 32).trim().to_string();
        let epoch = parse_epoch(column(line1, 19, 32))?;

        let elements = OrbitalElements {
            catalog_id,
            classification: line1.as_bytes()[7] as char,
            international_designator: column(line1, 10, 17).trim().to_string(),
            epoch,
            epoch_text,
            mean_motion_dot: parse_field(line1, 1, 34, 43, "mean motion derivative")?,
            drag_term: parse_exponent_field(line1, 1, 54, 61, "drag term")?,
            inclination_deg: parse_field(line2, 2, 9, 16, "inclination")?,
            right_ascension_deg: parse_field(line2, 2, 18, 25, "right ascension")?,
            eccentricity: parse_assumed_decimal(line2, 2, 27, 33, "eccentricity")?,
            argument_of_perigee_deg: parse_field(line2, 2, 35, 42, "argument of perigee")?,
            mean_anomaly_deg: parse_field(line2, 2, 44, 51, "mean anomaly")?,
            mean_motion: parse_field(line2, 2, 53, 63, "mean motion")?,
            revolution_number: parse_field(line2, 2, 64, 68, "revolution number")?,
            line1: line1.to_string(),
            line2: line2.to_string(),
        };

        // Anything the SGP4 backend would refuse is rejected here as well.
        elements.sgp4_elements()?;

        Ok(elements)
    }

    pub(crate) fn sgp4_elements(&self) -> Result<sgp4::Elements, AltitudeError> {
        sgp4::Elements::from_tle(None, self.line1.as_bytes(), self.line2.as_bytes())
            .map_err(|e| malformed(e.to_string()))
    }
}

fn malformed(message: String) -> AltitudeError {
    AltitudeError::MalformedElementSet(message)
}

fn check_line(line: &str, number: char) -> Result<&str, AltitudeError> {
    let line = line.trim_end();
    if !line.is_ascii() {
        return Err(malformed(format!("line {} contains non-ASCII characters", number)));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(malformed(format!(
            "line {} has {} characters, expected {}",
            number,
            line.len(),
            TLE_LINE_LENGTH
        )));
    }
    if !line.starts_with(number) {
        return Err(malformed(format!("line {} must start with '{}'", number, number)));
    }

    let expected = checksum(&line[..TLE_LINE_LENGTH - 1]);
    let found = line.as_bytes()[TLE_LINE_LENGTH - 1];
    if !found.is_ascii_digit() || found - b'0' != expected {
        return Err(malformed(format!(
            "line {} checksum mismatch (expected {}, found '{}')",
            number, expected, found as char
        )));
    }

    Ok(line)
}

/// Modulo-10 sum of digits, with each minus sign counting as one.
pub fn checksum(body: &str) -> u8 {
    let sum: u32 = body
        .bytes()
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Columns are 1-based and inclusive, as in the published format.
fn column(line: &str, first: usize, last: usize) -> &str {
    &line[first - 1..last]
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    number: u8,
    first: usize,
    last: usize,
    name: &str,
) -> Result<T, AltitudeError> {
    let raw = column(line, first, last).trim();
    raw.parse().map_err(|_| {
        malformed(format!(
            "line {} columns {}-{}: invalid {} '{}'",
            number, first, last, name, raw
        ))
    })
}

/// Fields like eccentricity carry an implied leading "0.".
fn parse_assumed_decimal(
    line: &str,
    number: u8,
    first: usize,
    last: usize,
    name: &str,
) -> Result<f64, AltitudeError> {
    let raw = column(line, first, last).trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(format!(
            "line {} columns {}-{}: invalid {} '{}'",
            number, first, last, name, raw
        )));
    }
    format!("0.{}", raw)
        .parse()
        .map_err(|_| malformed(format!("line {}: invalid {}", number, name)))
}

/// Fields like B* are written as a signed mantissa with an implied leading
/// decimal point followed by a signed power of ten: " 12345-3" is 0.12345e-3.
fn parse_exponent_field(
    line: &str,
    number: u8,
    first: usize,
    last: usize,
    name: &str,
) -> Result<f64, AltitudeError> {
    let raw = column(line, first, last).trim();
    let invalid = || {
        malformed(format!(
            "line {} columns {}-{}: invalid {} '{}'",
            number, first, last, name, raw
        ))
    };

    let split = raw.rfind(['+', '-']).filter(|&i| i > 0).ok_or_else(invalid)?;
    let (mantissa, exponent) = raw.split_at(split);
    let (sign, digits) = match mantissa.as_bytes().first() {
        Some(b'-') => (-1.0, &mantissa[1..]),
        Some(b'+') => (1.0, &mantissa[1..]),
        _ => (1.0, mantissa),
    };
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let mantissa: f64 = format!("0.{}", digits).parse().map_err(|_| invalid())?;
    let exponent: i32 = exponent.parse().map_err(|_| invalid())?;

    Ok(sign * mantissa * 10f64.powi(exponent))
}

/// Decodes "YYDDD.DDDDDDDD" into an absolute instant.
fn parse_epoch(field: &str) -> Result<DateTime<Utc>, AltitudeError> {
    let field = field.trim();
    let invalid = || malformed(format!("invalid epoch '{}'", field));

    if field.len() < 3 || !field.as_bytes()[..2].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let two_digit: i32 = field[..2].parse().map_err(|_| invalid())?;
    let year = if two_digit < 57 {
        2000 + two_digit
    } else {
        1900 + two_digit
    };

    let day_text = &field[2..];
    if !day_text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(invalid());
    }
    let day_of_year: f64 = day_text.parse().map_err(|_| invalid())?;

    let jan_first = NaiveDate::from_yo_opt(year, 1).ok_or_else(invalid)?;
    let days_in_year = if NaiveDate::from_yo_opt(year, 366).is_some() {
        366.0
    } else {
        365.0
    };
    if !(1.0..days_in_year + 1.0).contains(&day_of_year) {
        return Err(invalid());
    }

    let offset = Duration::microseconds(((day_of_year - 1.0) * MICROSECONDS_PER_DAY).round() as i64);
    let midnight = jan_first.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();

    Ok(midnight + offset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    pub const ISS_2008_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    pub const ISS_2008_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    /// Near-circular ~420 km orbit with epoch 2024-01-01T12:00:00Z.
    pub const LEO_LINE1: &str =
        "1 25544U 98067A   24001.50000000  .00001000  00000-0  20000-4 0  9999";
    pub const LEO_LINE2: &str =
        "2 25544  51.6400 200.0000 0006000  50.0000 310.0000 15.50000000100018";

    #[test]
    fn parses_reference_element_set() {
        let el = OrbitalElements::from_tle(ISS_2008_LINE1, ISS_2008_LINE2).unwrap();
        assert_eq!(el.catalog_id, 25544);
        assert_eq!(el.classification, 'U');
        assert_eq!(el.international_designator, "98067A");
        assert_eq!(el.epoch_text, "08264.51782528");
        assert!((el.inclination_deg - 51.6416).abs() < 1e-9);
        assert!((el.right_ascension_deg - 247.4627).abs() < 1e-9);
        assert!((el.eccentricity - 0.0006703).abs() < 1e-12);
        assert!((el.mean_motion - 15.72125391).abs() < 1e-9);
        assert!((el.drag_term + 0.11606e-4).abs() < 1e-15);
        assert!((el.mean_motion_dot + 0.00002182).abs() < 1e-15);
        assert_eq!(el.revolution_number, 56353);
    }

    #[test]
    fn decodes_epoch() {
        let el = OrbitalElements::from_tle(ISS_2008_LINE1, ISS_2008_LINE2).unwrap();
        assert_eq!(
            el.epoch.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2008-09-20T12:25:40"
        );
        assert_eq!(el.epoch.nanosecond() / 1_000_000, 104);

        let leo = OrbitalElements::from_tle(LEO_LINE1, LEO_LINE2).unwrap();
        assert_eq!(leo.epoch, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn accepts_trailing_whitespace() {
        let l1 = format!("{}\r", LEO_LINE1);
        let l2 = format!("{}  ", LEO_LINE2);
        assert!(OrbitalElements::from_tle(&l1, &l2).is_ok());
    }

    #[test]
    fn epoch_century_pivot() {
        let epoch = parse_epoch("57001.00000000").unwrap();
        assert_eq!(epoch.year(), 1957);
        let epoch = parse_epoch("56001.00000000").unwrap();
        assert_eq!(epoch.year(), 2056);
    }

    #[test]
    fn rejects_out_of_range_day() {
        assert!(parse_epoch("23366.00000000").is_err());
        assert!(parse_epoch("24366.50000000").is_ok());
        assert!(parse_epoch("24000.50000000").is_err());
    }

    fn assert_malformed(line1: &str, line2: &str) {
        match OrbitalElements::from_tle(line1, line2) {
            Err(AltitudeError::MalformedElementSet(_)) => {}
            other => panic!("expected MalformedElementSet, got {:?}", other),
        }
    }

    #[test]
    fn rejects_short_lines() {
        assert_malformed(&ISS_2008_LINE1[..60], ISS_2008_LINE2);
        assert_malformed(ISS_2008_LINE1, &ISS_2008_LINE2[..68]);
        assert_malformed("", "");
    }

    #[test]
    fn rejects_swapped_lines() {
        assert_malformed(ISS_2008_LINE2, ISS_2008_LINE1);
    }

    #[test]
    fn rejects_non_numeric_epoch() {
        let mut line1 = ISS_2008_LINE1.to_string();
        line1.replace_range(20..24, "AB.C");
        // Keep the checksum honest so the epoch is what fails.
        let body = &line1[..68];
        let line1 = format!("{}{}", body, checksum(body));
        match OrbitalElements::from_tle(&line1, ISS_2008_LINE2) {
            Err(AltitudeError::MalformedElementSet(msg)) => assert!(msg.contains("epoch")),
            other => panic!("expected epoch failure, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_checksum() {
        let line1 = format!("{}0", &ISS_2008_LINE1[..68]);
        assert_malformed(&line1, ISS_2008_LINE2);
    }

    #[test]
    fn rejects_catalog_mismatch() {
        let body = ISS_2008_LINE2[..68].replacen("25544", "25545", 1);
        let line2 = format!("{}{}", body, checksum(&body));
        assert_malformed(ISS_2008_LINE1, &line2);
    }

    #[test]
    fn checksum_matches_published_lines() {
        assert_eq!(checksum(&ISS_2008_LINE1[..68]), 7);
        assert_eq!(checksum(&LEO_LINE2[..68]), 8);
    }

    #[test]
    fn exponent_field_notation() {
        let line = format!("{:>8}", "-11606-4");
        assert!((parse_exponent_field(&line, 1, 1, 8, "x").unwrap() + 0.11606e-4).abs() < 1e-15);
        let line = format!("{:>8}", "00000-0");
        assert_eq!(parse_exponent_field(&line, 1, 1, 8, "x").unwrap(), 0.0);
        let line = format!("{:>8}", "00000+0");
        assert_eq!(parse_exponent_field(&line, 1, 1, 8, "x").unwrap(), 0.0);
        assert!(parse_exponent_field("  abcde-4", 1, 1, 9, "x").is_err());
    }
}
