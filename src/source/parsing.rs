use super::{SourceError, TleLines};

fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn is_element_line(line: &str, number: char) -> bool {
    let mut chars = line.chars();
    chars.next() == Some(number) && chars.next() == Some(' ')
}

/// Parses a single element set given as two lines, or three with a name line.
pub fn parse_tle_block(tle: &str) -> Result<TleLines, SourceError> {
    let lines = content_lines(tle);

    match lines.as_slice() {
        [line1, line2] => Ok(TleLines::new(None, line1, line2)),
        [name, line1, line2] => Ok(TleLines::new(Some(name.to_string()), line1, line2)),
        _ => Err(SourceError::Format(format!(
            "expected 2 or 3 lines, found {}",
            lines.len()
        ))),
    }
}

/// Splits content holding any number of element sets, named or not. Lines
/// that do not belong to a recognizable set are skipped.
pub fn parse_multi_tle(content: &str) -> Vec<TleLines> {
    let lines = content_lines(content);
    let mut sets = Vec::new();
    let mut rest = lines.as_slice();

    loop {
        rest = match rest {
            [line1, line2, tail @ ..]
                if is_element_line(line1, '1') && is_element_line(line2, '2') =>
            {
                sets.push(TleLines::new(None, line1, line2));
                tail
            }
            [name, line1, line2, tail @ ..]
                if is_element_line(line1, '1') && is_element_line(line2, '2') =>
            {
                sets.push(TleLines::new(Some(name.to_string()), line1, line2));
                tail
            }
            [_, tail @ ..] => tail,
            [] => break,
        };
    }

    sets
}
