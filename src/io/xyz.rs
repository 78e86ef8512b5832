use std::io::BufRead;

use super::Structure;
use super::error::Error;

/// Upper bound on rows reserved from the header count.
const MAX_PREALLOCATED_ATOMS: usize = 4096;

/// Reads the first frame of an XYZ stream.
pub fn read<R: BufRead>(reader: R) -> Result<Structure, Error> {
    let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));

    let (count_no, count_line) = match lines.next() {
        Some((ln, line)) => (ln, line?),
        None => return Err(Error::parse(1, "empty input")),
    };
    let count = count_line
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::parse(count_no, "first line must be the atom count"))?;

    let comment = match lines.next() {
        Some((_, line)) => line?,
        None if count == 0 => String::new(),
        None => return Err(Error::parse(2, "missing comment line")),
    };

    let reserved = count.min(MAX_PREALLOCATED_ATOMS);
    let mut structure = Structure {
        comment: comment.trim().to_string(),
        symbols: Vec::with_capacity(reserved),
        positions: Vec::with_capacity(reserved),
    };

    let mut last_line = count_no + 1;
    while structure.len() < count {
        let Some((ln, line)) = lines.next() else {
            return Err(Error::parse(
                last_line + 1,
                format!("expected {count} atoms, found {}", structure.len()),
            ));
        };
        last_line = ln;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (symbol, position) = parse_atom(&line, ln)?;
        structure.symbols.push(symbol);
        structure.positions.push(position);
    }

    Ok(structure)
}

fn parse_atom(line: &str, line_no: usize) -> Result<(String, [f64; 3]), Error> {
    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(Error::parse(line_no, "atom line needs a symbol and three coordinates"));
    }
    let mut position = [0.0; 3];
    for (axis, token) in tokens[1..4].iter().enumerate() {
        position[axis] = token.parse::<f64>().map_err(|_| {
            Error::parse(line_no, format!("invalid {} coordinate '{token}'", ["x", "y", "z"][axis]))
        })?;
    }
    Ok((tokens[0].to_string(), position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_water() {
        let text = "3\nwater molecule\nO 0.0 0.0 0.117\nH 0.0 0.757 -0.467\nH 0.0 -0.757 -0.467\n";
        let structure = read(Cursor::new(text)).unwrap();
        assert_eq!(structure.comment, "water molecule");
        assert_eq!(structure.symbols, vec!["O", "H", "H"]);
        assert_eq!(structure.positions[1], [0.0, 0.757, -0.467]);
    }

    #[test]
    fn ignores_extra_columns_and_later_frames() {
        let text = "1\n\nAr 1 2 3 0.5\n1\nsecond\nAr 9 9 9\n";
        let structure = read(Cursor::new(text)).unwrap();
        assert_eq!(structure.len(), 1);
        assert_eq!(structure.positions[0], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn reports_line_of_bad_coordinate() {
        let text = "2\nc\nC 0 0 0\nC 0 x 0\n";
        match read(Cursor::new(text)) {
            Err(Error::Parse { line, details }) => {
                assert_eq!(line, 4);
                assert!(details.contains("y coordinate"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_and_malformed_headers() {
        assert!(read(Cursor::new("")).is_err());
        assert!(read(Cursor::new("two\n\n")).is_err());
        assert!(read(Cursor::new("3\nc\nC 0 0 0\n")).is_err());
        assert!(read(Cursor::new("1\nc\nC 0 0\n")).is_err());
    }

    #[test]
    fn oversized_count_fails_as_truncated() {
        let text = format!("{}\nhuge\nC 0 0 0\n", usize::MAX);
        match read(Cursor::new(text)) {
            Err(Error::Parse { line, details }) => {
                assert_eq!(line, 4);
                assert!(details.contains("found 1"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
