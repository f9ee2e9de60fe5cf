use crate::flatten::FlatRecord;
use std::io::{self, Write};

fn needs_quotes(cell: &str) -> bool {
    cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }

        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Column order is the union of record keys in first-seen order; records
/// missing a column get an empty cell.
pub fn header(records: &[FlatRecord]) -> Vec<String> {
    let mut columns = Vec::new();
    for record in records {
        for (key, _) in record.iter() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    columns
}

pub fn write_records<W: Write>(w: &mut W, records: &[FlatRecord]) -> io::Result<()> {
    let columns = header(records);
    write_row(w, &columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match record.get(column) {
                Some(value) => value.to_string(),
                None => String::new(),
            })
            .collect();
        write_row(w, &row)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlatRecord;

    #[test]
    fn header_is_union_in_first_seen_order() {
        let mut a = FlatRecord::new();
        a.push_text("id", "1");
        a.push_int("down", 1);
        let mut b = FlatRecord::new();
        b.push_text("id", "2");
        b.push_text("play_desc", "kneel");

        assert_eq!(header(&[a, b]), vec!["id", "down", "play_desc"]);
    }

    #[test]
    fn missing_columns_are_empty_and_commas_are_quoted() {
        let mut a = FlatRecord::new();
        a.push_text("id", "1");
        a.push_text("play_desc", "T.Brady pass, TOUCHDOWN");
        let mut b = FlatRecord::new();
        b.push_text("id", "2");

        let mut out = Vec::new();
        write_records(&mut out, &[a, b]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "id,play_desc\n1,\"T.Brady pass, TOUCHDOWN\"\n2,\n");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut a = FlatRecord::new();
        a.push_text("play_desc", "called \"encroachment\"");

        let mut out = Vec::new();
        write_records(&mut out, &[a]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "play_desc\n\"called \"\"encroachment\"\"\"\n");
    }
}
