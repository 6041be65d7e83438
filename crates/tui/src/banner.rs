//! Block-letter wordmark for the landing screen.

const ROWS: usize = 5;

/// Render `text` as five rows of block glyphs. Characters without a glyph
/// render as blanks so the rows stay aligned.
pub fn render(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); ROWS];
    for (index, ch) in text.chars().enumerate() {
        let glyph = glyph(ch);
        for (row, line) in rows.iter_mut().enumerate() {
            if index > 0 {
                line.push(' ');
            }
            line.push_str(glyph[row]);
        }
    }
    rows
}

fn glyph(ch: char) -> [&'static str; ROWS] {
    match ch.to_ascii_uppercase() {
        'A' => [" ██ ", "█  █", "████", "█  █", "█  █"],
        'H' => ["█  █", "█  █", "████", "█  █", "█  █"],
        'I' => ["███", " █ ", " █ ", " █ ", "███"],
        'K' => ["█  █", "█ █ ", "██  ", "█ █ ", "█  █"],
        'R' => ["███ ", "█  █", "███ ", "█ █ ", "█  █"],
        'S' => [" ███", "█   ", " ██ ", "   █", "███ "],
        ' ' => ["  ", "  ", "  ", "  ", "  "],
        _ => ["    ", "    ", "    ", "    ", "    "],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stay_aligned() {
        let rendered = render("KRISHI");
        assert_eq!(rendered.len(), ROWS);
        let width = rendered[0].chars().count();
        for row in &rendered {
            assert_eq!(row.chars().count(), width);
        }
    }

    #[test]
    fn unknown_characters_render_blank() {
        let rendered = render("?");
        assert!(rendered.iter().all(|row| row.trim().is_empty()));
    }
}
