/// Character cursor over Molang source. Returns `'\0'` once the input runs out,
/// which every caller treats as end-of-input.
pub struct Reader<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars().collect(), pos: 0 }
    }

    pub fn source(&self) -> &'a str { self.source }

    pub fn position(&self) -> usize { self.pos }

    pub fn is_at_end(&self) -> bool { self.pos >= self.chars.len() }

    // ─── Primitives ──────────────────────────────────────────────────────────

    pub fn read(&mut self) -> char {
        match self.chars.get(self.pos) {
            Some(&c) => { self.pos += 1; c }
            None => '\0',
        }
    }

    pub fn peek(&self) -> char {
        self.peek_at(0)
    }

    pub fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    pub fn back(&mut self) {
        if self.pos > 0 { self.pos -= 1; }
    }

    pub fn advance_by(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    /// ASCII case-insensitive lookahead for `literal`. Never consumes.
    pub fn is(&self, literal: &str) -> bool {
        if self.is_at_end() { return false; }
        let mut offset = 0;
        for expected in literal.chars() {
            match self.chars.get(self.pos + offset) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        true
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.get(self.pos) {
            if !c.is_whitespace() { break; }
            self.pos += 1;
        }
    }

    // ─── Slicing / diagnostics ───────────────────────────────────────────────

    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// 1-based line and column for a char offset.
    pub fn line_column(&self, pos: usize) -> (usize, usize) {
        let mut line = 1;
        let mut column = 1;
        for &c in self.chars.iter().take(pos) {
            if c == '\n' { line += 1; column = 1; } else { column += 1; }
        }
        (line, column)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_past_end_yields_nul() {
        let mut r = Reader::new("ab");
        assert_eq!(r.read(), 'a');
        assert_eq!(r.read(), 'b');
        assert_eq!(r.read(), '\0');
        assert_eq!(r.peek(), '\0');
        assert!(r.is_at_end());
    }

    #[test]
    fn back_at_start_is_noop() {
        let mut r = Reader::new("x");
        r.back();
        assert_eq!(r.position(), 0);
        r.read();
        r.back();
        assert_eq!(r.peek(), 'x');
    }

    #[test]
    fn is_matches_case_insensitively() {
        let r = Reader::new("TRUE;");
        assert!(r.is("true"));
        assert!(r.is("TrUe;"));
        assert!(!r.is("true)"));
    }

    #[test]
    fn is_fails_on_short_input() {
        let r = Reader::new("ret");
        assert!(!r.is("return"));
        assert!(!Reader::new("").is(""));
    }

    #[test]
    fn peek_at_looks_ahead() {
        let r = Reader::new("abc");
        assert_eq!(r.peek_at(2), 'c');
        assert_eq!(r.peek_at(3), '\0');
    }

    #[test]
    fn skip_whitespace_handles_newlines() {
        let mut r = Reader::new("  \n\t x");
        r.skip_whitespace();
        assert_eq!(r.peek(), 'x');
    }

    #[test]
    fn line_column_tracks_newlines() {
        let r = Reader::new("a\nbc\nd");
        assert_eq!(r.line_column(0), (1, 1));
        assert_eq!(r.line_column(3), (2, 2));
        assert_eq!(r.line_column(5), (3, 1));
    }
}
