// Text normalization
//
// Strips comments, blanks string literals and collapses whitespace so the
// extractors can match declarations with simple patterns. Comments carrying
// a preserved marker survive on a line of their own.

use super::syntax::Syntax;

/// Comment markers read by the activity extractor
pub const ACTIVITY_MARKERS: &[&str] = &["@Activity", "@User", "@System"];

/// Comment markers read by the use case extractor
pub const USE_CASE_MARKERS: &[&str] = &["@Actor", "@Route"];

/// Normalization switches
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Comments containing any of these tags are kept
    pub preserve_markers: &'static [&'static str],
    /// Keep line structure and indentation
    pub keep_newlines: bool,
    /// Keep string literal contents
    pub keep_strings: bool,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preserve(mut self, markers: &'static [&'static str]) -> Self {
        self.preserve_markers = markers;
        self
    }

    pub fn keep_newlines(mut self) -> Self {
        self.keep_newlines = true;
        self
    }

    pub fn keep_strings(mut self) -> Self {
        self.keep_strings = true;
        self
    }

    fn has_marker(&self, text: &str) -> bool {
        self.preserve_markers.iter().any(|m| text.contains(m))
    }
}

/// Normalize source text for pattern matching.
///
/// Total on any input: unterminated comments and strings consume the rest of
/// the text. Languages without braces always keep their line structure.
pub fn normalize(text: &str, syntax: &Syntax, options: &NormalizeOptions) -> String {
    let chars: Vec<char> = text.chars().collect();
    let keep_lines = options.keep_newlines || !syntax.language.is_brace_based();
    let mut out = Writer::new(keep_lines);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if syntax.block_comments && c == '/' && chars.get(i + 1) == Some(&'*') {
            let stop = find_seq(&chars, i + 2, &['*', '/']).map_or(chars.len(), |e| e + 2);
            let comment: String = chars[i..stop].iter().collect();
            if options.has_marker(&comment) {
                for line in comment.lines().filter(|l| options.has_marker(l)) {
                    out.marker(&format!("// {}", clean_block_line(line)), true);
                }
            } else {
                out.push(' ');
            }
            i = stop;
            continue;
        }

        if is_line_comment(&chars, i, syntax) {
            let stop = chars[i..]
                .iter()
                .position(|&ch| ch == '\n')
                .map_or(chars.len(), |p| i + p);
            let comment: String = chars[i..stop].iter().collect();
            if options.has_marker(&comment) {
                out.marker(comment.trim(), false);
            }
            i = stop;
            continue;
        }

        if syntax.quotes.contains(&c) {
            let triple = !syntax.language.is_brace_based()
                && chars.get(i + 1) == Some(&c)
                && chars.get(i + 2) == Some(&c);
            let stop = scan_string(&chars, i, c, triple);
            let literal: String = chars[i..stop].iter().collect();
            if options.keep_strings || options.has_marker(&literal) {
                out.raw(&literal);
            } else {
                let width = if triple { 3 } else { 1 };
                for _ in 0..width * 2 {
                    out.raw_char(c);
                }
            }
            i = stop;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out.finish()
}

fn is_line_comment(chars: &[char], i: usize, syntax: &Syntax) -> bool {
    syntax.line_comments.iter().any(|opener| {
        let matches = opener
            .chars()
            .enumerate()
            .all(|(k, oc)| chars.get(i + k) == Some(&oc));
        matches && !(*opener == "#" && syntax.hash_attributes && chars.get(i + 1) == Some(&'['))
    })
}

/// End offset (exclusive) of a string literal starting at `start`
fn scan_string(chars: &[char], start: usize, quote: char, triple: bool) -> usize {
    let mut i = start + if triple { 3 } else { 1 };
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                return i + 1;
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return i + 3;
            }
        }
        i += 1;
    }
    chars.len()
}

fn find_seq(chars: &[char], from: usize, seq: &[char]) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    chars[from..]
        .windows(seq.len())
        .position(|w| w == seq)
        .map(|p| from + p)
}

fn clean_block_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_start_matches('*')
        .trim_end_matches("*/")
        .trim()
}

struct Writer {
    buf: String,
    keep_lines: bool,
}

impl Writer {
    fn new(keep_lines: bool) -> Self {
        Self {
            buf: String::new(),
            keep_lines,
        }
    }

    fn push(&mut self, c: char) {
        match c {
            '\r' => {}
            '\n' if self.keep_lines => {
                self.trim_trailing_blanks();
                self.buf.push('\n');
            }
            ' ' | '\t' if self.keep_lines && self.at_line_start() => self.buf.push(c),
            c if c.is_whitespace() => self.space(),
            c => self.buf.push(c),
        }
    }

    fn raw(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn raw_char(&mut self, c: char) {
        self.buf.push(c);
    }

    fn space(&mut self) {
        if !self.buf.is_empty() && !self.buf.ends_with(' ') && !self.buf.ends_with('\n') {
            self.buf.push(' ');
        }
    }

    fn at_line_start(&self) -> bool {
        self.buf
            .rsplit('\n')
            .next()
            .map_or(true, |line| line.chars().all(|c| c == ' ' || c == '\t'))
    }

    fn trim_trailing_blanks(&mut self) {
        let len = self.buf.trim_end_matches([' ', '\t']).len();
        self.buf.truncate(len);
    }

    /// Emit a preserved comment on a line of its own
    fn marker(&mut self, line: &str, end_line: bool) {
        if self.keep_lines && self.at_line_start() {
            self.buf.push_str(line);
        } else {
            self.trim_trailing_blanks();
            if !self.buf.is_empty() && !self.buf.ends_with('\n') {
                self.buf.push('\n');
            }
            self.buf.push_str(line);
            if !self.keep_lines {
                self.buf.push('\n');
                return;
            }
        }
        if end_line {
            self.buf.push('\n');
        }
    }

    fn finish(self) -> String {
        if self.keep_lines {
            self.buf.trim_end().to_string()
        } else {
            self.buf.trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::syntax::{JAVA, JAVASCRIPT, PHP, PYTHON};

    fn plain(text: &str) -> String {
        normalize(text, &JAVA, &NormalizeOptions::new())
    }

    #[test]
    fn test_strips_comments() {
        let out = plain("int a; // trailing\n/* block */ int b;");
        assert_eq!(out, "int a; int b;");
    }

    #[test]
    fn test_blanks_strings() {
        assert_eq!(plain("String s = \"a { b\";"), "String s = \"\";");
        assert_eq!(plain("char c = '{';"), "char c = '';");
    }

    #[test]
    fn test_keep_strings() {
        let opts = NormalizeOptions::new().keep_strings();
        let out = normalize("@GetMapping(\"/orders\")", &JAVA, &opts);
        assert_eq!(out, "@GetMapping(\"/orders\")");
    }

    #[test]
    fn test_comment_markers_are_preserved() {
        let opts = NormalizeOptions::new().preserve(ACTIVITY_MARKERS);
        let out = normalize("a();\n// @User: Fills form\nb();", &JAVA, &opts);
        assert_eq!(out, "a();\n// @User: Fills form\nb();");
    }

    #[test]
    fn test_block_comment_markers() {
        let opts = NormalizeOptions::new().preserve(ACTIVITY_MARKERS);
        let out = normalize("/**\n * @Activity: Checkout\n */\nvoid run() {}", &JAVA, &opts);
        assert!(out.contains("// @Activity: Checkout\n"));
        assert!(out.ends_with("void run() {}"));
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(plain("class   A\n\n{\t}"), "class A { }");
    }

    #[test]
    fn test_keep_newlines_preserves_indentation() {
        let out = normalize("def f():\n    x  =  1  # note\n    return x\n", &PYTHON, &NormalizeOptions::new());
        assert_eq!(out, "def f():\n    x = 1\n    return x");
    }

    #[test]
    fn test_python_triple_quoted_docstring() {
        let out = normalize("def f():\n    \"\"\"doc { here\"\"\"\n    pass", &PYTHON, &NormalizeOptions::new());
        assert!(out.contains("\"\"\"\"\"\""));
        assert!(!out.contains("doc"));
    }

    #[test]
    fn test_python_docstring_marker_kept() {
        let opts = NormalizeOptions::new().preserve(ACTIVITY_MARKERS);
        let out = normalize("def f():\n    \"\"\"@Activity: Pay\"\"\"\n", &PYTHON, &opts);
        assert!(out.contains("@Activity: Pay"));
    }

    #[test]
    fn test_php_attribute_is_not_a_comment() {
        let out = normalize("#[Route('/x')]\n# gone\nfunction a() {}", &PHP, &NormalizeOptions::new());
        assert_eq!(out, "#[Route('')] function a() {}");
    }

    #[test]
    fn test_template_literals() {
        let out = normalize("const s = `a ${b}`;", &JAVASCRIPT, &NormalizeOptions::new());
        assert_eq!(out, "const s = ``;");
    }

    #[test]
    fn test_unterminated_input_is_total() {
        assert_eq!(plain("int a; /* never closed"), "int a;");
        assert_eq!(plain("s = \"open"), "s = \"\"");
        assert_eq!(plain(""), "");
    }
}
