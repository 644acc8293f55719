// Statement structure of method bodies
//
// A small recursive reader for brace-language bodies. It recognizes the
// control-flow forms the activity extractor renders; anything else is a
// simple statement ending at `;` or at the end of a line.

use super::block::find_balanced_end;

/// One statement of a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `if` / `else if` branches with their conditions, then the `else` body
    If {
        branches: Vec<(String, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
    },
    Switch {
        subject: String,
        cases: Vec<(String, Vec<Statement>)>,
    },
    Loop {
        header: String,
        body: Vec<Statement>,
    },
    Try {
        body: Vec<Statement>,
        /// Catch clauses with their parameter text
        handlers: Vec<(String, Vec<Statement>)>,
        finally: Option<Vec<Statement>>,
    },
    Block(Vec<Statement>),
    /// A preserved marker comment
    Marker(String),
    Simple(String),
}

/// Parse a normalized brace-language body into statements.
///
/// Total on any input: unclosed blocks run to the end of the text.
pub fn parse_statements(text: &str) -> Vec<Statement> {
    Reader { text, pos: 0 }.statements()
}

/// Collapse whitespace and drop a trailing `;`
fn clean(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.trim_end_matches(';').trim().to_string()
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn word(&self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.word() == word {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn statements(&mut self) -> Vec<Statement> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            let Some(c) = self.rest().chars().next() else {
                break;
            };
            let before = self.pos;
            if let Some(stmt) = self.statement() {
                out.push(stmt);
            }
            if self.pos == before {
                self.pos += c.len_utf8();
            }
        }
        out
    }

    fn statement(&mut self) -> Option<Statement> {
        let rest = self.rest();
        if rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#[")) {
            let end = rest.find('\n').unwrap_or(rest.len());
            self.pos += end;
            return Some(Statement::Marker(rest[..end].trim().to_string()));
        }
        if rest.starts_with('{') {
            let inner = self.braced();
            return Some(Statement::Block(parse_statements(inner)));
        }
        if rest.starts_with([';', '}', ')']) {
            self.pos += 1;
            return None;
        }
        match self.word() {
            "if" => Some(self.if_statement()),
            "switch" => Some(self.switch_statement()),
            "for" | "foreach" | "while" => Some(self.loop_statement()),
            "do" => Some(self.do_statement()),
            "try" => Some(self.try_statement()),
            // dangling clause of a construct we could not read
            word @ ("else" | "catch" | "finally") => {
                self.pos += word.len();
                None
            }
            _ => self.simple(),
        }
    }

    /// Content of the `{...}` block at the cursor
    fn braced(&mut self) -> &'a str {
        let inner = &self.text[self.pos + 1..];
        match find_balanced_end(inner, '{', '}') {
            Some(end) => {
                self.pos += end + 2;
                &inner[..end]
            }
            None => {
                self.pos = self.text.len();
                inner
            }
        }
    }

    /// Content of the `(...)` group at the cursor, empty when there is none
    fn paren(&mut self) -> String {
        self.skip_ws();
        if !self.rest().starts_with('(') {
            return String::new();
        }
        let inner = &self.text[self.pos + 1..];
        match find_balanced_end(inner, '(', ')') {
            Some(end) => {
                self.pos += end + 2;
                clean(&inner[..end])
            }
            None => {
                self.pos = self.text.len();
                clean(inner)
            }
        }
    }

    /// A braced block or a single statement
    fn body(&mut self) -> Vec<Statement> {
        self.skip_ws();
        if self.rest().starts_with('{') {
            let inner = self.braced();
            return parse_statements(inner);
        }
        self.statement().into_iter().collect()
    }

    fn if_statement(&mut self) -> Statement {
        self.eat_word("if");
        let mut branches = Vec::new();
        let mut otherwise = None;
        loop {
            let condition = self.paren();
            let body = self.body();
            branches.push((condition, body));

            let save = self.pos;
            self.skip_ws();
            if self.eat_word("elseif") {
                continue;
            }
            if self.eat_word("else") {
                self.skip_ws();
                if self.eat_word("if") {
                    continue;
                }
                otherwise = Some(self.body());
            } else {
                self.pos = save;
            }
            break;
        }
        Statement::If { branches, otherwise }
    }

    fn switch_statement(&mut self) -> Statement {
        self.eat_word("switch");
        let subject = self.paren();
        self.skip_ws();
        if !self.rest().starts_with('{') {
            return Statement::Switch {
                subject,
                cases: Vec::new(),
            };
        }
        let inner = self.braced();
        Statement::Switch {
            subject,
            cases: Reader { text: inner, pos: 0 }.cases(),
        }
    }

    /// `case X:` sections of a switch body
    fn cases(&mut self) -> Vec<(String, Vec<Statement>)> {
        let mut cases: Vec<(String, Vec<Statement>)> = Vec::new();
        loop {
            self.skip_ws();
            let Some(c) = self.rest().chars().next() else {
                break;
            };
            let before = self.pos;
            match self.word() {
                "case" | "default" => {
                    let label = self.case_label();
                    cases.push((label, Vec::new()));
                }
                _ => {
                    if let Some(stmt) = self.statement() {
                        let is_break = matches!(&stmt, Statement::Simple(s) if s == "break");
                        if let (false, Some((_, body))) = (is_break, cases.last_mut()) {
                            body.push(stmt);
                        }
                    }
                }
            }
            if self.pos == before {
                self.pos += c.len_utf8();
            }
        }
        cases
    }

    /// Label text of `case X:` / `case X ->` / `default:`
    fn case_label(&mut self) -> String {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut end = rest.len();
        let mut skip = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => i += 1,
                b':' if depth == 0 => {
                    end = i;
                    skip = 1;
                    break;
                }
                b'-' if depth == 0 && bytes.get(i + 1) == Some(&b'>') => {
                    end = i;
                    skip = 2;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        let label = rest[..end].trim();
        self.pos += end + skip;
        let label = label.strip_prefix("case").unwrap_or(label);
        clean(label)
    }

    fn loop_statement(&mut self) -> Statement {
        let word = self.word();
        self.pos += word.len();
        let header = self.paren();
        let body = self.body();
        Statement::Loop { header, body }
    }

    fn do_statement(&mut self) -> Statement {
        self.eat_word("do");
        let body = self.body();
        let save = self.pos;
        self.skip_ws();
        let header = if self.eat_word("while") {
            let condition = self.paren();
            self.skip_ws();
            if self.rest().starts_with(';') {
                self.pos += 1;
            }
            condition
        } else {
            self.pos = save;
            String::new()
        };
        Statement::Loop { header, body }
    }

    fn try_statement(&mut self) -> Statement {
        self.eat_word("try");
        // try-with-resources
        self.paren();
        let body = self.body();
        let mut handlers = Vec::new();
        loop {
            let save = self.pos;
            self.skip_ws();
            if !self.eat_word("catch") {
                self.pos = save;
                break;
            }
            let parameter = self.paren();
            // C# exception filters
            self.skip_ws();
            if self.eat_word("when") {
                self.paren();
            }
            handlers.push((parameter, self.body()));
        }
        let save = self.pos;
        self.skip_ws();
        let finally = if self.eat_word("finally") {
            Some(self.body())
        } else {
            self.pos = save;
            None
        };
        Statement::Try {
            body,
            handlers,
            finally,
        }
    }

    fn simple(&mut self) -> Option<Statement> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'{' if depth == 0 && !continues_expression(&rest[..i]) => {
                    // block-headed statement: `using (...) {`, `lock (x) {`, nested functions
                    self.pos += i;
                    let inner = self.braced();
                    return Some(Statement::Block(parse_statements(inner)));
                }
                b'{' => depth += 1,
                b'}' if depth == 0 => break,
                b'}' => depth -= 1,
                b';' if depth == 0 => {
                    self.pos += i + 1;
                    return non_empty(&rest[..i]);
                }
                b'/' if depth == 0 && bytes.get(i + 1) == Some(&b'/') && !rest[..i].trim().is_empty() => break,
                b'\n' if depth == 0 && ends_line(&rest[..i], &rest[i + 1..]) => break,
                _ => {}
            }
            i += 1;
        }
        self.pos += i;
        non_empty(&rest[..i])
    }
}

fn non_empty(text: &str) -> Option<Statement> {
    let text = clean(text);
    (!text.is_empty()).then_some(Statement::Simple(text))
}

/// Whether a `{` after `before` opens an expression rather than a block
fn continues_expression(before: &str) -> bool {
    let t = before.trim_end();
    if t.is_empty() {
        return false;
    }
    if t.ends_with(['=', '(', ',', '[', ':', '?', '>', '&', '|', '!', '+']) {
        return true;
    }
    let last = t.rsplit(|c: char| !(c.is_alphanumeric() || c == '_')).next().unwrap_or("");
    matches!(last, "return" | "yield" | "await" | "throw" | "new" | "in" | "of")
}

/// Whether a newline ends the statement collected so far
fn ends_line(before: &str, after: &str) -> bool {
    let t = before.trim_end();
    if t.trim().is_empty() {
        return false;
    }
    if t.ends_with(['=', '+', '-', '*', '/', '%', '&', '|', ',', '(', '.', '?', ':', '<', '>', '!']) {
        return false;
    }
    let next = after.trim_start();
    !next.starts_with(['.', '?', ':', '+', '-', '*', '/', '&', '|', ')', '=', '{'])
}
