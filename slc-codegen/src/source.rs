// Line-oriented source text builder
//
// The builder writes through a minimal `StringSink` collaborator so hosts can
// supply their own buffered writers. No random access, append only.

/// Byte/string sink collaborator contract
pub trait StringSink {
    fn append(&mut self, s: &str);
    fn append_char(&mut self, c: char);
    fn add_chars(&mut self, c: char, count: usize) {
        for _ in 0..count {
            self.append_char(c);
        }
    }
}

impl StringSink for String {
    fn append(&mut self, s: &str) {
        self.push_str(s);
    }

    fn append_char(&mut self, c: char) {
        self.push(c);
    }
}

/// Indentation-aware writer used by all backends
pub struct SourceBuilder<'a> {
    sink: &'a mut dyn StringSink,
    indent_width: usize,
    level: usize,
    at_line_start: bool,
}

impl<'a> SourceBuilder<'a> {
    pub fn new(sink: &'a mut dyn StringSink, indent_width: usize) -> Self {
        Self {
            sink,
            indent_width,
            level: 0,
            at_line_start: true,
        }
    }

    pub fn append(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            self.sink.add_chars(' ', self.level * self.indent_width);
            self.at_line_start = false;
        }
        self.sink.append(s);
    }

    /// Terminate the current line
    pub fn endline(&mut self) {
        self.sink.append_char('\n');
        self.at_line_start = true;
    }

    /// Append a final character (typically `;`) and terminate the line
    pub fn endline_with(&mut self, c: char) {
        if self.at_line_start {
            self.sink.add_chars(' ', self.level * self.indent_width);
            self.at_line_start = false;
        }
        self.sink.append_char(c);
        self.endline();
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut out = String::new();
        {
            let mut sb = SourceBuilder::new(&mut out, 4);
            sb.append("void f() {");
            sb.endline();
            sb.indent();
            sb.append("return");
            sb.endline_with(';');
            sb.dedent();
            sb.append("}");
            sb.endline();
        }
        assert_eq!(out, "void f() {\n    return;\n}\n");
    }

    #[test]
    fn test_add_chars_default() {
        let mut out = String::new();
        out.add_chars('*', 3);
        assert_eq!(out, "***");
    }
}
