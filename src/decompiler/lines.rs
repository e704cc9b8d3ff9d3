/// Line buffer for reconstructed script text
///
/// Printers write each statement at the source line number the AST recorded
/// for it. The buffer keeps one entry per line number; a second write to the
/// same line replaces the first. Growing an existing line is an explicit
/// `append`/`prepend`.

use std::collections::BTreeMap;

/// One reconstructed line: indentation level plus text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub indent: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: BTreeMap<usize, Line>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer {
            lines: BTreeMap::new(),
        }
    }

    /// Write `text` at `line`, replacing whatever was there.
    pub fn set(&mut self, line: usize, indent: usize, text: impl Into<String>) {
        self.lines.insert(
            line,
            Line {
                indent,
                text: text.into(),
            },
        );
    }

    /// Append to an existing line. Returns false (and writes nothing) if the line is empty.
    pub fn append(&mut self, line: usize, text: &str) -> bool {
        match self.lines.get_mut(&line) {
            Some(entry) => {
                entry.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Prepend to an existing line. Returns false (and writes nothing) if the line is empty.
    pub fn prepend(&mut self, line: usize, text: &str) -> bool {
        match self.lines.get_mut(&line) {
            Some(entry) => {
                entry.text.insert_str(0, text);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, line: usize) -> Option<&Line> {
        self.lines.get(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn first_line(&self) -> Option<usize> {
        self.lines.keys().next().copied()
    }

    pub fn last_line(&self) -> Option<usize> {
        self.lines.keys().next_back().copied()
    }

    /// Highest written line at or after `start`.
    pub fn last_line_from(&self, start: usize) -> Option<usize> {
        self.lines.range(start..).next_back().map(|(line, _)| *line)
    }

    /// Render every line from the first to the last written line number.
    /// Unwritten line numbers in between become blank lines.
    pub fn render(&self, indent_width: usize) -> String {
        let (Some(first), Some(last)) = (self.first_line(), self.last_line()) else {
            return String::new();
        };

        let mut output = String::new();
        for number in first..=last {
            if let Some(line) = self.lines.get(&number) {
                if !line.text.is_empty() {
                    output.push_str(&" ".repeat(line.indent * indent_width));
                    output.push_str(&line.text);
                }
            }
            output.push('\n');
        }
        output
    }
}
