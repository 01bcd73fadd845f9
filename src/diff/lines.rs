//! Terminator-preserving line splitting.
//!
//! Diff output must be byte-accurate against the source, so splitting keeps
//! each line's original terminator (`"\r\n"`, `"\r"`, or `"\n"`) alongside
//! its content. The last line always carries an empty terminator.

/// One line of text plus the terminator that ended it in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SplitLine<'a> {
    pub content: &'a str,
    pub terminator: &'a str,
}

impl SplitLine<'_> {
    /// The line exactly as it appeared in the source.
    pub fn raw(&self) -> String {
        let mut text = String::with_capacity(self.content.len() + self.terminator.len());
        text.push_str(self.content);
        text.push_str(self.terminator);
        text
    }
}

/// Splits `text` into lines, keeping terminators. The empty string splits
/// into a single empty line, so every input has at least one line.
pub(crate) fn split_keeping_terminators(text: &str) -> Vec<SplitLine<'_>> {
    let mut lines = Vec::new();
    let mut rest = text;
    loop {
        match rest.find(['\n', '\r']) {
            Some(pos) => {
                let (content, tail) = rest.split_at(pos);
                let (terminator, remainder) = if tail.starts_with("\r\n") {
                    tail.split_at(2)
                } else {
                    tail.split_at(1)
                };
                lines.push(SplitLine {
                    content,
                    terminator,
                });
                rest = remainder;
            }
            None => {
                lines.push(SplitLine {
                    content: rest,
                    terminator: "",
                });
                break;
            }
        }
    }
    lines
}
