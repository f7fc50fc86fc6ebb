use std::{borrow::Cow, io};

/// An error that can be rendered against the source text it came from.
///
/// All three compilation stages (lexing, parsing, code generation) implement
/// this, so callers can report any of them the same way.
pub trait Diagnostic {
    /// The human-readable error message.
    fn message(&self) -> String;

    /// The 1-indexed line and column of the offending source text.
    fn position(&self) -> (u32, u32);

    /// The length in bytes of the offending source text.
    fn len(&self) -> usize;
}

/// The original text of a lago program, along with a source name.
#[derive(Debug)]
pub struct Source {
    contents: String,
    name: Cow<'static, str>,
}

impl Source {
    /// Create a new source with the given name and text.
    pub fn new(name: impl Into<Cow<'static, str>>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }

    /// Get the underlying contents of the source.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Get the name of the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The byte offset of a 1-indexed line/column position. Columns count
    /// bytes, so this is exact.
    pub fn offset_of(&self, line: u32, column: u32) -> usize {
        let mut offset = 0;
        for (i, text) in self.contents.split('\n').enumerate() {
            if i + 1 >= line as usize {
                break;
            }
            offset += text.len() + 1;
        }
        (offset + column.saturating_sub(1) as usize).min(self.contents.len())
    }

    /// Format an error on this source, writing the report to `writer`.
    pub fn fmt_diagnostic(
        &self,
        diagnostic: &dyn Diagnostic,
        writer: impl io::Write,
    ) -> io::Result<()> {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (line, column) = diagnostic.position();
        let start = self.offset_of(line, column);
        let end = (start + diagnostic.len().max(1)).min(self.contents.len().max(start + 1));
        Report::build(ReportKind::Error, self.name(), start)
            .with_message(diagnostic.message())
            .with_label(
                Label::new((self.name(), start..end))
                    .with_message(diagnostic.message())
                    .with_color(Color::Blue),
            )
            .finish()
            .write((self.name(), Source::from(self.contents())), writer)
    }
}
