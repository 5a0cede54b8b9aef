//! Path sequences built from positional arguments
//!
//! An argument holding a numbered placeholder (`%d`, `%3d`, `%03d`) is a
//! template and expands to an open-ended sequence; plain arguments are
//! taken literally.

use crate::constants::PLACEHOLDER_MARKER;
use crate::types::*;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Number { width: usize },
}

/// A path with exactly one numbered placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse `arg` as a template.
    ///
    /// Returns `Ok(None)` when the argument has no numbered placeholder and
    /// should be used literally.
    pub fn detect(arg: &str) -> Result<Option<Self>> {
        if !has_placeholder(arg) {
            return Ok(None);
        }
        Self::parse(arg).map(Some)
    }

    /// Parse a template, rejecting stray `%` and multiple placeholders
    pub fn parse(arg: &str) -> Result<Self> {
        let bad = |reason: &str| {
            ScanError::Config(format!("Invalid path template '{}': {}", arg, reason))
        };

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut placeholders = 0;
        let mut chars = arg.chars().peekable();

        while let Some(c) = chars.next() {
            if c != PLACEHOLDER_MARKER {
                text.push(c);
                continue;
            }
            if chars.peek() == Some(&PLACEHOLDER_MARKER) {
                chars.next();
                text.push(PLACEHOLDER_MARKER);
                continue;
            }

            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if chars.next() != Some('d') {
                return Err(bad("only %d, %Nd, %0Nd and %% are supported"));
            }
            let width = if digits.is_empty() {
                0
            } else {
                digits.parse().map_err(|_| bad("placeholder width too large"))?
            };

            placeholders += 1;
            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            segments.push(Segment::Number { width });
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        match placeholders {
            0 => Err(bad("no numbered placeholder")),
            1 => Ok(Self {
                source: arg.to_string(),
                segments,
            }),
            _ => Err(bad("more than one numbered placeholder")),
        }
    }

    /// Substitute `number`, zero padded to the placeholder width
    pub fn render(&self, number: usize) -> PathBuf {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Number { width } => {
                    out.push_str(&format!("{:0width$}", number, width = *width))
                }
            }
        }
        PathBuf::from(out)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// True when `arg` contains `%d`, `%Nd` or `%0Nd` outside a `%%` escape
fn has_placeholder(arg: &str) -> bool {
    let mut chars = arg.chars().peekable();
    while let Some(c) = chars.next() {
        if c != PLACEHOLDER_MARKER {
            continue;
        }
        if chars.peek() == Some(&PLACEHOLDER_MARKER) {
            chars.next();
            continue;
        }
        while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
            chars.next();
        }
        if chars.peek() == Some(&'d') {
            return true;
        }
    }
    false
}

/// Ordered, 1-based index -> path mapping.
///
/// Template sequences are unbounded; the caller decides when to stop
/// pulling (sheet bound reached, or the next input does not exist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSequence {
    Template {
        template: PathTemplate,
        /// Number substituted for index 1
        first: usize,
    },
    Literal(Vec<PathBuf>),
}

impl PathSequence {
    pub fn template(template: PathTemplate) -> Self {
        PathSequence::Template { template, first: 1 }
    }

    /// Shift the numbering of a template so index 1 renders `first`.
    /// Literal lists are unaffected.
    pub fn starting_at(self, first: usize) -> Self {
        match self {
            PathSequence::Template { template, .. } => PathSequence::Template { template, first },
            literal => literal,
        }
    }

    /// Resolve 1-based `index`; `None` past the end of a literal list
    pub fn get(&self, index: usize) -> Option<PathBuf> {
        if index == 0 {
            return None;
        }
        match self {
            PathSequence::Template { template, first } => {
                Some(template.render(first + index - 1))
            }
            PathSequence::Literal(paths) => paths.get(index - 1).cloned(),
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, PathSequence::Template { .. })
    }

    /// Number of entries, `None` for an unbounded template
    pub fn len(&self) -> Option<usize> {
        match self {
            PathSequence::Template { .. } => None,
            PathSequence::Literal(paths) => Some(paths.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Lazily walk the sequence from index 1
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (1..).map_while(move |index| self.get(index))
    }
}

/// Positional arguments split into input and output sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positional {
    pub inputs: PathSequence,
    pub outputs: PathSequence,
}

impl Positional {
    /// Split `args` for a run that reads `inputs_per_sheet` files and writes
    /// `outputs_per_sheet` files per sheet.
    ///
    /// A template as the first argument is the whole input side, a template
    /// as the last argument the whole output side. Literal arguments are
    /// read in per-sheet groups: the inputs of a sheet, then its outputs.
    pub fn partition<S: AsRef<str>>(
        args: &[S],
        inputs_per_sheet: usize,
        outputs_per_sheet: usize,
    ) -> Result<Self> {
        if inputs_per_sheet == 0 || outputs_per_sheet == 0 {
            return Err(ScanError::Config(
                "Input and output pages per sheet must be at least 1".to_string(),
            ));
        }
        if args.is_empty() {
            return Err(ScanError::Config(
                "No input or output paths given".to_string(),
            ));
        }

        let parsed = args
            .iter()
            .map(|arg| PathTemplate::detect(arg.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let literals = |range: &[Option<PathTemplate>], raw: &[S]| -> Result<Vec<PathBuf>> {
            range
                .iter()
                .zip(raw)
                .map(|(template, arg)| match template {
                    Some(t) => Err(ScanError::Config(format!(
                        "Path template '{}' must be the first or last argument, and only one per side",
                        t.as_str()
                    ))),
                    None => Ok(PathBuf::from(arg.as_ref())),
                })
                .collect()
        };

        let last = parsed.len() - 1;

        if let Some(input_template) = &parsed[0] {
            let rest = &parsed[1..];
            if rest.is_empty() {
                return Err(ScanError::Config("No output path given".to_string()));
            }
            let outputs = match (rest.len(), &rest[rest.len() - 1]) {
                (1, Some(output_template)) => PathSequence::template(output_template.clone()),
                _ => PathSequence::Literal(literals(rest, &args[1..])?),
            };
            return Ok(Self {
                inputs: PathSequence::template(input_template.clone()),
                outputs,
            });
        }

        if let Some(output_template) = &parsed[last] {
            if last == 0 {
                return Err(ScanError::Config("No input path given".to_string()));
            }
            let inputs = literals(&parsed[..last], &args[..last])?;
            return Ok(Self {
                inputs: PathSequence::Literal(inputs),
                outputs: PathSequence::template(output_template.clone()),
            });
        }

        let group = inputs_per_sheet + outputs_per_sheet;
        if args.len() % group != 0 {
            return Err(ScanError::Config(format!(
                "Got {} paths, but each sheet takes {} input and {} output path(s); \
                 use a numbered template for longer batches",
                args.len(),
                inputs_per_sheet,
                outputs_per_sheet
            )));
        }

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for chunk in args.chunks(group) {
            let (ins, outs) = chunk.split_at(inputs_per_sheet);
            inputs.extend(ins.iter().map(|a| PathBuf::from(a.as_ref())));
            outputs.extend(outs.iter().map(|a| PathBuf::from(a.as_ref())));
        }

        Ok(Self {
            inputs: PathSequence::Literal(inputs),
            outputs: PathSequence::Literal(outputs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(has_placeholder("scan%03d.png"));
        assert!(has_placeholder("%d.pbm"));
        assert!(!has_placeholder("100%%.png"));
        assert!(!has_placeholder("plain.png"));
        assert!(!has_placeholder("50%.png"));
    }

    #[test]
    fn test_render_widths() {
        assert_eq!(
            PathTemplate::parse("a%03d.png").unwrap().render(7),
            PathBuf::from("a007.png")
        );
        assert_eq!(
            PathTemplate::parse("a%3d.png").unwrap().render(7),
            PathBuf::from("a007.png")
        );
        assert_eq!(
            PathTemplate::parse("a%d.png").unwrap().render(1234),
            PathBuf::from("a1234.png")
        );
        assert_eq!(
            PathTemplate::parse("100%%-%02d").unwrap().render(5),
            PathBuf::from("100%-05")
        );
    }

    #[test]
    fn test_stray_percent_in_template() {
        assert!(PathTemplate::parse("a%d-%s.png").is_err());
        assert!(PathTemplate::parse("a%d-%d.png").is_err());
    }
}
