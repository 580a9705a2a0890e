//! Merge orchestration.
//!
//! Parses a baseline and a diff document, applies every operation of the
//! diff in document order and serializes the result. The first failing
//! operation aborts the merge and nothing is written.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::node::{Document, NamespaceContext};
use crate::patch::{interpret, Applied, Patcher};
use crate::xml::{parse_read, parse_str, to_bytes, XmlPrinterOptions};

/// Options for a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// How the merged document is written.
    pub printer: XmlPrinterOptions,
}

/// Counts of what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Operations that changed the document.
    pub applied: usize,
    /// `remove` operations whose selector matched nothing.
    pub skipped: usize,
}

/// Applies diff documents to baseline documents.
#[derive(Debug, Clone, Default)]
pub struct XmlMerge {
    options: MergeOptions,
}

impl XmlMerge {
    /// Creates a merger with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a merger with the given options.
    pub fn with_options(options: MergeOptions) -> Self {
        XmlMerge { options }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Applies every operation in `diff` to `baseline`.
    ///
    /// Operations are the element children of the diff's document element;
    /// other children are ignored. On error the baseline may already hold
    /// the effects of earlier operations.
    pub fn merge_documents(&self, baseline: &mut Document, diff: &Document) -> Result<MergeReport> {
        let diff_root = diff
            .document_element()
            .ok_or_else(|| Error::Parse("Diff document has no root element".to_string()))?;
        let namespaces = NamespaceContext::build(baseline);
        debug!(bindings = namespaces.len(), "namespace context built");

        let patcher = Patcher::new(&namespaces);
        let mut report = MergeReport::default();
        for &child in diff.children(diff_root) {
            if !diff.content(child).is_element() {
                continue;
            }
            let op = interpret(diff, child)?;
            match patcher.apply(baseline, &op)? {
                Applied::Changed => report.applied += 1,
                Applied::Skipped => report.skipped += 1,
            }
        }

        info!(
            applied = report.applied,
            skipped = report.skipped,
            "merge complete"
        );
        Ok(report)
    }

    /// Merges and returns the serialized document.
    pub fn merge_to_vec<B: Read, D: Read>(&self, baseline: B, diff: D) -> Result<Vec<u8>> {
        self.merge_inner(baseline, diff).map(|(output, _)| output)
    }

    /// Merges and writes the serialized document to `out`.
    ///
    /// `out` is only written once the whole document has been serialized.
    pub fn merge<B: Read, D: Read, W: Write>(
        &self,
        baseline: B,
        diff: D,
        out: &mut W,
    ) -> Result<MergeReport> {
        let (output, report) = self.merge_inner(baseline, diff)?;
        out.write_all(&output).map_err(Error::Serialization)?;
        out.flush().map_err(Error::Serialization)?;
        Ok(report)
    }

    /// Merges two XML strings.
    pub fn merge_str(&self, baseline: &str, diff: &str) -> Result<String> {
        let mut doc = parse_str(baseline)?;
        let diff = parse_str(diff)?;
        self.merge_documents(&mut doc, &diff)?;
        let output = self.serialize(&doc)?;
        String::from_utf8(output).map_err(|e| Error::Parse(e.to_string()))
    }

    fn merge_inner<B: Read, D: Read>(&self, baseline: B, diff: D) -> Result<(Vec<u8>, MergeReport)> {
        let mut doc = parse_read(baseline)?;
        let diff = parse_read(diff)?;
        let report = self.merge_documents(&mut doc, &diff)?;
        Ok((self.serialize(&doc)?, report))
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
        to_bytes(doc, &self.options.printer).map_err(Error::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

    fn compact() -> XmlMerge {
        XmlMerge::with_options(MergeOptions {
            printer: XmlPrinterOptions::compact(),
        })
    }

    #[test]
    fn test_default_options_are_pretty() {
        let merge = XmlMerge::new();
        assert!(merge.options().printer.pretty_print);
        assert_eq!(merge.options().printer.indent, 2);
    }

    #[test]
    fn test_merge_str() {
        let out = compact()
            .merge_str("<root><a>1</a></root>", r#"<diff><replace sel="/root/a/text()">2</replace></diff>"#)
            .unwrap();
        assert_eq!(out, format!("{DECL}<root><a>2</a></root>\n"));
    }

    #[test]
    fn test_report_counts() {
        let mut doc = parse_str("<root><a/></root>").unwrap();
        let diff = parse_str(
            r#"<diff>
                <!-- comments between operations are ignored -->
                <remove sel="/root/a"/>
                <remove sel="/root/a"/>
                <add sel="/root" type="@x">1</add>
            </diff>"#,
        )
        .unwrap();
        let report = XmlMerge::new().merge_documents(&mut doc, &diff).unwrap();
        assert_eq!(
            report,
            MergeReport {
                applied: 2,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_failure_writes_nothing() {
        let mut out = Vec::new();
        let err = XmlMerge::new()
            .merge(
                "<root/>".as_bytes(),
                r#"<diff><add sel="/root" type="@a">1</add><replace sel="/nope">x</replace></diff>"#.as_bytes(),
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_operation_aborts() {
        let err = XmlMerge::new()
            .merge_to_vec("<root/>".as_bytes(), r#"<diff><move sel="/root"/></diff>"#.as_bytes())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid patch operation: Invalid merge operation move");
    }

    #[test]
    fn test_malformed_inputs() {
        let merge = XmlMerge::new();
        assert!(matches!(
            merge.merge_str("<root>", "<diff/>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            merge.merge_str("<root/>", "<diff><remove sel='/root'></diff>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            merge.merge_str("<r/>garbage", "<diff/>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            merge.merge_str("junk<r/>", "<diff/>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            merge.merge_str("<r/>", "<diff/>trailing"),
            Err(Error::Parse(_))
        ));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_serialization_error() {
        let err = XmlMerge::new()
            .merge("<root/>".as_bytes(), "<diff/>".as_bytes(), &mut FailingWriter)
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
