// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::ops::Range;

use memchr::memchr;

/// Presentation class of a highlighted byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Declaration,
    Comment,
    Tag,
    AttrValue,
    Text,
}

/// One classified byte range of a preview line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub kind: HighlightKind,
    pub range: Range<usize>,
}

impl HighlightSpan {
    fn new(kind: HighlightKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }
}

/// Classifies one line of serializer output for display decoration.
///
/// Purely cosmetic: the spans tile the line exactly (empty ranges are never
/// emitted), so concatenating the covered slices reproduces the input and the
/// text available for copy/export is never altered.
pub fn highlight_line(line: &str) -> Vec<HighlightSpan> {
    if line.is_empty() {
        return Vec::new();
    }

    let trimmed = line.trim_start();
    if trimmed.starts_with("<?xml") {
        return vec![HighlightSpan::new(HighlightKind::Declaration, 0..line.len())];
    }
    if trimmed.starts_with("<!--") {
        return vec![HighlightSpan::new(HighlightKind::Comment, 0..line.len())];
    }

    let mut spans = Vec::new();
    let bytes = line.as_bytes();
    let mut pos = 0;

    while pos < line.len() {
        match memchr(b'<', &bytes[pos..]) {
            None => {
                spans.push(HighlightSpan::new(HighlightKind::Text, pos..line.len()));
                break;
            }
            Some(offset) => {
                if offset > 0 {
                    spans.push(HighlightSpan::new(HighlightKind::Text, pos..pos + offset));
                }
                pos += offset;
                pos = push_tag_spans(line, pos, &mut spans);
            }
        }
    }

    spans
}

/// Emits spans for one `<…>` run starting at `start`; quoted attribute values
/// inside it get their own kind. Returns the position after the run.
fn push_tag_spans(line: &str, start: usize, spans: &mut Vec<HighlightSpan>) -> usize {
    let bytes = line.as_bytes();
    let mut pos = start;
    let mut segment_start = start;

    while pos < line.len() {
        match bytes[pos] {
            b'>' => {
                pos += 1;
                if pos > segment_start {
                    spans.push(HighlightSpan::new(HighlightKind::Tag, segment_start..pos));
                }
                return pos;
            }
            quote @ (b'"' | b'\'') => {
                if pos > segment_start {
                    spans.push(HighlightSpan::new(HighlightKind::Tag, segment_start..pos));
                }
                let value_start = pos;
                pos += 1;
                pos = match memchr(quote, &bytes[pos..]) {
                    Some(offset) => pos + offset + 1,
                    None => line.len(),
                };
                spans.push(HighlightSpan::new(HighlightKind::AttrValue, value_start..pos));
                segment_start = pos;
            }
            _ => pos += 1,
        }
    }

    if pos > segment_start {
        spans.push(HighlightSpan::new(HighlightKind::Tag, segment_start..pos));
    }
    pos
}
