/*!
 * Reflowing segment pairs into one paragraph.
 *
 * A trans-unit stores its paragraph as separate segments; the merged
 * `<source>` of the file format is the concatenation of those segments
 * with a single space wherever neither neighbour supplies whitespace.
 */

use super::elements::Element;
use super::model::{Paragraph, SegmentPair};

/// Which half of the segment pairs to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn paragraph(self, pair: &SegmentPair) -> &Paragraph {
        match self {
            Self::Source => &pair.source,
            Self::Target => &pair.target,
        }
    }
}

/// Whether a separating space goes between `previous` and `current`.
///
/// Only text elements at the boundary are consulted. A boundary that is a
/// marker, a placeholder or missing counts as "no space found".
pub fn needs_separator(previous: &Paragraph, current: &Paragraph) -> bool {
    let starts_with_space = matches!(current.first(), Some(Element::Text(text)) if text.starts_with(' '));
    if starts_with_space {
        return false;
    }

    let ends_with_space = matches!(previous.last(), Some(Element::Text(text)) if text.ends_with(' '));
    !ends_with_space
}

/// Concatenate one side of the segment pairs with inter-segment spacing.
pub fn merge_segments(pairs: &[SegmentPair], side: Side) -> Paragraph {
    let mut merged = Paragraph::new();
    let mut previous: Option<&Paragraph> = None;

    for pair in pairs {
        let current = side.paragraph(pair);
        if let Some(previous) = previous {
            if needs_separator(previous, current) {
                merged.push_text(" ");
            }
        }
        for element in &current.elements {
            merged.push(element.clone());
        }
        previous = Some(current);
    }

    merged
}
