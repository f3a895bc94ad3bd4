/*!
 * Inline content of a paragraph and the marker automaton that keeps it
 * balanced.
 *
 * A paragraph is a flat stream of elements. Tag pairs, locked spans and
 * comment anchors are expressed as separate Opening/Closing markers, so
 * nesting is a property of the stream rather than of a tree. `MarkerStack`
 * checks that property one element at a time with an explicit stack.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opening or closing half of a paired marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    /// Start of a span
    Opening,
    /// End of a span
    Closing,
}

/// A single piece of inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Run of plain text
    Text(String),

    /// Half of a formatting tag pair (`bpt`/`ept`)
    TagPair {
        tag_type: TagType,
        tag_id: String,
        /// Raw native markup of the tag
        tag_content: String,
    },

    /// Standalone placeholder tag (`ph`)
    Placeholder { tag_id: String, tag_content: String },

    /// Half of a protected (non-editable) span
    Locked { tag_type: TagType },

    /// Half of a comment anchor referencing a comment definition
    Comment {
        tag_type: TagType,
        definition_id: String,
    },
}

impl Element {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tag_open(tag_id: impl Into<String>, tag_content: impl Into<String>) -> Self {
        Self::TagPair {
            tag_type: TagType::Opening,
            tag_id: tag_id.into(),
            tag_content: tag_content.into(),
        }
    }

    pub fn tag_close(tag_id: impl Into<String>, tag_content: impl Into<String>) -> Self {
        Self::TagPair {
            tag_type: TagType::Closing,
            tag_id: tag_id.into(),
            tag_content: tag_content.into(),
        }
    }

    pub fn placeholder(tag_id: impl Into<String>, tag_content: impl Into<String>) -> Self {
        Self::Placeholder {
            tag_id: tag_id.into(),
            tag_content: tag_content.into(),
        }
    }

    pub fn locked_open() -> Self {
        Self::Locked {
            tag_type: TagType::Opening,
        }
    }

    pub fn locked_close() -> Self {
        Self::Locked {
            tag_type: TagType::Closing,
        }
    }

    pub fn comment_open(definition_id: impl Into<String>) -> Self {
        Self::Comment {
            tag_type: TagType::Opening,
            definition_id: definition_id.into(),
        }
    }

    pub fn comment_close(definition_id: impl Into<String>) -> Self {
        Self::Comment {
            tag_type: TagType::Closing,
            definition_id: definition_id.into(),
        }
    }

    /// Text content if this is a text run.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Marker kind and direction for paired markers, `None` for text and placeholders.
    pub fn marker(&self) -> Option<(Frame, TagType)> {
        match self {
            Self::TagPair {
                tag_type, tag_id, ..
            } => Some((Frame::TagPair(tag_id.clone()), *tag_type)),
            Self::Locked { tag_type } => Some((Frame::Locked, *tag_type)),
            Self::Comment {
                tag_type,
                definition_id,
            } => Some((Frame::Comment(definition_id.clone()), *tag_type)),
            Self::Text(_) | Self::Placeholder { .. } => None,
        }
    }
}

/// An open span on the marker stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Open formatting tag pair with its tag id
    TagPair(String),
    /// Open locked span
    Locked,
    /// Open comment anchor with its definition id
    Comment(String),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagPair(id) => write!(f, "tag pair '{}'", id),
            Self::Locked => write!(f, "locked span"),
            Self::Comment(id) => write!(f, "comment '{}'", id),
        }
    }
}

/// Current state of the paragraph automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerState {
    Outside,
    InsideTagPair(String),
    InsideLocked,
    InsideComment(String),
}

/// Bracket violation in an element stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestingError {
    /// Closing marker with nothing open
    UnexpectedClosing(Frame),
    /// Closing marker that does not match the innermost open span
    Mismatched { expected: Frame, found: Frame },
    /// Spans still open at the end of the paragraph
    Unclosed(Vec<Frame>),
}

impl fmt::Display for NestingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedClosing(frame) => {
                write!(f, "closing {} without a matching opening", frame)
            }
            Self::Mismatched { expected, found } => {
                write!(f, "closing {} while {} is still open", found, expected)
            }
            Self::Unclosed(frames) => {
                let names: Vec<String> = frames.iter().map(|frame| frame.to_string()).collect();
                write!(f, "unclosed {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for NestingError {}

/// Explicit stack automaton over paired markers.
///
/// Initial and final state is `Outside` with an empty stack. Text and
/// placeholders never change state.
#[derive(Debug, Default, Clone)]
pub struct MarkerStack {
    frames: Vec<Frame>,
}

impl MarkerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one element.
    pub fn apply(&mut self, element: &Element) -> Result<(), NestingError> {
        match element.marker() {
            None => Ok(()),
            Some((frame, TagType::Opening)) => {
                self.frames.push(frame);
                Ok(())
            }
            Some((frame, TagType::Closing)) => self.close(frame),
        }
    }

    /// Pop the innermost span, which must equal `frame`.
    pub fn close(&mut self, frame: Frame) -> Result<(), NestingError> {
        match self.frames.last() {
            None => Err(NestingError::UnexpectedClosing(frame)),
            Some(top) if *top == frame => {
                self.frames.pop();
                Ok(())
            }
            Some(top) => Err(NestingError::Mismatched {
                expected: top.clone(),
                found: frame,
            }),
        }
    }

    pub fn state(&self) -> MarkerState {
        match self.frames.last() {
            None => MarkerState::Outside,
            Some(Frame::TagPair(id)) => MarkerState::InsideTagPair(id.clone()),
            Some(Frame::Locked) => MarkerState::InsideLocked,
            Some(Frame::Comment(id)) => MarkerState::InsideComment(id.clone()),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Check the terminal state.
    pub fn finish(self) -> Result<(), NestingError> {
        if self.frames.is_empty() {
            Ok(())
        } else {
            Err(NestingError::Unclosed(self.frames))
        }
    }
}

/// Run a whole element sequence through the automaton.
pub fn check_balance(elements: &[Element]) -> Result<(), NestingError> {
    let mut stack = MarkerStack::new();
    for element in elements {
        stack.apply(element)?;
    }
    stack.finish()
}
