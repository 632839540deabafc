use crate::error::ExperimentError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The closed set of stimulus shapes flashed at the participant.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];
}

/// Per-shape tallies. Serves both as the ground truth derived from a
/// sequence and as the shape of a submitted answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCounts {
    pub square: u32,
    pub triangle: u32,
    pub circle: u32,
}

impl ShapeCounts {
    pub fn new(square: u32, triangle: u32, circle: u32) -> Self {
        Self {
            square,
            triangle,
            circle,
        }
    }

    /// Tally each shape's occurrences in `sequence`.
    pub fn from_sequence(sequence: &[Shape]) -> Self {
        let tallies = sequence.iter().counts();
        let count = |s: &Shape| tallies.get(s).copied().unwrap_or(0) as u32;
        Self {
            square: count(&Shape::Square),
            triangle: count(&Shape::Triangle),
            circle: count(&Shape::Circle),
        }
    }

    pub fn get(&self, shape: Shape) -> u32 {
        match shape {
            Shape::Square => self.square,
            Shape::Triangle => self.triangle,
            Shape::Circle => self.circle,
        }
    }

    pub fn total(&self) -> u32 {
        self.square + self.triangle + self.circle
    }
}

/// A partially filled answer. The participant supplies the three counts in
/// any order; `complete` only succeeds once every field is present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    pub square: Option<u32>,
    pub triangle: Option<u32>,
    pub circle: Option<u32>,
}

impl AnswerDraft {
    pub fn set(&mut self, shape: Shape, count: Option<u32>) {
        match shape {
            Shape::Square => self.square = count,
            Shape::Triangle => self.triangle = count,
            Shape::Circle => self.circle = count,
        }
    }

    pub fn get(&self, shape: Shape) -> Option<u32> {
        match shape {
            Shape::Square => self.square,
            Shape::Triangle => self.triangle,
            Shape::Circle => self.circle,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fails naming the first missing shape so the UI can point at it.
    pub fn complete(&self) -> Result<ShapeCounts, ExperimentError> {
        let square = self
            .square
            .ok_or(ExperimentError::IncompleteAnswer(Shape::Square))?;
        let triangle = self
            .triangle
            .ok_or(ExperimentError::IncompleteAnswer(Shape::Triangle))?;
        let circle = self
            .circle
            .ok_or(ExperimentError::IncompleteAnswer(Shape::Circle))?;
        Ok(ShapeCounts {
            square,
            triangle,
            circle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_shape_display_lowercase() {
        assert_eq!(Shape::Circle.to_string(), "circle");
        assert_eq!(Shape::Square.to_string(), "square");
        assert_eq!(Shape::Triangle.to_string(), "triangle");
    }

    #[test]
    fn test_counts_from_sequence() {
        let seq = [Shape::Circle, Shape::Square, Shape::Circle];
        let counts = ShapeCounts::from_sequence(&seq);

        assert_eq!(counts.circle, 2);
        assert_eq!(counts.square, 1);
        assert_eq!(counts.triangle, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_counts_from_empty_sequence() {
        let counts = ShapeCounts::from_sequence(&[]);
        assert_eq!(counts, ShapeCounts::default());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_counts_degenerate_single_shape() {
        let seq = [Shape::Triangle; 7];
        let counts = ShapeCounts::from_sequence(&seq);

        assert_eq!(counts.triangle, 7);
        assert_eq!(counts.square, 0);
        assert_eq!(counts.circle, 0);
        assert_eq!(counts.total(), seq.len() as u32);
    }

    #[test]
    fn test_counts_get_matches_fields() {
        let counts = ShapeCounts::new(4, 2, 9);
        assert_eq!(counts.get(Shape::Square), 4);
        assert_eq!(counts.get(Shape::Triangle), 2);
        assert_eq!(counts.get(Shape::Circle), 9);
    }

    #[test]
    fn test_counts_serialize_field_names() {
        let counts = ShapeCounts::new(1, 2, 3);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["square"], 1);
        assert_eq!(json["triangle"], 2);
        assert_eq!(json["circle"], 3);
    }

    #[test]
    fn test_draft_complete_requires_all_fields() {
        let mut draft = AnswerDraft::default();
        assert_matches!(
            draft.complete(),
            Err(ExperimentError::IncompleteAnswer(Shape::Square))
        );

        draft.set(Shape::Square, Some(2));
        assert_matches!(
            draft.complete(),
            Err(ExperimentError::IncompleteAnswer(Shape::Triangle))
        );

        draft.set(Shape::Triangle, Some(0));
        assert_matches!(
            draft.complete(),
            Err(ExperimentError::IncompleteAnswer(Shape::Circle))
        );

        draft.set(Shape::Circle, Some(1));
        assert_eq!(draft.complete().unwrap(), ShapeCounts::new(2, 0, 1));
    }

    #[test]
    fn test_draft_zero_is_a_valid_count() {
        let draft = AnswerDraft {
            square: Some(0),
            triangle: Some(0),
            circle: Some(0),
        };
        assert_eq!(draft.complete().unwrap().total(), 0);
    }

    #[test]
    fn test_draft_clear() {
        let mut draft = AnswerDraft {
            square: Some(1),
            triangle: Some(2),
            circle: Some(3),
        };
        draft.clear();
        assert_eq!(draft, AnswerDraft::default());
    }
}
