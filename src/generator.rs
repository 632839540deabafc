use crate::config::ModeConfig;
use crate::shape::{Shape, ShapeCounts};
use rand::Rng;

/// Builds one randomized stimulus sequence and its ground-truth counts.
///
/// Length is drawn uniformly from `min_shapes..=max_shapes`; each position
/// is an independent uniform draw over the three shapes. This is not a
/// fixed-composition shuffle: the per-shape counts are themselves random and
/// can be arbitrarily skewed, which is the intended cognitive load.
pub fn generate<R: Rng>(cfg: &ModeConfig, rng: &mut R) -> (Vec<Shape>, ShapeCounts) {
    let len = rng.gen_range(cfg.min_shapes..=cfg.max_shapes) as usize;
    let sequence: Vec<Shape> = (0..len)
        .map(|_| Shape::ALL[rng.gen_range(0..Shape::ALL.len())])
        .collect();
    let counts = ShapeCounts::from_sequence(&sequence);
    (sequence, counts)
}
