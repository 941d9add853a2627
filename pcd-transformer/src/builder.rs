use crate::transform::{translation::TranslationTransform, CompositeTransform, Transform};

pub trait TransformBuilder {
    fn build(&self) -> Box<dyn Transform>;
}

/// Builds the transform applied to the second sequence before merging.
pub struct ShiftTransformBuilder {
    pub shift: [f64; 3],
}

impl ShiftTransformBuilder {
    pub fn new(shift: [f64; 3]) -> Self {
        Self { shift }
    }
}

impl TransformBuilder for ShiftTransformBuilder {
    fn build(&self) -> Box<dyn Transform> {
        let translation = Box::new(TranslationTransform::new(self.shift));

        Box::new(CompositeTransform::new(vec![translation]))
    }
}
