//! Export format implementations.

mod coco;
mod json;
mod pascal_voc;

#[cfg(test)]
mod tests;

pub use coco::CocoFormat;
pub use json::JsonFormat;
pub use pascal_voc::PascalVocFormat;
