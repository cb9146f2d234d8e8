//! File formats: YAML/CSV scenes in, CSV keyframes out.

pub mod keyframes_csv;
pub mod scene;

pub use keyframes_csv::CsvKeyframeWriter;
pub use scene::{Scene, SceneObject};
