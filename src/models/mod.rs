//! Model artifacts and inference backends

pub mod inference;
pub mod loader;
pub mod scaler;

pub use inference::{LogisticModel, OnnxModel, RiskModel};
pub use loader::{Artifacts, ModelLoader};
pub use scaler::StandardScaler;
