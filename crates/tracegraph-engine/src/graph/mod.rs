pub mod layout;
pub mod model;
pub mod particles;
pub mod state;

pub use layout::{ForceLayout, LayoutState};
pub use model::{GraphModel, Link, Node};
pub use particles::ParticleField;
pub use state::EngineState;
