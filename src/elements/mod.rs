//! Structural elements module

mod bar;
mod material;
mod node;
mod support;

pub use bar::Bar;
pub use material::Material;
pub use node::Node;
pub use support::Support;
