pub mod network;
pub mod spec;
pub mod validate;

pub use network::FlatNetwork;
pub use spec::{NetworkSpec, LayerSpec};
pub use validate::validate_network_for_training;
