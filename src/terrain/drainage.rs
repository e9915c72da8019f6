pub mod generate_flow;
pub use generate_flow::generate_flow;
pub use generate_flow::traverse_flow_graph;
pub use generate_flow::{DistanceCost, Flow, FlowAssignment, RadialCost};

pub mod generate_order;
pub use generate_order::generate_stream_order;
pub use generate_order::{DrainageForest, StreamOrder};
