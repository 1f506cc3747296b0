//! Ego-network construction: tuple ranking and node/edge assembly.

mod builder;
mod reducer;
mod types;

pub use builder::GraphBuilder;
pub use reducer::{Reduced, reduce, score};
pub use types::{
	ANCHOR_ID, EgoGraph, GraphEdge, GraphNode, PeerActivation, Position, RelationshipTuple,
	SentimentLink,
};
