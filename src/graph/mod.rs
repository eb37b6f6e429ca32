pub mod resolver;
pub mod store;

pub use resolver::{
    fetch_candidates, Exclusions, LinkError, LinkPicker, LinkResolver, SearchRequest,
};
pub use store::{DependencyStore, EdgeAction, ReconcilePlan, ReconcileReport};
