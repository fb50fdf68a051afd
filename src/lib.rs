use shadow_rs::shadow;

shadow!(build);

// Grid and costs
// --------------
pub mod collision;
pub mod cost;
pub mod cost_model;
pub mod costmap;
pub mod float_cost;
pub mod grid;
pub mod motion_model;

// Search
// ------
pub mod data_structures;
pub mod graph;
pub mod node;
pub mod search;

// Planning
// --------
pub mod config;
pub mod error;
pub mod path;
pub mod planner;
pub mod problem;

pub use config::PlannerConfig;
pub use costmap::Costmap2D;
pub use error::PlanError;
pub use grid::Cell;
pub use grid::WorldPoint;
pub use motion_model::MotionModel;
pub use path::Path;
pub use planner::Endpoint;
pub use planner::PlanRequest;
pub use planner::Planner2D;
