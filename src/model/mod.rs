pub mod decision_tree;
pub mod gradient_boosting;

pub use decision_tree::RegressionTree;
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
