pub mod io;
pub mod plot;

pub use io::{load_model, save_model};
pub use plot::render_importance_chart;
