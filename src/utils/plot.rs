use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::error::{AqiError, Result};
use crate::training::importance::FeatureImportance;

pub fn chart_title(n_features: usize) -> String {
    format!("Top {} Feature Importances (Gradient Boosting)", n_features)
}

fn render_err(err: impl std::fmt::Display) -> AqiError {
    AqiError::RenderError(err.to_string())
}

/// Horizontal bar chart, largest importance on top
pub fn render_importance_chart<P: AsRef<Path>>(entries: &[FeatureImportance], path: P) -> Result<()> {
    let path = path.as_ref();
    if entries.is_empty() {
        return Err(AqiError::RenderError("no importance scores to plot".to_string()));
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(render_err)?;
    }

    let n = entries.len();
    // y index 0 is the bottom bar
    let labels: Vec<String> = entries.iter().rev().map(|e| e.feature.clone()).collect();
    let max_importance = entries.iter().map(|e| e.importance).fold(0.0f64, f64::max);
    let x_max = if max_importance > 0.0 { max_importance * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(n), ("sans-serif", 36))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(220)
        .build_cartesian_2d(0f64..x_max, (0usize..n).into_segmented())
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Importance Score")
        .y_desc("Features")
        .y_labels(n)
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 20))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            Histogram::horizontal(&chart)
                .style(BLUE.mix(0.7).filled())
                .margin(6)
                .data(entries.iter().rev().enumerate().map(|(i, e)| (i, e.importance))),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!(path = %path.display(), bars = n, "Feature importance chart saved");
    Ok(())
}
