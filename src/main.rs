use aqi_forecast::{Pipeline, PipelineConfig};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqi_forecast=info".into()),
        )
        .init();

    let pipeline = Pipeline::new(PipelineConfig::default());
    let summary = pipeline.run().context("training run failed")?;

    println!("Model saved to {}", summary.model_path.display());
    println!("Feature importance chart saved to {}", summary.chart_path.display());
    println!(
        "{} feature rows from {} cities ({} rows after cleaning, {} loaded)",
        summary.feature_rows, summary.cities, summary.cleaned_rows, summary.loaded_rows
    );

    Ok(())
}
