use std::path::{Path, PathBuf};

use async_trait::async_trait;
use plotters::prelude::*;
use tracing::debug;
use uuid::Uuid;

use common::{ChartHandle, Error, PricePoint, Result, TrendRenderer, TrendSummary};

/// Renders the close series to a PNG under `chart_dir` and hands back the
/// URL it is served from. File names carry a fresh UUID so the LINE image
/// CDN never serves a stale chart for a re-queried stock.
pub struct TrendChartRenderer {
    chart_dir: PathBuf,
    public_base_url: String,
}

impl TrendChartRenderer {
    pub fn new(chart_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            chart_dir: chart_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, filename: &str) -> String {
        format!("{}/charts/{filename}", self.public_base_url)
    }
}

#[async_trait]
impl TrendRenderer for TrendChartRenderer {
    async fn render_trend(
        &self,
        stock_id: &str,
        series: &[PricePoint],
        summary: &TrendSummary,
    ) -> Result<ChartHandle> {
        let filename = format!("{stock_id}_{}.png", Uuid::new_v4());
        let path = self.chart_dir.join(&filename);

        let stock_id = stock_id.to_string();
        let series = series.to_vec();
        let summary = *summary;
        let draw_path = path.clone();

        // plotters is synchronous CPU work; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || draw_chart(&draw_path, &stock_id, &series, &summary))
            .await
            .map_err(|e| Error::Render(e.to_string()))??;

        debug!(path = %path.display(), "Trend chart written");
        Ok(ChartHandle {
            url: self.chart_url(&filename),
        })
    }
}

fn draw_chart(
    path: &Path,
    stock_id: &str,
    series: &[PricePoint],
    summary: &TrendSummary,
) -> Result<()> {
    if series.is_empty() {
        return Err(Error::Render("empty price series".to_string()));
    }

    let render = |e: &dyn std::fmt::Display| Error::Render(e.to_string());

    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render(&e))?;

    let span = (summary.max_price - summary.min_price).max(1.0);
    let y_range = (summary.min_price - span * 0.15)..(summary.max_price + span * 0.15);
    let x_end = series.len().saturating_sub(1).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{stock_id} 最近{}日收盤價", series.len()),
            ("sans-serif", 24),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(0..x_end, y_range)
        .map_err(|e| render(&e))?;

    chart
        .configure_mesh()
        .x_labels(series.len().min(10))
        .x_label_formatter(&|i| {
            series
                .get(*i)
                .map(|p| p.date.format("%m-%d").to_string())
                .unwrap_or_default()
        })
        .y_desc("收盤價(元)")
        .draw()
        .map_err(|e| render(&e))?;

    chart
        .draw_series(LineSeries::new(
            series.iter().enumerate().map(|(i, p)| (i, p.close)),
            &BLUE,
        ))
        .map_err(|e| render(&e))?;
    chart
        .draw_series(
            series
                .iter()
                .enumerate()
                .map(|(i, p)| Circle::new((i, p.close), 3, BLUE.filled())),
        )
        .map_err(|e| render(&e))?;

    // Mark the extrema the summarizer picked.
    let max_idx = series
        .iter()
        .position(|p| p.date == summary.max_date)
        .unwrap_or(0);
    let min_idx = series
        .iter()
        .position(|p| p.date == summary.min_date)
        .unwrap_or(0);

    chart
        .draw_series(std::iter::once(TriangleMarker::new(
            (max_idx, summary.max_price),
            8,
            RED.filled(),
        )))
        .map_err(|e| render(&e))?;
    chart
        .draw_series(std::iter::once(TriangleMarker::new(
            (min_idx, summary.min_price),
            8,
            BLUE.filled(),
        )))
        .map_err(|e| render(&e))?;
    chart
        .draw_series(std::iter::once(Text::new(
            format!("最高{}", summary.max_price),
            (max_idx, summary.max_price + span * 0.06),
            ("sans-serif", 14).into_font().color(&RED),
        )))
        .map_err(|e| render(&e))?;
    chart
        .draw_series(std::iter::once(Text::new(
            format!("最低{}", summary.min_price),
            (min_idx, summary.min_price - span * 0.1),
            ("sans-serif", 14).into_font().color(&BLUE),
        )))
        .map_err(|e| render(&e))?;

    root.present().map_err(|e| render(&e))?;
    Ok(())
}
