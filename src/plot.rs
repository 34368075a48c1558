use std::{
    error::Error,
    fmt::{self, Display},
    path::Path,
};

use crate::training::LossHistory;

/// Errors of the optional loss curve rendering, none of them are fatal.
#[derive(Debug)]
pub enum PlotErr {
    /// The crate was built without the `plot` feature.
    Unavailable,
    NothingToPlot,
    Render(String),
}

impl Display for PlotErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotErr::Unavailable => write!(
                f,
                "plotting is unavailable, rebuild with `--features plot` to draw the loss curve"
            ),
            PlotErr::NothingToPlot => write!(f, "the loss history has no finite value to plot"),
            PlotErr::Render(msg) => write!(f, "failed to render the loss curve: {msg}"),
        }
    }
}

impl Error for PlotErr {}

/// Collects the finite `(step / 1000, loss)` points of a history.
fn curve(history: &LossHistory) -> Vec<(f32, f32)> {
    history
        .points()
        .filter(|(_, loss)| loss.is_finite())
        .map(|(step, loss)| (step as f32 / 1000.0, loss))
        .collect()
}

#[cfg(feature = "plot")]
fn render_err<E: Display>(e: E) -> PlotErr {
    PlotErr::Render(e.to_string())
}

/// Draws the loss history as a line chart into an SVG file.
///
/// # Arguments
/// * `history` - The recorded losses.
/// * `path` - Where to write the chart.
#[cfg(feature = "plot")]
pub fn plot_loss_history(history: &LossHistory, path: &Path) -> Result<(), PlotErr> {
    use plotters::prelude::*;

    let points = curve(history);
    let Some(&(x_max, _)) = points.last() else {
        return Err(PlotErr::NothingToPlot);
    };

    let (y_min, y_max) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    let pad = ((y_max - y_min) * 0.05).max(f32::EPSILON);

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Newton-Schulz fit loss", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f32..x_max.max(1.0), (y_min - pad)..(y_max + pad))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("step (x1000)")
        .y_desc("loss")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(render_err)?;

    root.present().map_err(render_err)
}

#[cfg(not(feature = "plot"))]
pub fn plot_loss_history(history: &LossHistory, _path: &Path) -> Result<(), PlotErr> {
    if curve(history).is_empty() {
        return Err(PlotErr::NothingToPlot);
    }

    Err(PlotErr::Unavailable)
}
