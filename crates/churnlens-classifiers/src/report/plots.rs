use plotly::common::{Fill, Marker, Mode, Orientation};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::io::reference_data::ChurnCounts;
use crate::stats::gaussian_kde;

pub const RETAINED_COLOR: &str = "#1f77b4";
pub const CHURNED_COLOR: &str = "#ff7f0e";

/// Plot feature importances as a horizontal bar chart, least important first.
pub fn plot_feature_importance(
    names: &[String],
    importances: &[f32],
    title: &str,
) -> Result<Plot, String> {
    if names.len() != importances.len() {
        return Err(format!(
            "{} feature names but {} importances",
            names.len(),
            importances.len()
        ));
    }

    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by(|&a, &b| {
        importances[a]
            .partial_cmp(&importances[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let sorted_names: Vec<String> = order.iter().map(|&i| names[i].clone()).collect();
    let sorted_values: Vec<f32> = order.iter().map(|&i| importances[i]).collect();

    let trace = Bar::new(sorted_values, sorted_names)
        .orientation(Orientation::Horizontal)
        .marker(Marker::new().color(RETAINED_COLOR))
        .name("Importance");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Importance"))
        .height(120 + 24 * names.len());

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

/// Plot the retained / churned split of the reference customers.
pub fn plot_churn_split(counts: &ChurnCounts, title: &str) -> Result<Plot, String> {
    let total = counts.total();
    if total == 0 {
        return Err("No customers to plot".to_string());
    }

    let pct = |n: usize| n as f64 * 100.0 / total as f64;
    let trace = Bar::new(
        vec!["Retained".to_string(), "Churned".to_string()],
        vec![counts.retained, counts.churned],
    )
    .text_array(vec![
        format!("{:.1}%", pct(counts.retained)),
        format!("{:.1}%", pct(counts.churned)),
    ])
    .marker(Marker::new().color_array(vec![RETAINED_COLOR, CHURNED_COLOR]))
    .name("Customers");

    let layout = Layout::new()
        .title(title)
        .y_axis(Axis::new().title("Customers"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

/// Overlay the density of a numeric column for churned and retained
/// customers.
pub fn plot_density_by_outcome(
    retained: &[f32],
    churned: &[f32],
    x_label: &str,
    title: &str,
) -> Result<Plot, String> {
    let mut plot = Plot::new();
    let mut drawn = 0;

    for (values, name, color) in [
        (churned, "Churned", CHURNED_COLOR),
        (retained, "Retained", RETAINED_COLOR),
    ] {
        match gaussian_kde(values, 256) {
            Some(curve) => {
                let trace = Scatter::new(curve.x, curve.density)
                    .mode(Mode::Lines)
                    .fill(Fill::ToZeroY)
                    .line(plotly::common::Line::new().color(color))
                    .name(name);
                plot.add_trace(trace);
                drawn += 1;
            }
            None => log::warn!(
                "Not enough {} samples ({}) for a density estimate",
                name.to_lowercase(),
                values.len()
            ),
        }
    }

    if drawn == 0 {
        return Err(format!("No density could be estimated for {}", x_label));
    }

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title(x_label))
            .y_axis(Axis::new().title("Density")),
    );
    Ok(plot)
}
