use anyhow::Result;
use maud::{html, Markup};

use churnlens_classifiers::features::CategoricalField;
use churnlens_classifiers::io::reference_data::downsample;
use churnlens_classifiers::io::ReferenceDataset;
use churnlens_classifiers::report::plots::{
    plot_churn_split, plot_density_by_outcome, plot_feature_importance,
};
use churnlens_classifiers::report::{Report, ReportSection};
use churnlens_classifiers::ChurnPredictor;

use crate::predict::input::PredictConfig;
use crate::predict::predict::PredictOutcome;

const DOWNSAMPLE_SEED: u64 = 42;

fn prediction_section(outcome: &PredictOutcome) -> ReportSection {
    let mut section = ReportSection::new("Prediction");
    let banner_color = if outcome.label.is_churn() {
        "#d62728"
    } else {
        "#2ca02c"
    };
    section.add_content(html! {
        p style={ "font-size: 1.3em; font-weight: bold; color: " (banner_color) } {
            (outcome.message)
        }
        @if let Some(prob) = outcome.churn_probability {
            p { "Churn probability: " (format!("{:.1}%", prob * 100.0)) }
        }
    });
    section.add_content(input_table(outcome));
    section.add_content(html! {
        h3 { "Encoded features" }
        table {
            tr { th { "Column" } th { "Value" } }
            @for (column, value) in outcome.features.iter() {
                tr { td { (column) } td { (value) } }
            }
        }
    });
    section
}

fn input_table(outcome: &PredictOutcome) -> Markup {
    let customer = &outcome.customer;
    html! {
        h3 { "Customer" }
        table {
            tr { th { "Attribute" } th { "Value" } }
            @if let Some(id) = &customer.customer_id {
                tr { td { "customerID" } td { (id) } }
            }
            @for field in CategoricalField::ALL {
                tr { td { (field.name()) } td { (customer.categorical(field)) } }
            }
            tr { td { "tenure" } td { (customer.tenure) } }
            tr { td { "MonthlyCharges" } td { (format!("{:.2}", customer.monthly_charges)) } }
        }
    }
}

fn importance_section(predictor: &ChurnPredictor) -> Option<ReportSection> {
    let importances = predictor.model().feature_importances()?;
    let names = predictor
        .model()
        .feature_names()
        .unwrap_or(predictor.schema().columns());
    match plot_feature_importance(names, &importances, "Feature importance") {
        Ok(plot) => {
            let mut section = ReportSection::new("Feature importance");
            section.add_plot(plot);
            Some(section)
        }
        Err(e) => {
            log::warn!("Skipping feature importance plot: {}", e);
            None
        }
    }
}

fn insights_section(reference: &ReferenceDataset, max_points: usize) -> ReportSection {
    let mut section = ReportSection::new("Churn insights");
    let counts = reference.churn_counts();
    section.add_content(html! {
        p {
            (reference.len()) " reference customers, "
            (format!("{:.1}%", reference.churn_rate() * 100.0)) " churned."
        }
    });

    match plot_churn_split(&counts, "Churn rate") {
        Ok(plot) => section.add_plot(plot),
        Err(e) => log::warn!("Skipping churn rate plot: {}", e),
    }

    if let Some((retained, churned)) = reference.monthly_charges_by_outcome() {
        let retained = downsample(&retained, max_points, DOWNSAMPLE_SEED);
        let churned = downsample(&churned, max_points, DOWNSAMPLE_SEED);
        match plot_density_by_outcome(
            &retained,
            &churned,
            "Monthly Charges",
            "Monthly charges by churn outcome",
        ) {
            Ok(plot) => section.add_plot(plot),
            Err(e) => log::warn!("Skipping monthly charges plot: {}", e),
        }
    }

    if let Some((retained, churned)) = reference.tenure_by_outcome() {
        let retained = downsample(&retained, max_points, DOWNSAMPLE_SEED);
        let churned = downsample(&churned, max_points, DOWNSAMPLE_SEED);
        match plot_density_by_outcome(&retained, &churned, "Tenure", "Tenure by churn outcome") {
            Ok(plot) => section.add_plot(plot),
            Err(e) => log::warn!("Skipping tenure plot: {}", e),
        }
    }
    section
}

fn config_section(params: &PredictConfig) -> Result<ReportSection> {
    let mut section = ReportSection::new("Configuration");
    let json = serde_json::to_string_pretty(params)?;
    section.add_content(html! { pre { (json) } });
    Ok(section)
}

/// Assemble the prediction, chart and configuration sections and write the
/// HTML report to `params.report_file`.
pub fn build_predict_report(
    params: &PredictConfig,
    predictor: &ChurnPredictor,
    outcome: &PredictOutcome,
    reference: Option<&ReferenceDataset>,
) -> Result<Report> {
    let mut report = Report::new("churnlens", &params.version, "Customer Churn Prediction");
    report.add_section(prediction_section(outcome));
    if let Some(section) = importance_section(predictor) {
        report.add_section(section);
    }
    if let Some(reference) = reference {
        report.add_section(insights_section(reference, params.max_density_points));
    }
    report.add_section(config_section(params)?);
    Ok(report)
}

pub fn write_predict_report(
    params: &PredictConfig,
    predictor: &ChurnPredictor,
    outcome: &PredictOutcome,
    reference: Option<&ReferenceDataset>,
) -> Result<()> {
    let report = build_predict_report(params, predictor, outcome, reference)?;
    report.save_to_file(&params.report_file)
}
