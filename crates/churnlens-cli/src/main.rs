use anyhow::Result;
use clap::builder::{NonEmptyStringValueParser, PossibleValuesParser};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use churnlens_cli::predict::input::{PredictConfig, CATEGORICAL_FLAGS};
use churnlens_cli::predict::predict::run_prediction;
use churnlens_cli::score::score::{run_scoring, ScoreConfig};
use churnlens_cli::util::print_config_template;
use churnlens_classifiers::features::schema::MAX_TENURE;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CHURNLENS_LOG", "error,churnlens=info"))
        .init();

    let matches = Command::new("churnlens")
        .version(clap::crate_version!())
        .about("churnlens CLI - Customer churn prediction from raw customer attributes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(predict_command())
        .subcommand(
            Command::new("score")
                .about("Score every customer in a CSV table")
                .arg(
                    Arg::new("config")
                        .help("Path to scoring JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("customers")
                        .help(
                            "Path to the customer table (*.csv). Overrides the customers file \
                             specified in the configuration file.",
                        )
                        .value_parser(NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write the scored customers (CSV). Defaults to stdout.")
                        .value_parser(NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(model_path_arg())
                .arg(model_type_arg()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("score", sub_m)) => handle_score(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn model_path_arg() -> Arg {
    Arg::new("model_path")
        .short('m')
        .long("model")
        .help("Path to the model artifact. Overrides the artifact path in the configuration file.")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn model_type_arg() -> Arg {
    Arg::new("model_type")
        .long("model-type")
        .help("Override the model type from the JSON config.")
        .value_parser(["gbdt", "xgboost", "logistic"])
        .value_hint(ValueHint::Other)
}

fn predict_command() -> Command {
    let mut command = Command::new("predict")
        .about("Predict whether a single customer is likely to churn")
        .arg(
            Arg::new("config")
                .help("Path to prediction JSON configuration file")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("customer")
                .short('c')
                .long("customer")
                .help("JSON file with the customer's attributes. Replaces the customer in the config.")
                .value_parser(NonEmptyStringValueParser::new())
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("tenure")
                .long("tenure")
                .help("Months the customer has stayed with the company")
                .value_parser(clap::value_parser!(u32).range(0..=MAX_TENURE as i64)),
        )
        .arg(
            Arg::new("monthly_charges")
                .long("monthly-charges")
                .help("Amount charged to the customer each month")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(model_path_arg())
        .arg(model_type_arg())
        .arg(
            Arg::new("reference_data")
                .short('r')
                .long("reference-data")
                .help("CSV of historical customers with a Churn column, used for report charts")
                .value_parser(NonEmptyStringValueParser::new())
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("report_file")
                .short('o')
                .long("report")
                .help("Path of the HTML report")
                .value_parser(NonEmptyStringValueParser::new())
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("no_report")
                .long("no-report")
                .help("Disable HTML report generation.")
                .action(ArgAction::SetTrue),
        );

    for (field, flag) in CATEGORICAL_FLAGS {
        let levels: Vec<&'static str> = field.spec().domain().collect();
        command = command.arg(
            Arg::new(flag)
                .long(flag)
                .help(format!("Customer's {}", field.name()))
                .value_parser(PossibleValuesParser::new(levels)),
        );
    }
    command
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        eprintln!("[churnlens::predict] No config file provided; printing a template.");
        return print_config_template(&PredictConfig::default());
    };
    log::info!("[churnlens::predict] Using config: {:?}", config_path);

    let params = PredictConfig::from_arguments(config_path, matches)?;

    match run_prediction(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_score(matches: &ArgMatches) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        eprintln!("[churnlens::score] No config file provided; printing a template.");
        return print_config_template(&ScoreConfig::default());
    };
    log::info!("[churnlens::score] Using config: {:?}", config_path);

    let params = ScoreConfig::from_arguments(config_path, matches)?;

    match run_scoring(&params) {
        Ok(summary) => {
            log::info!(
                "[churnlens::score] Completed scoring {} customers ({} failed).",
                summary.scored + summary.failed,
                summary.failed
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Scoring failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
