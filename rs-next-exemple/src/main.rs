use std::collections::HashSet;
use std::path::Path;

use rs_next_core::evaluation::{self, Harness};
use rs_next_core::io::History;
use rs_next_core::{ModelKind, PredictError, PredictionModel, Settings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional config path, defaults apply when the file does not exist
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "rs-next.toml".to_owned());
    let settings = if Path::new(&config_path).exists() {
        Settings::load(&config_path)?
    } else {
        tracing::info!(config_path = %config_path, "no configuration file, using defaults");
        Settings::default()
    };

    // Load the history (a .bin snapshot is reused when up to date)
    let history = History::load(&settings.history.path, settings.history.cache)?;
    let symbols = history.symbols();
    let (train, held_out) = evaluation::split_train_eval(symbols, settings.evaluation.train_ratio)?;

    let counts = evaluation::symbol_counts(symbols);
    println!("All symbols (dataset) {}", symbols.len());
    println!("Different symbols {}", counts.len());
    println!("Top 5 symbols: {:?}", &counts[..counts.len().min(5)]);
    let pairs = evaluation::pair_counts(symbols);
    println!("Top 5 pairs: {:?}", &pairs[..pairs.len().min(5)]);

    // Train every model on the same prefix
    let mut models: Vec<Box<dyn PredictionModel + Send>> = Vec::new();
    for kind in ModelKind::ALL {
        let mut model = kind.build(&settings.adaptive)?;
        for symbol in train {
            model.update(symbol);
        }
        models.push(model);
    }

    let top_n = &settings.evaluation.top_n;
    let frequent = evaluation::most_frequent(symbols, settings.evaluation.frequent_fraction);
    let rare = evaluation::least_frequent(symbols, settings.evaluation.rare_fraction);

    report("all symbols", &models, held_out, top_n, None)?;
    report(&format!("{} most frequent symbols", frequent.len()), &models, held_out, top_n, Some(&frequent))?;
    report(&format!("{} least frequent symbols", rare.len()), &models, held_out, top_n, Some(&rare))?;

    if settings.evaluation.online {
        println!("\nOnline evaluation (models keep learning), top {}:", top_n.last().copied().unwrap_or(1));
        let harness = Harness::new(top_n.last().copied().unwrap_or(1));
        for model in models.iter_mut() {
            let name = model.name().to_owned();
            print_rate(&name, harness.evaluate_online(&mut **model, held_out));
        }
    }

    println!("\nDecay rate sweep (initial weight {}):", settings.adaptive.initial_weight);
    let curves = evaluation::sweep_decay_rates(
        train,
        held_out,
        &settings.evaluation.decay_rates,
        top_n,
        settings.adaptive.initial_weight,
        None,
    )?;
    for curve in curves {
        println!("  alpha={:<5} {}", curve.decay_rate, format_curve(&curve.hit_rates));
    }

    Ok(())
}

/// Prints the top-N curve of every model for one context subset.
///
/// An empty subset is reported instead of failing the whole run.
fn report(
    title: &str,
    models: &[Box<dyn PredictionModel + Send>],
    held_out: &[String],
    top_n: &[usize],
    restrict_to: Option<&HashSet<String>>,
) -> Result<(), PredictError> {
    println!("\nPrediction success rate ({title}):");
    for model in models {
        match evaluation::sweep_top_n(&**model, held_out, top_n, restrict_to) {
            Ok(curve) => println!("  {:<34} {}", model.name(), format_curve(&curve)),
            Err(PredictError::EmptyEvaluationSet) => {
                println!("  {:<34} nothing to score", model.name());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn print_rate(name: &str, rate: Result<f64, PredictError>) {
    match rate {
        Ok(rate) => println!("  {name:<34} {rate:.3}"),
        Err(e) => println!("  {name:<34} {e}"),
    }
}

fn format_curve(curve: &[(usize, f64)]) -> String {
    curve
        .iter()
        .map(|(n, rate)| format!("top{n}={rate:.3}"))
        .collect::<Vec<_>>()
        .join(" ")
}
