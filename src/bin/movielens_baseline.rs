extern crate failure;
extern crate getopts;
extern crate ifrec;

use std::env;

use getopts::Options;

use ifrec::ImplicitFeedbackModel;
use ifrec::datasets::{Movielens, MovielensVariant};
use ifrec::evaluation::{Evaluator, HeldOutScorer};
use ifrec::models::popularity::Hyperparameters;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt(
        "",
        "num_epochs",
        "Number of fit/evaluate rounds (optional, defaults to 5).",
        "NUMBER",
    );
    opts.optopt(
        "",
        "num_components",
        "Width of the factor matrices (optional, defaults to 20).",
        "NUMBER",
    );
    opts.optopt(
        "",
        "weight_decay",
        "Damping term applied to the interaction counts (optional, defaults to 0.1).",
        "NUMBER",
    );
    opts.optopt(
        "",
        "num_threads",
        "Thread count hint forwarded to the model (optional, defaults to 8).",
        "NUMBER",
    );
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(error) => {
            let hint = error.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let num_epochs: usize = match matches.opt_get_default("num_epochs", 5) {
        Ok(value) => value,
        Err(error) => {
            let hint = format!("Problem with option 'num_epochs': {}", error);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let num_components: usize = match matches.opt_get_default("num_components", 20) {
        Ok(value) => value,
        Err(error) => {
            let hint = format!("Problem with option 'num_components': {}", error);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let weight_decay: f32 = match matches.opt_get_default("weight_decay", 0.1) {
        Ok(value) => value,
        Err(error) => {
            let hint = format!("Problem with option 'weight_decay': {}", error);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let num_threads: usize = match matches.opt_get_default("num_threads", 8) {
        Ok(value) => value,
        Err(error) => {
            let hint = format!("Problem with option 'num_threads': {}", error);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    run(num_epochs, num_components, weight_decay, num_threads).unwrap();
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn run(
    num_epochs: usize,
    num_components: usize,
    weight_decay: f32,
    num_threads: usize,
) -> Result<(), failure::Error> {
    let dataset = Movielens::load(MovielensVariant::Ml100K, 4.0)?;

    let evaluator = HeldOutScorer::new(dataset.test());
    let mut model = Hyperparameters::new(num_components)
        .weight_decay(weight_decay)
        .build();

    for _ in 0..num_epochs {
        model.fit(dataset.train(), 1, num_threads, false)?;

        let score = evaluator.evaluate(model.user_factors(), model.item_factors())?;
        println!("{}", score);
    }

    Ok(())
}
