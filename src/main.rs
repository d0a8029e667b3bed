//! The refute executable: read a CNF problem, run one strategy, report.

use refute::{
    parse_cnf, saturate, BackwardSubsumptionMode, CondensationMode, DemodulationMode, Env,
    KboConfig, Options, ProofDisplay, SaturationAlgorithm, TerminationReason,
};
use std::process::ExitCode;

struct Args {
    input: String,
    options: Options,
    print_proof: bool,
    json_stats: bool,
}

impl Args {
    const HELP: &'static str = "
A saturation-based theorem prover for first-order logic with equality.

Usage:
    refute [OPTIONS] <INPUT>

Args:
    <INPUT>    Path to a problem file (cnf(...) subset of TPTP)

Options:
    -h, --help                     Print help
    --saturation-algorithm <ALG>   otter | discount | lrs [default: otter]
    --selection <N>                Literal selection policy (0, 20, 21, 22, 30)
    --age-weight-ratio <A:W>       Passive selection ratio [default: 1:4]
    --split-queue-ratios <R,..>    Enable the split-queue passive container
    --split-queue-cutoffs <C,..>   Niceness cutoffs (last must be 1.0)
    --split-queue-fade-in          Damp niceness at low theory-ancestor counts
    --backward-subsumption <M>     off | unit | on [default: on]
    --forward-demodulation <M>     off | preordered | on [default: on]
    --backward-demodulation <M>    off | preordered | on [default: on]
    --condensation <M>             off | fast | on [default: off]
    --incomplete                   Allow incompleteness-inducing options
    --time-limit <MS>              Time limit in milliseconds [default: 60000]
    --memory-limit <MB>            Memory limit in megabytes (0 = off)
    --random-seed <N>              Strategy random seed
    --no-proof                     Do not print the refutation
    --json-stats                   Print statistics as JSON
";

    fn parse() -> Result<Self, String> {
        let mut input: Option<String> = None;
        let mut options = Options::default();
        let mut print_proof = true;
        let mut json_stats = false;

        let mut args = std::env::args();
        args.next();

        while let Some(arg) = args.next() {
            let mut value = |name: &str| -> Result<String, String> {
                args.next().ok_or_else(|| format!("{} needs a value", name))
            };
            match arg.as_str() {
                "-h" | "--help" => {
                    println!("{}", Self::HELP);
                    std::process::exit(0);
                }
                "--saturation-algorithm" => {
                    options.saturation_algorithm = match value(&arg)?.as_str() {
                        "otter" => SaturationAlgorithm::Otter,
                        "discount" => SaturationAlgorithm::Discount,
                        "lrs" => SaturationAlgorithm::Lrs,
                        other => return Err(format!("unknown saturation algorithm '{}'", other)),
                    };
                }
                "--selection" => {
                    options.selection = value(&arg)?
                        .parse()
                        .map_err(|_| "selection must be an integer".to_string())?;
                }
                "--age-weight-ratio" => {
                    let raw = value(&arg)?;
                    let (a, w) = raw
                        .split_once(':')
                        .ok_or_else(|| "age-weight ratio must look like 'a:w'".to_string())?;
                    options.age_weight_ratio = (
                        a.parse().map_err(|_| "bad age ratio".to_string())?,
                        w.parse().map_err(|_| "bad weight ratio".to_string())?,
                    );
                }
                "--split-queue-ratios" => {
                    let ratios = value(&arg)?
                        .split(',')
                        .map(|r| r.parse::<u32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| "split queue ratios must be integers".to_string())?;
                    options.split_queue_ratios = Some(ratios);
                }
                "--split-queue-cutoffs" => {
                    let cutoffs = value(&arg)?
                        .split(',')
                        .map(|c| c.parse::<f32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| "split queue cutoffs must be floats".to_string())?;
                    options.split_queue_cutoffs = Some(cutoffs);
                }
                "--split-queue-fade-in" => options.split_queue_fade_in = true,
                "--backward-subsumption" => {
                    options.backward_subsumption = match value(&arg)?.as_str() {
                        "off" => BackwardSubsumptionMode::Off,
                        "unit" => BackwardSubsumptionMode::Unit,
                        "on" => BackwardSubsumptionMode::On,
                        other => return Err(format!("unknown subsumption mode '{}'", other)),
                    };
                }
                "--forward-demodulation" | "--backward-demodulation" => {
                    let mode = match value(&arg)?.as_str() {
                        "off" => DemodulationMode::Off,
                        "preordered" => DemodulationMode::Preordered,
                        "on" => DemodulationMode::On,
                        other => return Err(format!("unknown demodulation mode '{}'", other)),
                    };
                    if arg == "--forward-demodulation" {
                        options.forward_demodulation = mode;
                    } else {
                        options.backward_demodulation = mode;
                    }
                }
                "--condensation" => {
                    options.condensation = match value(&arg)?.as_str() {
                        "off" => CondensationMode::Off,
                        "fast" => CondensationMode::Fast,
                        "on" => CondensationMode::On,
                        other => return Err(format!("unknown condensation mode '{}'", other)),
                    };
                }
                "--incomplete" => options.complete = false,
                "--time-limit" => {
                    options.time_limit_ms = value(&arg)?
                        .parse()
                        .map_err(|_| "time limit must be milliseconds".to_string())?;
                }
                "--memory-limit" => {
                    options.memory_limit_mb = value(&arg)?
                        .parse()
                        .map_err(|_| "memory limit must be megabytes".to_string())?;
                }
                "--random-seed" => {
                    options.random_seed = value(&arg)?
                        .parse()
                        .map_err(|_| "random seed must be an integer".to_string())?;
                }
                "--no-proof" => print_proof = false,
                "--json-stats" => json_stats = true,
                _ if arg.starts_with('-') => return Err(format!("unknown option '{}'", arg)),
                _ => {
                    if input.is_some() {
                        return Err("too many positional arguments".to_string());
                    }
                    input = Some(arg);
                }
            }
        }

        Ok(Args {
            input: input.ok_or_else(|| "missing input file".to_string())?,
            options,
            print_proof,
            json_stats,
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::parse() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {}", message);
            eprintln!("{}", Args::HELP);
            return ExitCode::from(2);
        }
    };

    let content = match std::fs::read_to_string(&args.input) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("error: cannot read '{}': {}", args.input, err);
            return ExitCode::from(2);
        }
    };

    let mut env = Env::new();
    let inputs = match parse_cnf(&content, &mut env) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let (result, engine) = match saturate(env, KboConfig::default(), inputs, args.options) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let status = match result.termination {
        TerminationReason::Refutation => "Unsatisfiable",
        TerminationReason::Satisfiable => "Satisfiable",
        TerminationReason::RefutationNotFound => "GaveUp",
        TerminationReason::TimeLimit => "Timeout",
        TerminationReason::MemoryLimit => "MemoryOut",
        TerminationReason::Unknown => "Unknown",
    };
    println!("% SZS status {} for {}", status, args.input);

    if args.print_proof {
        if let Some(empty) = result.refutation {
            println!("% SZS output start Refutation");
            print!("{}", ProofDisplay::new(&engine.env, &engine.arena, empty));
            println!("% SZS output end Refutation");
        }
    }

    if args.json_stats {
        match serde_json::to_string_pretty(&result.statistics) {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("error: cannot serialize statistics: {}", err),
        }
    } else {
        println!("{}", result.statistics);
    }

    ExitCode::SUCCESS
}
