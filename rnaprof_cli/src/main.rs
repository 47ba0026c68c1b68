#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use rayon::prelude::*;
use rnaprof::engine::{Config, Engine};
use rnaprof::fasta;
use rnaprof::params::Model;
use rnaprof::profile::{Profile, Track};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parameter sets selectable on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum EnergySet {
    #[default]
    Turner2004,
    Turner1999,
}

impl From<EnergySet> for Model {
    fn from(set: EnergySet) -> Self {
        match set {
            EnergySet::Turner2004 => Self::Turner2004,
            EnergySet::Turner1999 => Self::Turner1999,
        }
    }
}

/// Compute per-position structural-context profiles for RNA sequences.
#[derive(Parser)]
#[command(author, version, about)]
struct Opts {
    /// FASTA-like input file.
    input: PathBuf,
    /// Output file receiving the six probability tracks per record.
    output: PathBuf,
    /// States kept per DP column; 0 keeps everything.
    beam_size: usize,
    /// Print the ensemble free energy of each record, in kcal/mol.
    #[arg(short = 'e')]
    show_energy: bool,
    /// Nearest-neighbour parameter set.
    #[arg(long = "energy", value_enum, default_value = "turner2004")]
    energy: EnergySet,
    /// Label the multiloop track "Multibranch", as legacy builds did.
    #[arg(long)]
    multibranch: bool,
}

fn main() -> ExitCode {
    // usage problems exit 1 here, not clap's default 2
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            let informational = matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _ = err.print();
            return if informational {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<()> {
    let records = fasta::read_path(&opts.input)
        .with_context(|| format!("unable to read '{}'", opts.input.display()))?;

    let config = Config {
        beam_size: opts.beam_size,
        model: opts.energy.into(),
        ..Config::default()
    };

    // records are independent; every worker owns its engine
    let profiles: Vec<(Profile, f64)> = records
        .par_iter()
        .map(|record| {
            let mut engine = Engine::new(config);
            let profile = engine.run(&record.seq);
            (profile, engine.ensemble_energy())
        })
        .collect();

    let file = File::create(&opts.output)
        .with_context(|| format!("unable to write '{}'", opts.output.display()))?;
    let mut out = BufWriter::new(file);

    for (record, (profile, energy)) in records.iter().zip(&profiles) {
        writeln!(out, ">{}", record.name)?;
        for track in Track::ALL {
            writeln!(
                out,
                "{} {}",
                track.label(opts.multibranch),
                profile.track(track).iter().format(" ")
            )?;
        }
        writeln!(out)?;

        if opts.show_energy {
            println!(">{}\t{energy}", record.name);
        }
    }

    Ok(())
}
