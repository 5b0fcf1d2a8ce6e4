use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use wien2k_struct::io::{load_structure, save_structure};
use wien2k_struct::utils::logger;
use wien2k_struct::{Config, MoyoAnalyzer, StructureFile};

#[derive(Parser)]
#[command(author, version, about = "WIEN2k case.struct converter")]
struct Cli {
    /// More output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converts between .struct and POSCAR, optionally building a supercell.
    Convert {
        input: PathBuf,

        output: PathBuf,

        /// Supercell factors along a, b and c.
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"])]
        multiples: Option<Vec<i64>>,

        /// Find the space group and equivalent atoms before writing.
        #[arg(long)]
        symmetrize: bool,

        /// Orbit expansion depth used when reading symmetry operations.
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        depth: Option<usize>,
    },

    /// Prints a summary of a structure file.
    Info {
        input: PathBuf,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose)).context("installing logger")?;

    let (mut config, message) = Config::load();
    info!("{}", message);

    match cli.command {
        Commands::Convert {
            input,
            output,
            multiples,
            symmetrize,
            depth,
        } => {
            if let Some(depth) = depth {
                config.orbit.depth = depth;
            }

            let mut structure = load_structure(&input, &config)
                .with_context(|| format!("reading {}", input.display()))?;

            if symmetrize {
                structure.analyze_symmetry(&MoyoAnalyzer::new(config.symprec))?;
            }

            if let Some(m) = multiples {
                if let [a, b, c] = m[..] {
                    structure.tweak_cell_multiples(a, b, c);
                }
                if !structure.multiples().is_unit() && structure.writes_symmetry() {
                    warn!("Symmetry operations are not written for a supercell");
                }
            }

            save_structure(&output, &structure)
                .with_context(|| format!("writing {}", output.display()))?;

            for line in structure.tweak_log() {
                info!("{}", line);
            }
            println!(
                "{} -> {} ({} atoms, {} non-equivalent)",
                input.display(),
                output.display(),
                structure.atoms().len() * structure.multiples().count(),
                structure.non_equivalent_count()
            );
        }

        Commands::Info { input, json } => {
            let structure = load_structure(&input, &config)
                .with_context(|| format!("reading {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&structure.summary())?);
            } else {
                print_info(&structure);
            }
        }
    }

    Ok(())
}

fn print_info(structure: &StructureFile) {
    let cell = structure.cell();
    println!("Title        : {}", structure.title());
    println!(
        "Lattice      : {} ({})",
        structure.lattice_type(),
        structure.calc_mode()
    );
    println!(
        "Cell (bohr)  : a={:.6} b={:.6} c={:.6}",
        cell.a, cell.b, cell.c
    );
    println!(
        "Angles (deg) : alpha={:.6} beta={:.6} gamma={:.6}",
        cell.alpha, cell.beta, cell.gamma
    );
    println!(
        "Atoms        : {} ({} non-equivalent)",
        structure.atoms().len(),
        structure.non_equivalent_count()
    );
    println!("Operations   : {}", structure.operations().len());
    if let Some(sg) = structure.space_group() {
        println!("Space group  : {} ({})", sg.symbol, sg.number);
    }

    println!();
    for (i, members) in structure.groups().iter().enumerate() {
        let atom = &structure.atoms()[members[0]];
        let p = atom.position();
        println!(
            "{:>4} {:<2} x{:<3} {:10.8} {:10.8} {:10.8}  RMT={:.2}",
            i + 1,
            atom.symbol(),
            members.len(),
            p[0],
            p[1],
            p[2],
            atom.rmt()
        );
    }
}
