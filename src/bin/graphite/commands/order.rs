use std::io::Write;

use anyhow::{Context, Result, bail};

use graphite::graph::radius_graph;
use graphite::io::{Structure, xyz};
use graphite::{OrderParameters, SteinhardtConfig, steinhardt};

use crate::cli::OrderArgs;
use crate::display::{Context as DisplayContext, Progress, print_structure_info};
use crate::io::{create_output, open_input, stdin_is_tty};

const TOTAL_STEPS: u8 = 4;

pub fn run_order(args: OrderArgs, ctx: DisplayContext) -> Result<()> {
    if args.input.is_none() && stdin_is_tty() {
        bail!(
            "No input file specified and stdin is a terminal.\n\nUsage: graphite order -i <FILE.xyz> --cutoff <R> or pipe data via stdin."
        );
    }
    if args.cutoff.is_nan() || args.cutoff <= 0.0 {
        bail!("Cutoff radius must be positive, got {}", args.cutoff);
    }

    let config = SteinhardtConfig {
        degree: args.steinhardt.degree,
        parity: args.steinhardt.parity.into(),
        second_shell_average: !args.steinhardt.no_second_shell,
    };

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading structure");
    let input = open_input(args.input.as_deref())?;
    let structure = xyz::read(input).context("Failed to read XYZ structure")?;
    if structure.is_empty() {
        bail!("Input structure contains no atoms");
    }
    let read_summary = format!("{} atoms", structure.len());
    progress.complete_step("Reading structure", &[read_summary.as_str()]);

    progress.step("Building neighbour graph");
    let (edge_index, edge_vec) = radius_graph(&structure.positions, args.cutoff);
    let mean_degree = edge_index.len() as f64 / structure.len() as f64;
    let graph_substeps = [
        format!("Cutoff: {}", args.cutoff),
        format!("{} edges, {:.2} neighbours per atom", edge_index.len(), mean_degree),
    ];
    progress.complete_step(
        "Building neighbour graph",
        &graph_substeps.each_ref().map(String::as_str),
    );

    if ctx.interactive {
        print_structure_info(&structure, edge_index.len(), args.cutoff);
    }

    progress.step("Computing order parameters");
    let params = steinhardt(&edge_index, &edge_vec, structure.len(), &config)
        .context("Failed to compute Steinhardt order parameters")?;
    let degenerate = params.degenerate_nodes().len();
    let mut substeps = vec![format!("Degree: {}{}", config.degree, config.parity)];
    if config.second_shell_average {
        substeps.push("Second-shell averaging".to_string());
    }
    if degenerate > 0 {
        substeps.push(format!("{degenerate} atoms with undefined w"));
    }
    let substeps_ref: Vec<&str> = substeps.iter().map(|s| s.as_str()).collect();
    progress.complete_step("Computing order parameters", &substeps_ref);

    progress.step("Writing output");
    let mut out = create_output(args.output.as_deref())?;
    write_table(&mut out, &structure, &params).context("Failed to write order parameters")?;
    out.flush()?;
    let target = match &args.output {
        Some(path) => format!("File: {}", path.display()),
        None => "stdout".to_string(),
    };
    progress.complete_step("Writing output", &[target.as_str()]);

    progress.finish();
    Ok(())
}

fn write_table(
    out: &mut impl Write,
    structure: &Structure,
    params: &OrderParameters,
) -> std::io::Result<()> {
    writeln!(out, "# index element q w")?;
    for (idx, symbol) in structure.symbols.iter().enumerate() {
        writeln!(
            out,
            "{:>6} {:<4} {:>12.6} {:>12.6}",
            idx, symbol, params.q[idx], params.w[idx]
        )?;
    }
    Ok(())
}
