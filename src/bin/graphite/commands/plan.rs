use std::fs;
use std::io::Write;

use anyhow::{Context, Result};

use graphite::nn::{NequIP, NequipConfig};

use crate::cli::PlanArgs;
use crate::display::{Context as DisplayContext, Progress, print_config_info, write_plan_table};

const TOTAL_STEPS: u8 = 2;

pub fn run_plan(args: PlanArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading configuration");
    let config = load_config(&args)?;
    let source = match &args.config {
        Some(path) => format!("Source: {}", path.display()),
        None => "Source: built-in defaults".to_string(),
    };
    progress.complete_step("Loading configuration", &[source.as_str()]);

    if ctx.interactive {
        print_config_info(&config);
    }

    progress.step("Assembling network");
    let model = NequIP::new(config).context("Failed to assemble the network")?;
    let summary = format!(
        "{} layers, output {}",
        model.layers().len(),
        model.irreps_out()
    );
    progress.complete_step("Assembling network", &[summary.as_str()]);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_plan_table(&mut out, model.plan())?;
    out.flush()?;

    progress.finish();
    Ok(())
}

fn load_config(args: &PlanArgs) -> Result<NequipConfig> {
    let Some(path) = &args.config else {
        return Ok(NequipConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    NequipConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid model configuration in {}", path.display()))
}
