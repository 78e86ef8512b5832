mod order;
mod plan;

use order::run_order;
use plan::run_plan;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Plan(args) => run_plan(args, ctx),
        Command::Order(args) => run_order(args, ctx),
    }
}
