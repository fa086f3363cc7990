use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use gsx_core::{run, translate, Machine, Register};

/// Assemble a GSX listing, execute it, and dump the final register file.
#[derive(Parser, Debug)]
#[command(name = "gsx-run", version)]
struct Args {
    /// Source listing; reads stdin when omitted.
    source: Option<PathBuf>,

    /// Stop after translation; report syntax errors only.
    #[arg(long)]
    check: bool,

    /// Print the final register file as JSON.
    #[arg(long)]
    json: bool,

    /// Preseed a register before execution, e.g. `--set t=2.5`. Repeatable.
    #[arg(long = "set", value_name = "REG=VALUE")]
    presets: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = match &args.source {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let translation = translate(&source);
    if !translation.errors.is_empty() {
        for error in &translation.errors {
            eprintln!("{error}");
        }
        bail!("{} line(s) did not translate", translation.errors.len());
    }
    if args.check {
        return Ok(());
    }

    let mut machine = Machine::new();
    for preset in &args.presets {
        apply_preset(&mut machine, preset)?;
    }
    run(&translation.bytecode, &mut machine)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&machine.registers)?);
    } else {
        for reg in [
            Register::Pc,
            Register::As,
            Register::Js,
            Register::T,
            Register::R,
            Register::Y,
        ] {
            println!("{reg} = {}", machine.registers.get(reg));
        }
    }
    Ok(())
}

/// Parse `REG=VALUE` and write it through the register's width gate.
fn apply_preset(machine: &mut Machine, preset: &str) -> Result<()> {
    let (name, value) = preset
        .split_once('=')
        .ok_or_else(|| anyhow!("malformed --set '{preset}', expected REG=VALUE"))?;
    let register = Register::from_str(name.trim())?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("value in --set '{preset}'"))?;
    machine.registers.set(register, value);
    Ok(())
}
