use std::io::IsTerminal;

use anyhow::{Context, Result};
use ansi_term::Colour;
use binutils::{clap, verbose};
use clap::{error::ErrorKind, CommandFactory, Parser};
use imul_sim::{
    arch_names, create_sim, msgs::parse_operand, parse_requests, HarnessOption, MulReqMsg,
    TestHarness,
};

/// Cycle-level simulator of an iterative 32-bit integer multiplier.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = binutils::get_styles(),
    arg_required_else_help = true,
)]
struct Args {
    /// First operand (decimal or 0x hex)
    a: Option<String>,

    /// Second operand (decimal or 0x hex)
    b: Option<String>,

    /// Read operand pairs from a file, one `a b` pair per line
    ///
    /// Blank lines and lines starting with `#` are skipped. This option is
    /// conflict with positional operands.
    #[arg(short = 'i', long)]
    input: Option<String>,

    /// Multiplier design to simulate
    #[arg(long, default_value = "var_lat")]
    arch: String,

    /// Print the cycle-by-cycle line trace
    #[arg(short = 't', long)]
    trace: bool,

    /// Idle cycles of the test source before every request
    #[arg(long, default_value_t = 0)]
    src_delay: u32,

    /// Cycles the test sink is not ready before every response
    #[arg(long, default_value_t = 0)]
    sink_delay: u32,

    /// Print logs during simulation
    #[command(flatten)]
    verbose: verbose::Verbosity,
}

fn load_requests(args: &Args) -> Result<Vec<MulReqMsg>> {
    if let Some(input) = &args.input {
        if args.a.is_some() {
            let mut cmd = Args::command();
            cmd.error(
                ErrorKind::ArgumentConflict,
                "Can't both specify input file and operands",
            )
            .exit();
        }
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("could not read file `{}`", input))?;
        return parse_requests(&content).with_context(|| format!("in file `{}`", input));
    }

    match (&args.a, &args.b) {
        (Some(a), Some(b)) => Ok(vec![MulReqMsg::new(parse_operand(a)?, parse_operand(b)?)]),
        _ => {
            let mut cmd = Args::command();
            cmd.error(
                ErrorKind::MissingRequiredArgument,
                "Expect two operands or an input file",
            )
            .exit();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = binutils::verbose_level_to_trace(args.verbose.log_level());
    binutils::logging_setup(log_level, None::<&std::fs::File>);

    if !arch_names().contains(&args.arch.as_str()) {
        let mut cmd = Args::command();
        cmd.error(
            ErrorKind::InvalidValue,
            format!(
                "unknown architecture `{}`, available: {}",
                args.arch,
                arch_names().join(", ")
            ),
        )
        .exit();
    }
    let reqs = load_requests(&args)?;

    let option = HarnessOption::default()
        .set_src_delay(args.src_delay)
        .set_sink_delay(args.sink_delay)
        .set_trace(args.trace);
    let mut harness = TestHarness::new(create_sim(&args.arch)?, option);
    for req in &reqs {
        harness.push(req.a, req.b);
    }
    let report = harness.run()?;

    let colored = std::io::stdout().is_terminal();
    for line in &report.trace {
        if colored {
            println!("{}", Colour::Cyan.paint(line.as_str()));
        } else {
            println!("{line}");
        }
    }
    for (req, res) in reqs.iter().zip(&report.results) {
        let product = format!("{res:#010x}");
        if colored {
            println!("{req} = {}", Colour::Green.bold().paint(product));
        } else {
            println!("{req} = {product}");
        }
    }
    println!("{} cycles", report.cycles);
    Ok(())
}
