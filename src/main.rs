use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;

use ruslber::ber::{self, BerCursor, TagClass};
use ruslber::ldap::message::parse_message;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Pretty-print the BER element tree of a packet
    Dump {
        /// File holding the raw packet
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Packet as a hex string (whitespace ignored)
        #[clap(long)]
        hex: Option<String>,
    },
    /// Decode the packet as an LDAP message
    Message {
        #[clap(short, long)]
        file: Option<PathBuf>,

        #[clap(long)]
        hex: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Dump { file, hex } => {
            let packet = load_packet(file, hex)?;
            let mut cur = BerCursor::new(&packet);
            dump_region(&mut cur, packet.len(), 0)?;
        }
        Command::Message { file, hex } => {
            let packet = load_packet(file, hex)?;
            let message =
                parse_message(&packet).map_err(|e| anyhow!("failed to parse message: {e}"))?;
            println!("{message:#?}");
        }
    }
    Ok(())
}

fn load_packet(file: Option<PathBuf>, hex: Option<String>) -> Result<Vec<u8>> {
    match (file, hex) {
        (Some(path), None) => {
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
        }
        (None, Some(hex)) => parse_hex(&hex),
        _ => bail!("supply exactly one of --file and --hex"),
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex digit near offset {i}"))
        })
        .collect()
}

/// Walk every element up to `end`, descending into constructed ones.
fn dump_region(cur: &mut BerCursor<'_>, end: usize, depth: usize) -> Result<()> {
    while cur.pos() < end {
        let (tag, len) = cur.skip_tag()?;
        let indent = "  ".repeat(depth);
        let label = describe_tag(tag);

        if ber::is_constructed(tag) {
            if len > cur.remaining() {
                bail!(
                    "constructed element claims {len} bytes but only {} remain",
                    cur.remaining()
                );
            }
            println!("{indent}{label} len={len}");
            let child_end = cur.pos() + len;
            dump_region(cur, child_end, depth + 1)?;
        } else {
            let content = cur.read_slice(len)?;
            println!("{indent}{label} len={len} {}", preview(content));
        }
    }
    Ok(())
}

fn describe_tag(tag: ber::BerTag) -> String {
    let class = match ber::tag_class(tag) {
        TagClass::Universal => "UNIV",
        TagClass::Application => "APPL",
        TagClass::ContextSpecific => "CTXT",
        TagClass::Private => "PRIV",
    };
    let pc = if ber::is_constructed(tag) { "cons" } else { "prim" };
    format!("{class} {pc} {} (0x{tag:02X})", ber::tag_number(tag))
}

fn preview(content: &[u8]) -> String {
    const LIMIT: usize = 16;
    let shown = &content[..content.len().min(LIMIT)];
    let hex: Vec<String> = shown.iter().map(|b| format!("{b:02X}")).collect();
    let mut out = hex.join(" ");
    if content.len() > LIMIT {
        out.push_str(" ...");
    }
    if !content.is_empty() && content.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        out.push_str(&format!("  \"{}\"", String::from_utf8_lossy(content)));
    }
    out
}
