use chrono::{DateTime, Utc};
use clap::Parser;

/// Wait until the next vouch for one (voucher, target, game), or the tier of a reputation.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Reference instant (RFC 3339), defaults to now.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Print the tier of this reputation instead.
    #[arg(long, allow_hyphen_values = true)]
    tier: Option<i64>,

    /// Previous vouch timestamps (RFC 3339), most recent first.
    timestamps: Vec<DateTime<Utc>>,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    if let Some(reputation) = args.tier {
        println!("{}", process::tier_report(reputation));
        return Ok(());
    }

    let now = args.now.unwrap_or_else(Utc::now);
    let report = process::cooldown_report(now, &args.timestamps)?;

    println!("{report}");

    Ok(())
}
