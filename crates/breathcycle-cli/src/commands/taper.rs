use breathcycle_core::TaperPlan;
use clap::Args;

#[derive(Args, Debug)]
pub struct TaperArgs {
    /// Exhale duration in seconds
    #[arg(value_parser = clap::value_parser!(u32).range(1..=180))]
    pub exhale: u32,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: TaperArgs) -> Result<(), Box<dyn std::error::Error>> {
    let plan = TaperPlan::for_exhale(args.exhale);
    if args.json {
        let json = serde_json::json!({
            "exhale_secs": args.exhale,
            "wait_secs": plan.wait_secs,
            "repeats": plan.repeats,
            "final_inhale_offset_ms": plan.final_inhale_offset_ms(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!(
            "exhale {}s: wait {}s, {} repeats, final inhale after {}ms",
            args.exhale,
            plan.wait_secs,
            plan.repeats,
            plan.final_inhale_offset_ms()
        );
    }
    Ok(())
}
