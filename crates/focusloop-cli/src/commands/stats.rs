use std::rc::Rc;

use clap::Subcommand;

use focusloop_core::{CoreError, StatsEngine};

use super::print_json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// Lifetime aggregate
    All,
    /// Daily buckets from the last N days, oldest first
    Recent {
        #[arg(default_value = "7")]
        days: usize,
    },
    /// Current and longest streak
    Streak,
    /// Reset all statistics to zero
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), CoreError> {
    let store = super::open_store();
    let mut stats = StatsEngine::new(Rc::clone(&store));

    match action {
        StatsAction::Today => print_json(&stats.get_today_stats())?,
        StatsAction::All => print_json(&stats.get_stats())?,
        StatsAction::Recent { days } => print_json(&stats.get_recent_stats(days))?,
        StatsAction::Streak => {
            let all = stats.get_stats();
            print_json(&serde_json::json!({
                "current_streak": all.current_streak,
                "longest_streak": all.longest_streak,
            }))?;
        }
        StatsAction::Reset { yes } => {
            if !yes {
                return Err(CoreError::Custom(
                    "refusing to reset statistics without --yes".to_string(),
                ));
            }
            stats.reset_stats();
            print_json(&stats.get_stats())?;
        }
    }
    Ok(())
}
