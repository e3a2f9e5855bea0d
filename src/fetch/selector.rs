//! Picks the winning strategy outcome.
//!
//! The largest non-empty member set wins; ties go to the earlier strategy.
//! A fast but incomplete answer never beats a complete one that also made
//! its deadline.

use crate::fetch::executor::SettledStrategy;
use crate::fetch::types::StrategyKind;
use crate::roster::MemberSet;

/// The chosen result.
#[derive(Debug)]
pub struct Selection {
    pub strategy: StrategyKind,
    pub members: MemberSet,
}

/// Select the best settled outcome, or `None` if nothing usable settled.
pub fn select_best(settled: Vec<SettledStrategy>) -> Option<Selection> {
    let mut best: Option<Selection> = None;

    for result in settled {
        let Ok(members) = result.outcome else {
            continue;
        };
        if members.is_empty() {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |current| members.len() > current.members.len());
        if better {
            best = Some(Selection {
                strategy: result.strategy.kind,
                members,
            });
        }
    }

    best
}
