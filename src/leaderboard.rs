//! Champions leaderboard derived from the Winners sheet.
//!
//! Each Winners row names one or more comma-separated winners sharing one
//! position label (I, II, or III). The leaderboard aggregates those rows
//! into per-player standings ranked by win count, then best finish, and
//! keeps everyone who lands on a medal rank - ties share the medal, and a
//! tie at the cutoff never drops anyone.
//!
//! This is a pure function over the raw rows: no I/O, recomputed on every
//! render from whatever dataset is current.

use std::collections::HashMap;

use crate::models::Record;

/// Column holding the comma-separated winner names.
const WINNERS_NAME_FIELD: &str = "Winners Name";

/// Column holding the position label (I / II / III).
const POSITION_FIELD: &str = "Position";

/// The board has three medal slots; ties at the boundary extend it.
const MEDAL_SLOTS: usize = 3;

/// One player's aggregated results, with their assigned dense rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    /// Number of Winners rows naming this player.
    pub wins: u32,
    /// Best finish seen, as a rank weight (3 = first place).
    pub best_weight: u8,
    /// Sum of rank weights across all wins. Display only, never a sort key.
    pub points: u32,
    /// Dense rank: ties share a rank, the next distinct standing gets +1.
    pub rank: u32,
}

impl Standing {
    /// True when two standings tie on both sort keys and so share a rank.
    fn ties_with(&self, other: &Standing) -> bool {
        self.wins == other.wins && self.best_weight == other.best_weight
    }
}

/// Map a position label to its rank weight. Higher is better; labels the
/// sheet authors invent beyond I/II/III still count as wins at weight 0.
pub fn rank_weight(position: &str) -> u8 {
    match position {
        "I" => 3,
        "II" => 2,
        "III" => 1,
        _ => 0,
    }
}

/// The position label a rank weight stands for, for display.
pub fn weight_label(weight: u8) -> &'static str {
    match weight {
        3 => "I",
        2 => "II",
        1 => "III",
        _ => "-",
    }
}

/// Compute the medal-rank leaderboard from raw Winners rows.
///
/// Rows missing either the name or position column are skipped. Names are
/// trimmed of surrounding whitespace but otherwise taken verbatim, so
/// "alice" and "Alice" are different players. Co-winners listed in one row
/// each get full credit for the shared position.
///
/// The result is deterministic for any ordering of the input: aggregation
/// is order-independent and the sort ends with an ascending-name tie-break.
pub fn compute_standings(records: &[Record]) -> Vec<Standing> {
    let mut table: HashMap<String, (u32, u8, u32)> = HashMap::new();

    for record in records {
        let (Some(names), Some(position)) =
            (record.text(WINNERS_NAME_FIELD), record.text(POSITION_FIELD))
        else {
            continue;
        };

        let weight = rank_weight(position);
        for name in names.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let entry = table.entry(name.to_string()).or_default();
            entry.0 += 1;
            entry.1 = entry.1.max(weight);
            entry.2 += u32::from(weight);
        }
    }

    let mut standings: Vec<Standing> = table
        .into_iter()
        .map(|(name, (wins, best_weight, points))| Standing {
            name,
            wins,
            best_weight,
            points,
            rank: 0,
        })
        .collect();

    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.best_weight.cmp(&a.best_weight))
            .then(a.name.cmp(&b.name))
    });

    // Fill the medal slots, then keep admitting only players tied with the
    // last one in. A full board shuts out lower scores even when their dense
    // rank would still be small, so nobody shares a medal they did not earn.
    let mut cut = 0;
    while cut < standings.len() {
        if cut >= MEDAL_SLOTS && !standings[cut].ties_with(&standings[cut - 1]) {
            break;
        }
        cut += 1;
    }
    standings.truncate(cut);

    // Dense ranks: ties share, the next distinct standing gets predecessor+1.
    let mut rank = 0;
    for i in 0..standings.len() {
        if i == 0 || !standings[i].ties_with(&standings[i - 1]) {
            rank += 1;
        }
        standings[i].rank = rank;
    }

    standings
}

// ============================================================================
// Tests
// ============================================================================
