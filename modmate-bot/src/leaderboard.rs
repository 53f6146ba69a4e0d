//! Helper leaderboard backing document
//!
//! The leaderboard is a flat markdown table living in a platform document.
//! Updates are parse -> upsert -> re-sort -> full rewrite; there is no
//! partial-row edit path, so a failed write leaves the document either fully
//! old or fully new.
//!
//! Document layout (the header block is fixed-size):
//!
//! ```text
//! # Helper Leaderboard
//!
//! _Last updated: 2026-08-05_
//!
//! | User | Points | Last awarded |
//! |------|--------|--------------|
//! | u/alice | 5 | 2026-07-01 |
//! ```

use chrono::NaiveDate;
use modmate_common::events::mention;
use tracing::warn;

/// Title line of the rendered document
pub const DOCUMENT_TITLE: &str = "# Helper Leaderboard";

/// Lines before the first data row: title, blank, stamp, blank, column
/// header, delimiter
const HEADER_LINES: usize = 6;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One leaderboard row. `username` carries the `u/` mention prefix; it is
/// the unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub username: String,
    pub points: u32,
    pub last_awarded: NaiveDate,
}

/// Points value derived from a free-text helper label.
///
/// The final whitespace-delimited token is parsed as an integer; anything
/// else is a custom label. Custom labels are terminal: they are excluded
/// from the numeric leaderboard update path and never incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsLabel {
    Numeric(u32),
    Custom,
}

impl PointsLabel {
    pub fn parse(label: &str) -> Self {
        label
            .split_whitespace()
            .last()
            .and_then(|token| token.parse().ok())
            .map_or(PointsLabel::Custom, PointsLabel::Numeric)
    }
}

/// Parse the document into rows, skipping the fixed header block.
///
/// Rows that do not parse are dropped with a warning rather than failing
/// the whole document; a single hand-mangled row must not wedge grants.
pub fn load(document: &str) -> Vec<LeaderboardRow> {
    let mut rows = Vec::new();
    for line in document.lines().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        let parsed = match cells.as_slice() {
            [username, points, date] => points
                .parse::<u32>()
                .ok()
                .zip(NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
                .map(|(points, last_awarded)| LeaderboardRow {
                    username: (*username).to_string(),
                    points,
                    last_awarded,
                }),
            _ => None,
        };
        match parsed {
            Some(row) => rows.push(row),
            None => warn!(line, "skipping malformed leaderboard row"),
        }
    }
    rows
}

/// Award one point to `username`, inserting a new row on first grant.
/// Returns the row's new point total.
///
/// The mention prefix is applied to the key before comparison so the same
/// identity never splits into prefixed and bare rows.
pub fn upsert(rows: &mut Vec<LeaderboardRow>, username: &str, today: NaiveDate) -> u32 {
    let key = mention(username);
    if let Some(row) = rows.iter_mut().find(|row| row.username == key) {
        row.points += 1;
        row.last_awarded = today;
        return row.points;
    }
    rows.push(LeaderboardRow {
        username: key,
        points: 1,
        last_awarded: today,
    });
    1
}

/// Order rows by points descending, then oldest award first among ties.
/// Ties on points reward long-standing scorers: a recent equal score never
/// jumps a veteran.
pub fn sort_rows(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(a.last_awarded.cmp(&b.last_awarded))
    });
}

/// Serialize the full document: fixed header with a fresh stamp, then every
/// row in sorted order.
pub fn render(rows: &[LeaderboardRow], today: NaiveDate) -> String {
    let mut sorted = rows.to_vec();
    sort_rows(&mut sorted);

    let mut out = String::new();
    out.push_str(DOCUMENT_TITLE);
    out.push_str("\n\n");
    out.push_str(&format!("_Last updated: {}_\n\n", today.format(DATE_FORMAT)));
    out.push_str("| User | Points | Last awarded |\n");
    out.push_str("|------|--------|--------------|\n");
    for row in &sorted {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            row.username,
            row.points,
            row.last_awarded.format(DATE_FORMAT)
        ));
    }
    out
}
