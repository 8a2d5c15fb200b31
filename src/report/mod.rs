//! Message formatting.
//!
//! Renders change records and win-rate leaderboards into chat-ready text.
//! Bold markers use the `*text*` convention of the delivery channel.

pub mod payload;

pub use payload::DeliveryPayload;

use crate::models::{ChampionMastery, ChangeRecord, QueueType, TopChange, WinRateRecord};

/// Header line of every change digest.
pub const CHANGES_HEADER: &str = "*ELO CHANGES UPDATE*";

/// Body used when a run detects nothing.
pub const NO_CHANGES: &str = "No ELO changes detected.";

/// Body used when a leaderboard has no rows.
pub const NO_DATA: &str = "No data available.";

/// Display name for a queue key.
///
/// Known API keys map to their display names; anything else (including a
/// name that is already a display name) passes through unchanged.
pub fn queue_display_name(key: &str) -> &str {
    QueueType::from_riot_key(key)
        .map(|q| q.display_name())
        .unwrap_or(key)
}

/// Position of a queue group in the digest; unknown queues go last.
fn queue_order(display_name: &str) -> usize {
    QueueType::ALL
        .iter()
        .position(|q| q.display_name() == display_name)
        .unwrap_or(QueueType::ALL.len())
}

/// One digest line: "<player> - <standing> (<lp> LP) <description>".
pub fn format_change_line(change: &ChangeRecord) -> String {
    format!(
        "{} - {} ({} LP) {}",
        change.player_id, change.current_tier_division, change.current_lp, change.description
    )
}

/// Group records by queue and order each group worst standing first.
///
/// Groups keep first-appearance order after the known queues. Inside a
/// group: tier ascending, division IV..I, then LP descending.
fn grouped(changes: &[ChangeRecord]) -> Vec<(String, Vec<&ChangeRecord>)> {
    let mut groups: Vec<(String, Vec<&ChangeRecord>)> = Vec::new();

    for change in changes {
        let name = queue_display_name(&change.queue_display_name).to_string();
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, members)) => members.push(change),
            None => groups.push((name, vec![change])),
        }
    }

    groups.sort_by_key(|(name, _)| queue_order(name));

    for (_, members) in &mut groups {
        members.sort_by(|a, b| {
            a.standing
                .tier
                .cmp(&b.standing.tier)
                .then_with(|| a.standing.division.cmp(&b.standing.division))
                .then_with(|| b.current_lp.cmp(&a.current_lp))
        });
    }

    groups
}

fn render_groups(changes: &[ChangeRecord]) -> String {
    grouped(changes)
        .into_iter()
        .map(|(name, members)| {
            let mut block = format!("*{}*", name);
            for change in members {
                block.push('\n');
                block.push_str(&format_change_line(change));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the full change digest.
pub fn format_changes(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return format!("{}\n\n{}", CHANGES_HEADER, NO_CHANGES);
    }
    format!("{}\n\n{}", CHANGES_HEADER, render_groups(changes))
}

/// Render the top-movers section. Empty input renders nothing.
pub fn format_top_changes(top: &[TopChange]) -> String {
    if top.is_empty() {
        return String::new();
    }

    let mut text = format!("*TOP {} CHANGES*", top.len());
    for entry in top {
        text.push_str(&format!(
            "\n#{} {} - {}",
            entry.rank,
            queue_display_name(&entry.change.queue_display_name),
            format_change_line(&entry.change)
        ));
    }
    text
}

/// Header, top movers, then every change grouped by queue.
pub fn format_digest(changes: &[ChangeRecord], top: &[TopChange]) -> String {
    if changes.is_empty() {
        return format_changes(changes);
    }

    let mut sections = vec![CHANGES_HEADER.to_string()];
    let top_text = format_top_changes(top);
    if !top_text.is_empty() {
        sections.push(top_text);
    }
    sections.push("*FULL CHANGES*".to_string());
    sections.push(render_groups(changes));
    sections.join("\n\n")
}

/// Render a win-rate leaderboard sorted by player id (case-insensitive).
pub fn format_winrates(records: &[WinRateRecord], queue_label: &str) -> String {
    let header = format!("*WIN RATES - {}*", queue_label);
    if records.is_empty() {
        return format!("{}\n\n{}", header, NO_DATA);
    }

    let mut sorted: Vec<&WinRateRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.player_id.sort_key());

    let lines: Vec<String> = sorted
        .into_iter()
        .map(|r| {
            format!(
                "{} - {} ({:.2}% | {}W-{}L)",
                r.player_id,
                r.standing(),
                r.win_rate_percent,
                r.wins,
                r.losses
            )
        })
        .collect();

    format!("{}\n\n{}", header, lines.join("\n"))
}

/// Champion mastery board, one block per player.
///
/// Expects the rows `MasteryStore::latest` returns: grouped by player,
/// highest points first within a player.
pub fn format_mastery(masteries: &[ChampionMastery]) -> String {
    let header = "*CHAMPION MASTERY*";
    if masteries.is_empty() {
        return format!("{}\n\n{}", header, NO_DATA);
    }

    let mut blocks: Vec<String> = Vec::new();
    let mut rank = 0;
    for (idx, mastery) in masteries.iter().enumerate() {
        if idx == 0 || masteries[idx - 1].player_id != mastery.player_id {
            blocks.push(mastery.player_id.to_string());
            rank = 0;
        }
        rank += 1;

        let mut line = format!(
            "{}. Champion {} - Level {} ({} pts)",
            rank, mastery.champion_id, mastery.champion_level, mastery.champion_points
        );
        if !mastery.milestone_grades.is_empty() {
            line.push_str(&format!(" [{}]", mastery.milestone_grades.join(", ")));
        }
        if let Some(block) = blocks.last_mut() {
            block.push('\n');
            block.push_str(&line);
        }
    }

    format!("{}\n\n{}", header, blocks.join("\n\n"))
}
