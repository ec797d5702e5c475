//! Best-effort extraction of injury records from league injury-report text.
//!
//! Report text arrives with columns flattened and whitespace partly collapsed,
//! so each line is run through a small state machine:
//! `SeekTeam -> SeekStatus -> ExtractName -> ExtractDescription`.
//! Team context persists across continuation lines. The parser never fails;
//! lines it cannot read are returned with a [`RejectReason`].

use serde::Serialize;
use tracing::{debug, info};

use crate::impact::compact_key;
use crate::injury::InjuryStatus;
use crate::model::InjuryRecord;

pub const REPORT_SOURCE: &str = "injury_report";

const MIN_NAME_CHARS: usize = 3;

const TEAMS: [&str; 30] = [
    "Atlanta Hawks",
    "Boston Celtics",
    "Brooklyn Nets",
    "Charlotte Hornets",
    "Chicago Bulls",
    "Cleveland Cavaliers",
    "Dallas Mavericks",
    "Denver Nuggets",
    "Detroit Pistons",
    "Golden State Warriors",
    "Houston Rockets",
    "Indiana Pacers",
    "LA Clippers",
    "Los Angeles Lakers",
    "Memphis Grizzlies",
    "Miami Heat",
    "Milwaukee Bucks",
    "Minnesota Timberwolves",
    "New Orleans Pelicans",
    "New York Knicks",
    "Oklahoma City Thunder",
    "Orlando Magic",
    "Philadelphia 76ers",
    "Phoenix Suns",
    "Portland Trail Blazers",
    "Sacramento Kings",
    "San Antonio Spurs",
    "Toronto Raptors",
    "Utah Jazz",
    "Washington Wizards",
];

/// Alternate spellings seen in reports, mapped to the canonical table entry.
const TEAM_ALIASES: [(&str, &str); 2] = [
    ("Los Angeles Clippers", "LA Clippers"),
    ("LA Lakers", "Los Angeles Lakers"),
];

/// Checked in this order so a weaker keyword never shadows a stronger one.
const STATUS_PRIORITY: [(&str, InjuryStatus); 5] = [
    ("Questionable", InjuryStatus::Questionable),
    ("Doubtful", InjuryStatus::Doubtful),
    ("Probable", InjuryStatus::Probable),
    ("Available", InjuryStatus::Available),
    ("Out", InjuryStatus::Out),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    NoTeamContext,
    NoStatus,
    NameTooShort,
    SingleTokenName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedLine {
    pub line_no: usize,
    pub text: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedReport {
    /// False when no record could be extracted; callers treat that as "no injuries known".
    pub success: bool,
    pub records: Vec<InjuryRecord>,
    pub rejected: Vec<RejectedLine>,
}

impl ParsedReport {
    pub fn records_for_team<'a>(&'a self, team: &str) -> impl Iterator<Item = &'a InjuryRecord> {
        let key = compact_key(team);
        self.records
            .iter()
            .filter(move |r| compact_key(&r.team) == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
}

/// Whitespace tokens with their byte offsets into `line`.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, ch) in line.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token {
                    text: &line[s..idx],
                    start: s,
                });
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..],
            start: s,
        });
    }
    tokens
}

/// Lower-case alphanumerics of a line with the byte span each one came from.
struct CompactIndex {
    text: String,
    spans: Vec<(usize, usize)>,
}

impl CompactIndex {
    fn new(line: &str) -> Self {
        let mut text = String::with_capacity(line.len());
        let mut spans = Vec::with_capacity(line.len());
        for (idx, ch) in line.char_indices() {
            if ch.is_ascii_alphanumeric() {
                text.push(ch.to_ascii_lowercase());
                spans.push((idx, idx + ch.len_utf8()));
            }
        }
        Self { text, spans }
    }

    /// Byte range in the source line covered by the compact match at `pos..pos+len`.
    fn source_range(&self, pos: usize, len: usize) -> (usize, usize) {
        (self.spans[pos].0, self.spans[pos + len - 1].1)
    }
}

#[derive(Debug, Clone, Copy)]
struct TeamHit {
    team: &'static str,
    start: usize,
    end: usize,
}

/// First team spelled out in the line that ends at or before byte `limit`.
fn find_team(index: &CompactIndex, limit: usize) -> Option<TeamHit> {
    let names = TEAMS
        .iter()
        .map(|t| (*t, *t))
        .chain(TEAM_ALIASES.iter().copied());
    let mut best: Option<TeamHit> = None;
    for (spelling, canonical) in names {
        let key = compact_key(spelling);
        let Some(pos) = index.text.find(&key) else {
            continue;
        };
        let (start, end) = index.source_range(pos, key.len());
        if end > limit {
            continue;
        }
        let better = match best {
            Some(b) => start < b.start || (start == b.start && end > b.end),
            None => true,
        };
        if better {
            best = Some(TeamHit {
                team: canonical,
                start,
                end,
            });
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
struct StatusHit {
    status: InjuryStatus,
    start: usize,
    end: usize,
}

/// A keyword only counts when the next character is not a lower-case letter
/// ("Outlaw" is a name, "OutInjury" is a status).
fn find_status(segment: &str) -> Option<StatusHit> {
    for (keyword, status) in STATUS_PRIORITY {
        let hit = segment.match_indices(keyword).find(|(idx, _)| {
            segment[idx + keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_ascii_lowercase())
        });
        if let Some((start, _)) = hit {
            return Some(StatusHit {
                status,
                start,
                end: start + keyword.len(),
            });
        }
    }
    None
}

fn is_schedule_token(token: &str) -> bool {
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    (has_digit && (token.contains('/') || token.contains(':')))
        || token.contains('@')
        || (token.starts_with('(') && token.ends_with(')'))
        || token.eq_ignore_ascii_case("am")
        || token.eq_ignore_ascii_case("pm")
}

/// Drops the leading game date, tip time, and matchup columns.
fn strip_schedule_prefix(segment: &str) -> &str {
    let tokens = tokenize(segment);
    match tokens.iter().find(|t| !is_schedule_token(t.text)) {
        Some(first) => &segment[first.start..],
        None => "",
    }
}

/// "Last,First" becomes "First Last"; whitespace is collapsed.
pub fn normalize_report_name(raw: &str) -> String {
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    match raw.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() && !last.trim().is_empty() => {
            format!("{} {}", collapse(first), collapse(last))
        }
        _ => collapse(raw.trim_matches(',')),
    }
}

fn name_rejection(name: &str) -> Option<RejectReason> {
    if name.chars().filter(|c| !c.is_whitespace()).count() < MIN_NAME_CHARS {
        return Some(RejectReason::NameTooShort);
    }
    let suffixed = name.contains("Jr") || name.contains("Sr");
    if name.split_whitespace().count() < 2 && !suffixed {
        return Some(RejectReason::SingleTokenName);
    }
    None
}

fn is_header(compact: &str) -> bool {
    if compact.starts_with("injuryreport") {
        return true;
    }
    if compact.contains("playername") || (compact.contains("gamedate") && compact.contains("matchup"))
    {
        return true;
    }
    // "Page 3 of 7"
    compact
        .strip_prefix("page")
        .and_then(|rest| rest.split_once("of"))
        .is_some_and(|(a, b)| {
            !a.is_empty()
                && !b.is_empty()
                && a.chars().all(|c| c.is_ascii_digit())
                && b.chars().all(|c| c.is_ascii_digit())
        })
}

enum LineState {
    SeekTeam,
    SeekStatus { from: usize },
    ExtractName { from: usize, hit: StatusHit },
    ExtractDescription {
        name: String,
        status: InjuryStatus,
        from: usize,
    },
}

#[derive(Debug)]
enum LineOutcome {
    Skip,
    Record(InjuryRecord),
    Rejected(RejectReason),
}

fn classify_line(line: &str, team: &mut Option<&'static str>) -> LineOutcome {
    let index = CompactIndex::new(line);
    if index.text.is_empty() || is_header(&index.text) {
        return LineOutcome::Skip;
    }

    let mut state = LineState::SeekTeam;
    loop {
        state = match state {
            LineState::SeekTeam => {
                // A team named in the description ("acquired from Miami Heat") must not
                // replace the current context.
                let limit = find_status(line).map_or(line.len(), |hit| hit.start);
                let from = match find_team(&index, limit) {
                    Some(hit) => {
                        *team = Some(hit.team);
                        hit.end
                    }
                    None => 0,
                };
                if team.is_none() {
                    return LineOutcome::Rejected(RejectReason::NoTeamContext);
                }
                LineState::SeekStatus { from }
            }
            LineState::SeekStatus { from } => match find_status(&line[from..]) {
                Some(hit) => LineState::ExtractName { from, hit },
                None => return LineOutcome::Rejected(RejectReason::NoStatus),
            },
            LineState::ExtractName { from, hit } => {
                let raw = &line[from..from + hit.start];
                let name = normalize_report_name(strip_schedule_prefix(raw));
                if let Some(reason) = name_rejection(&name) {
                    return LineOutcome::Rejected(reason);
                }
                LineState::ExtractDescription {
                    name,
                    status: hit.status,
                    from: from + hit.end,
                }
            }
            LineState::ExtractDescription { name, status, from } => {
                let Some(team) = *team else {
                    return LineOutcome::Rejected(RejectReason::NoTeamContext);
                };
                let description = line[from..].split_whitespace().collect::<Vec<_>>().join(" ");
                return LineOutcome::Record(InjuryRecord {
                    team: team.to_string(),
                    player_name: name,
                    status,
                    description,
                    source: REPORT_SOURCE.to_string(),
                });
            }
        }
    }
}

pub fn parse_report(text: &str) -> ParsedReport {
    let mut team: Option<&'static str> = None;
    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        match classify_line(line, &mut team) {
            LineOutcome::Skip => {}
            LineOutcome::Record(record) => records.push(record),
            LineOutcome::Rejected(reason) => {
                debug!(line = idx + 1, ?reason, "injury report line rejected");
                rejected.push(RejectedLine {
                    line_no: idx + 1,
                    text: line.trim().to_string(),
                    reason,
                });
            }
        }
    }

    info!(
        records = records.len(),
        rejected = rejected.len(),
        "parsed injury report"
    );
    ParsedReport {
        success: !records.is_empty(),
        records,
        rejected,
    }
}
