//! Command parser.
//!
//! Messages are split on whitespace and matched against an ordered list of
//! rules; the first rule that recognizes the tokens wins. Mentions
//! (`<@U123>`) are told apart from team names syntactically, so the rule
//! for picking an individual can never swallow a team name or vice versa.

use pickbot_core::utils::parse_mention;

/// A parsed chat command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Force `handle` into (`include`) or out of a team.
    SetOverride {
        handle: String,
        team: String,
        include: bool,
    },
    /// List a team's effective members.
    WhoIs { team: String },
    /// Set the sender's flair; empty clears it.
    AddFlair { flair: String },
    RemoveFlair,
    /// Operator-only roster refresh.
    Refresh,
    /// Pick a specific person, optionally assigning them to linked PRs.
    PickMember { handle: String, assign: bool },
    /// Pick someone from a team other than the sender.
    PickTeam { team: String, assign: bool },
    Unknown,
}

/// Split a message into the handle it is addressed to and the trimmed rest.
///
/// The message must open with a mention followed by whitespace.
pub fn addressed_to(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find('>')?;
    let handle = parse_mention(&text[..=end])?;
    let rest = &text[end + 1..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((handle, rest.trim()))
}

type Rule = fn(&Tokens<'_>) -> Option<Command>;

/// Rules in priority order.
///
/// - help first so it can never be mistaken for anything else
/// - override forms start with a mention or `add`/`remove` + mention, so they
///   precede the flair rules that also start with `add`/`remove`
/// - `who is` before picking: neither overlaps, but listing is read-only
/// - refresh before picking so `refresh` is never taken as a team name
/// - an individual pick before a team pick: a mention would otherwise be
///   read as a (garbage) team name
const RULES: &[Rule] = &[
    parse_help,
    parse_override_is,
    parse_override_add_remove,
    parse_who_is,
    parse_add_flair,
    parse_remove_flair,
    parse_refresh,
    parse_pick_member,
    parse_pick_team,
];

/// Parse the text that follows the bot mention.
pub fn parse(text: &str) -> Command {
    let tokens = Tokens::new(text);
    RULES
        .iter()
        .find_map(|rule| rule(&tokens))
        .unwrap_or(Command::Unknown)
}

// ─────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────

struct Tokens<'a> {
    raw: Vec<&'a str>,
    /// Lowercased copies for keyword matching.
    lower: Vec<String>,
    /// Anything mentioning "assign" requests PR assignment.
    assign: bool,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let raw: Vec<&str> = text.split_whitespace().collect();
        let lower = raw.iter().map(|t| t.to_lowercase()).collect();
        Self {
            raw,
            lower,
            assign: text.to_lowercase().contains("assign"),
        }
    }

    fn word(&self, idx: usize) -> Option<&str> {
        self.lower.get(idx).map(String::as_str)
    }

    fn is(&self, idx: usize, keyword: &str) -> bool {
        self.word(idx) == Some(keyword)
    }

    fn mention(&self, idx: usize) -> Option<String> {
        self.raw.get(idx).and_then(|t| parse_mention(t)).map(str::to_string)
    }

    /// Skip an optional article at `idx`.
    fn skip_article(&self, idx: usize) -> usize {
        match self.word(idx) {
            Some("a") | Some("an") => idx + 1,
            _ => idx,
        }
    }

    fn team(&self, idx: usize) -> Option<String> {
        team_name(self.raw.get(idx..)?)
    }
}

/// Extract a team name from the tokens that follow a command keyword.
///
/// A leading `#` is dropped, a bare `eng` joins the next token, and the name
/// is the leading run of ASCII letters and `-`, lowercased.
fn team_name(tokens: &[&str]) -> Option<String> {
    let (first, rest) = tokens.split_first()?;
    let first = first.strip_prefix('#').unwrap_or(first);
    let raw = if first.eq_ignore_ascii_case("eng") {
        rest.first().copied().unwrap_or(first)
    } else {
        first
    };

    let name: String = raw
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    (!name.is_empty()).then_some(name)
}

// ─────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────

fn parse_help(t: &Tokens<'_>) -> Option<Command> {
    t.is(0, "help").then_some(Command::Help)
}

/// `<@U> is [not] [a|an] <team>`
fn parse_override_is(t: &Tokens<'_>) -> Option<Command> {
    let handle = t.mention(0)?;
    if !t.is(1, "is") {
        return None;
    }
    let mut idx = 2;
    let include = !t.is(idx, "not");
    if !include {
        idx += 1;
    }
    let team = t.team(t.skip_article(idx))?;
    Some(Command::SetOverride {
        handle,
        team,
        include,
    })
}

/// `add <@U> to <team>` / `remove <@U> from <team>`
fn parse_override_add_remove(t: &Tokens<'_>) -> Option<Command> {
    let include = match t.word(0)? {
        "add" => true,
        "remove" => false,
        _ => return None,
    };
    let handle = t.mention(1)?;
    if !(t.is(2, "to") || t.is(2, "from")) {
        return None;
    }
    let team = t.team(3)?;
    Some(Command::SetOverride {
        handle,
        team,
        include,
    })
}

/// `who is [a|an|in] <team>`
fn parse_who_is(t: &Tokens<'_>) -> Option<Command> {
    if !(t.is(0, "who") && t.is(1, "is")) {
        return None;
    }
    let idx = if t.is(2, "in") { 3 } else { t.skip_article(2) };
    let team = t.team(idx)?;
    Some(Command::WhoIs { team })
}

/// `add flair <text>`
fn parse_add_flair(t: &Tokens<'_>) -> Option<Command> {
    if !(t.is(0, "add") && t.is(1, "flair")) {
        return None;
    }
    let flair = t.raw.get(2..).unwrap_or_default().join(" ");
    if flair.is_empty() {
        return Some(Command::RemoveFlair);
    }
    Some(Command::AddFlair { flair })
}

fn parse_remove_flair(t: &Tokens<'_>) -> Option<Command> {
    (t.is(0, "remove") && t.is(1, "flair")).then_some(Command::RemoveFlair)
}

fn parse_refresh(t: &Tokens<'_>) -> Option<Command> {
    (t.is(0, "refresh") && t.raw.len() == 1).then_some(Command::Refresh)
}

/// Position after `pick and assign` / `pick` / `assign` and an optional article.
fn pick_target(t: &Tokens<'_>) -> Option<usize> {
    let idx = match t.word(0)? {
        "pick" if t.is(1, "and") && t.is(2, "assign") => 3,
        "pick" | "assign" => 1,
        _ => return None,
    };
    Some(t.skip_article(idx))
}

/// `(pick and assign|pick|assign) [a|an] <@U> …`
fn parse_pick_member(t: &Tokens<'_>) -> Option<Command> {
    let handle = t.mention(pick_target(t)?)?;
    Some(Command::PickMember {
        handle,
        assign: t.assign,
    })
}

/// `(pick and assign|pick|assign) [a|an] [#][eng ]<team> …`
fn parse_pick_team(t: &Tokens<'_>) -> Option<Command> {
    let idx = pick_target(t)?;
    if t.raw.get(idx).is_some_and(|tok| tok.starts_with("<@")) {
        return None;
    }
    let team = t.team(idx)?;
    Some(Command::PickTeam {
        team,
        assign: t.assign,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
