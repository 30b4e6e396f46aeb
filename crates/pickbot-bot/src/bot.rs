//! The bot — consumes chat messages from the bus, runs commands, replies.
//!
//! Messages are handled one at a time in arrival order. Team and flair
//! state live in a shared [`TeamState`]; directory persistence happens after
//! the in-memory change and only ever logs on failure.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use pickbot_channels::ChatUsers;
use pickbot_core::bus::queue::MessageBus;
use pickbot_core::bus::types::{InboundMessage, OutboundMessage};
use pickbot_core::config::schema::Config;
use pickbot_core::types::Member;
use pickbot_core::{pick, PickError, RandomSource, RosterGeneration, StdRandom, TeamState};
use pickbot_directory::DirectoryClient;
use pickbot_hosting::HostingClient;

use crate::assign::Assigner;
use crate::commands::{addressed_to, parse, Command};

const DID_NOT_UNDERSTAND: &str = "Sorry, I didn't understand that";
const COULD_NOT_FIND_TEAM: &str = "Sorry, I couldn't find a team with that name";
const PICK_USER_PROBLEM: &str =
    "Sorry, I ran into an issue picking a user. Check my logs for more details :sleuth_or_spy:";
const REFRESH_PROBLEM: &str =
    "Sorry, I couldn't refresh the team roster. Check my logs for more details :sleuth_or_spy:";
const NOT_AN_OPERATOR: &str = "Sorry, only operators can refresh the team roster.";

// ─────────────────────────────────────────────
// Bot
// ─────────────────────────────────────────────

pub struct Bot {
    bus: Arc<MessageBus>,
    state: Arc<TeamState>,
    directory: Arc<dyn DirectoryClient>,
    users: Arc<dyn ChatUsers>,
    assigner: Assigner,
    config: Config,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl Bot {
    pub fn new(
        bus: Arc<MessageBus>,
        state: Arc<TeamState>,
        directory: Arc<dyn DirectoryClient>,
        hosting: Arc<dyn HostingClient>,
        users: Arc<dyn ChatUsers>,
        config: Config,
    ) -> Self {
        let assigner = Assigner::new(
            directory.clone(),
            hosting,
            config.github.org.clone(),
            config.bot.dev_mode,
        );

        info!(
            name = %config.bot.name,
            dev_mode = config.bot.dev_mode,
            org = %config.github.org,
            "bot initialized"
        );

        Self {
            bus,
            state,
            directory,
            users,
            assigner,
            config,
            rng: Mutex::new(Box::new(StdRandom::from_entropy())),
        }
    }

    /// Replace the random source (seeded or scripted picks).
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn state(&self) -> &Arc<TeamState> {
        &self.state
    }

    /// Fetch the directory and swap in a new roster generation.
    ///
    /// On failure the current generation stays in place.
    pub async fn refresh(&self) -> Result<usize> {
        let records = self
            .directory
            .get_user_list()
            .await
            .context("failed to fetch the directory user list")?;
        let generation = RosterGeneration::from_records(&records, &self.config.roster.group_prefix);
        Ok(self.state.replace_generation(generation))
    }

    /// Consume inbound messages until the bus closes.
    pub async fn run(&self) {
        info!("bot loop started, waiting for messages");
        while let Some(msg) = self.bus.consume_inbound().await {
            for reply in self.handle_message(&msg).await {
                if let Err(e) = self.bus.publish_outbound(reply).await {
                    error!(error = %e, "failed to publish outbound message");
                }
            }
        }
        info!("inbound bus closed, bot loop exiting");
    }

    /// Replies to one chat message; empty when it is not for the bot.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Vec<OutboundMessage> {
        let Some((target, text)) = addressed_to(&msg.content) else {
            return Vec::new();
        };

        match self.users.user_name(target).await {
            Ok(name) if name == self.config.bot.name => {}
            Ok(name) => {
                debug!(target = %target, name = %name, "message addressed to someone else");
                return Vec::new();
            }
            Err(e) => {
                error!(target = %target, error = %e, "failed to look up mentioned user");
                return Vec::new();
            }
        }

        if text.is_empty() {
            return Vec::new();
        }

        let command = parse(text);
        info!(sender = %msg.sender_id, command = ?command, "handling command");

        self.execute(command, msg)
            .await
            .into_iter()
            .map(|content| msg.reply(content))
            .collect()
    }

    async fn execute(&self, command: Command, msg: &InboundMessage) -> Vec<String> {
        let sender = msg.sender_id.as_str();
        match command {
            Command::Help => vec![self.help_text()],
            Command::SetOverride {
                handle,
                team,
                include,
            } => vec![self.set_override(&handle, &team, include).await],
            Command::WhoIs { team } => vec![self.who_is(&team).await],
            Command::AddFlair { flair } => vec![self.add_flair(sender, &flair).await],
            Command::RemoveFlair => vec![self.remove_flair(sender).await],
            Command::Refresh => vec![self.refresh_on_request(sender).await],
            Command::PickMember { handle, assign } => {
                self.pick_member(&handle, assign, &msg.content).await
            }
            Command::PickTeam { team, assign } => {
                self.pick_team(&team, sender, assign, &msg.content).await
            }
            Command::Unknown => vec![DID_NOT_UNDERSTAND.to_string()],
        }
    }

    // ─────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────

    fn help_text(&self) -> String {
        let name = &self.config.bot.name;
        [
            "I can do the following:\n".to_string(),
            format!("`@{name} pick a <team>` - picks a user from that team"),
            format!("`@{name} pick @user` - picks that user"),
            format!("`@{name} assign a <team> for <Github PR URL(s)>` - assigns a user from that team to the Github PR(s)"),
            format!("`@{name} who is <team>` - lists users who belong to that team"),
            format!("`@{name} add @user to <team>` - adds user to team"),
            format!("`@{name} remove @user from <team>` - removes user from team"),
            format!("`@{name} add flair :emoji:` - set flair that appears when you're picked"),
            format!("`@{name} remove flair` - remove your flair"),
            format!("`@{name} refresh` - reload the team roster from the directory"),
        ]
        .join("\n")
    }

    async fn set_override(&self, handle: &str, team: &str, include: bool) -> String {
        info!(user = %handle, team = %team, include, "set team override");

        let team = match self.state.resolve(team) {
            Ok(name) => name,
            Err(e) => {
                warn!(team = %team, error = %e, "team lookup failed");
                return team_error_reply(&e);
            }
        };

        self.state
            .apply_override(Member::from_handle(handle), &team, include);
        self.persist_override(handle, &team, include).await;

        let github = &self.config.github;
        let (verb, preposition) = if include { ("Added", "to") } else { ("Removed", "from") };
        format!(
            "{} {} {} team {}! Remember to update https://github.com/orgs/{}/teams/{}{}/edit/review_assignment too!",
            verb,
            Member::from_handle(handle).mention(),
            preposition,
            team,
            github.org,
            github.team_slug_prefix,
            team
        )
    }

    async fn who_is(&self, team: &str) -> String {
        let resolved = match self.state.resolve_and_build(team) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(team = %team, error = %e, "team lookup failed");
                return team_error_reply(&e);
            }
        };
        debug!(team = %resolved.name, members = resolved.members.len(), "listing team members");

        let mut names = Vec::with_capacity(resolved.members.len());
        for member in &resolved.members {
            let name = match self.users.user_name(&member.handle).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(user = %member.handle, error = %e, "chat user lookup failed, using mention");
                    member.mention()
                }
            };
            names.push(with_flair(&name, &self.state.flair(&member.handle)));
        }
        names.sort();

        format!(
            "Team {} has the following members: {}",
            resolved.name,
            names.join(", ")
        )
    }

    async fn add_flair(&self, sender: &str, flair: &str) -> String {
        info!(user = %sender, flair = %flair, "add flair");
        self.state.set_flair(sender, flair);
        self.persist_flair(sender, flair).await;
        format!("{}, I like your style!", Member::from_handle(sender).mention())
    }

    async fn remove_flair(&self, sender: &str) -> String {
        info!(user = %sender, "remove flair");
        self.state.clear_flair(sender);
        self.persist_flair(sender, "").await;
        "OK, so you don't like flair.".to_string()
    }

    async fn refresh_on_request(&self, sender: &str) -> String {
        if !self.config.bot.is_operator(sender) {
            warn!(user = %sender, "refresh requested by non-operator");
            return NOT_AN_OPERATOR.to_string();
        }

        match self.refresh().await {
            Ok(teams) => {
                info!(user = %sender, teams, "roster refreshed on request");
                format!("Refreshed the team roster: {} teams.", teams)
            }
            Err(e) => {
                error!(user = %sender, error = ?e, "requested refresh failed");
                REFRESH_PROBLEM.to_string()
            }
        }
    }

    async fn pick_member(&self, handle: &str, assign: bool, text: &str) -> Vec<String> {
        info!(user = %handle, assign, "pick individual");

        let member = match self.directory.user_by_handle(handle).await {
            Ok(record) => Member::from(&record),
            Err(e) => {
                error!(user = %handle, error = %e, "directory lookup failed");
                return vec![PICK_USER_PROBLEM.to_string()];
            }
        };
        self.announce(&member, assign, text).await
    }

    async fn pick_team(&self, team: &str, sender: &str, assign: bool, text: &str) -> Vec<String> {
        info!(team = %team, omit = %sender, assign, "pick team member");

        let resolved = match self.state.resolve_and_build(team) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(team = %team, error = %e, "team lookup failed");
                return vec![team_error_reply(&e)];
            }
        };

        let requester = Member::from_handle(sender);
        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            pick(&resolved.members, Some(&requester), &mut **rng)
        };

        match picked {
            Ok(member) => {
                debug!(team = %resolved.name, picked = %member.handle, "member picked");
                self.announce(&member, assign, text).await
            }
            Err(e) => {
                error!(team = %resolved.name, error = %e, "pick failed");
                vec![PICK_USER_PROBLEM.to_string()]
            }
        }
    }

    /// The pick reply, after assigning pull requests when asked to.
    async fn announce(&self, member: &Member, assign: bool, text: &str) -> Vec<String> {
        let display = self.state.display(&member.handle);
        if !assign {
            return vec![format!("I choose you: {}", display)];
        }

        match self.assigner.assign_reviewer(member, text).await {
            Ok(report) => {
                let mut replies = report.notices;
                replies.push(format!("Set {} as pull-request reviewer", display));
                replies
            }
            Err(e) => {
                warn!(user = %member.handle, error = %e, "assignment failed");
                vec![format!(
                    "Error setting {} as pull-request reviewer: {}",
                    display, e
                )]
            }
        }
    }

    // ─────────────────────────────────────────
    // Directory persistence
    // ─────────────────────────────────────────

    /// Write an override into the member's directory profile. Logs on failure.
    async fn persist_override(&self, handle: &str, team: &str, include: bool) {
        let mut record = match self.directory.user_by_handle(handle).await {
            Ok(record) => record,
            Err(e) => {
                error!(user = %handle, team = %team, error = %e, "override not persisted: user lookup failed");
                return;
            }
        };

        record.profile.set_override(team, include);
        if let Err(e) = self
            .directory
            .upsert_user(&self.config.bot.owner_tag, &record)
            .await
        {
            error!(user = %handle, team = %team, error = %e, "override not persisted: upsert failed");
        }
    }

    /// Write flair into the member's directory profile. Logs on failure.
    async fn persist_flair(&self, handle: &str, flair: &str) {
        let mut record = match self.directory.user_by_handle(handle).await {
            Ok(record) => record,
            Err(e) => {
                error!(user = %handle, flair = %flair, error = %e, "flair not persisted: user lookup failed");
                return;
            }
        };

        record.profile.flair = flair.to_string();
        if let Err(e) = self
            .directory
            .upsert_user(&self.config.bot.owner_tag, &record)
            .await
        {
            error!(user = %handle, flair = %flair, error = %e, "flair not persisted: upsert failed");
        }
    }
}

fn team_error_reply(err: &PickError) -> String {
    match err {
        PickError::AmbiguousTeam(candidates) => format!(
            "{}. Did you mean one of: {}?",
            COULD_NOT_FIND_TEAM,
            candidates.join(", ")
        ),
        _ => COULD_NOT_FIND_TEAM.to_string(),
    }
}

fn with_flair(name: &str, flair: &str) -> String {
    if flair.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, flair)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeDirectory, FakeHosting, FakeUsers, Scripted};
    use std::sync::atomic::Ordering;

    struct Harness {
        bot: Bot,
        directory: Arc<FakeDirectory>,
        hosting: Arc<FakeHosting>,
    }

    fn harness_with(records: Vec<pickbot_core::UserRecord>, config: Config, picks: &[usize]) -> Harness {
        let directory = Arc::new(FakeDirectory::with_records(records));
        let hosting = Arc::new(FakeHosting::default());
        let users = Arc::new(FakeUsers::new(&[
            ("UBOT", "pickbot"),
            ("UOTHER", "otherbot"),
            ("U1", "ada"),
            ("U2", "grace"),
            ("U3", "linus"),
        ]));
        let bot = Bot::new(
            Arc::new(MessageBus::new(16)),
            Arc::new(TeamState::default()),
            directory.clone(),
            hosting.clone(),
            users,
            config,
        )
        .with_random_source(Box::new(Scripted::new(picks)));
        Harness {
            bot,
            directory,
            hosting,
        }
    }

    fn example_team() -> Vec<pickbot_core::UserRecord> {
        vec![
            record("U1", "Example Team", "ada-gh"),
            record("U2", "Example Team", "grace-gh"),
            record("U3", "Example Team", "linus-gh"),
            record("U5555", "Other Team", ""),
            record("U6", "Solo", ""),
        ]
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.github.org = "acme".into();
        config.bot.dev_mode = false;
        config
    }

    async fn harness(picks: &[usize]) -> Harness {
        let h = harness_with(example_team(), test_config(), picks);
        h.bot.refresh().await.unwrap();
        h
    }

    async fn say(h: &Harness, sender: &str, text: &str) -> Vec<String> {
        let msg = InboundMessage::new("slack", sender, "C1", text);
        h.bot
            .handle_message(&msg)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    #[tokio::test]
    async fn test_pick_from_team_omits_requester() {
        let h = harness(&[1]).await;
        let replies = say(&h, "U1", "<@UBOT> pick example-team").await;
        assert_eq!(replies, vec!["I choose you: <@U3>"]);
    }

    #[tokio::test]
    async fn test_pick_with_decorated_and_misspelled_team() {
        let h = harness(&[0, 0]).await;
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick a #eng-example-team").await,
            vec!["I choose you: <@U2>"]
        );
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick an eng example-tean").await,
            vec!["I choose you: <@U2>"]
        );
    }

    #[tokio::test]
    async fn test_override_added_from_chat() {
        let h = harness(&[]).await;
        let replies = say(&h, "U1", "<@UBOT> <@U5555> is an eng-example-team").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("Added <@U5555> to team example-team!"));
        assert!(replies[0].contains("https://github.com/orgs/acme/teams/eng-example-team/edit/review_assignment"));

        let ledger = h.bot.state().overrides();
        let entry = ledger.entries().last().unwrap();
        assert_eq!(entry.member.handle, "U5555");
        assert_eq!(entry.team, "example-team");
        assert!(entry.include);

        let upserts = h.directory.upserts();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, "pickbot");
        assert_eq!(upserts[0].1.profile.team_overrides[0].team, "example-team");
    }

    #[tokio::test]
    async fn test_removed_member_is_never_picked() {
        let h = harness(&[0, 0, 0]).await;
        let replies = say(&h, "U3", "<@UBOT> remove <@U2> from example-team").await;
        assert!(replies[0].starts_with("Removed <@U2> from team example-team!"));

        for _ in 0..3 {
            assert_eq!(
                say(&h, "U3", "<@UBOT> pick example-team").await,
                vec!["I choose you: <@U1>"]
            );
        }
    }

    #[tokio::test]
    async fn test_override_survives_persistence_failure() {
        let h = harness(&[]).await;
        h.directory.fail_upsert.store(true, Ordering::SeqCst);
        let replies = say(&h, "U1", "<@UBOT> <@U9> is solo").await;
        assert!(replies[0].starts_with("Added <@U9> to team solo!"));
        assert_eq!(h.bot.state().build("solo").len(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_requester_only_teams() {
        let h = harness(&[]).await;
        // Only U6 is on "solo"; an override for an unknown team makes "ghost" resolvable.
        h.bot.state().apply_override(Member::from_handle("U7"), "ghost", false);

        assert_eq!(
            say(&h, "U6", "<@UBOT> pick solo").await,
            vec![PICK_USER_PROBLEM]
        );
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick ghost").await,
            vec![PICK_USER_PROBLEM]
        );
    }

    #[tokio::test]
    async fn test_unknown_and_ambiguous_team() {
        let h = harness_with(
            vec![record("U1", "Infra", ""), record("U2", "Intra", "")],
            test_config(),
            &[],
        );
        h.bot.refresh().await.unwrap();

        assert_eq!(
            say(&h, "U1", "<@UBOT> pick marketing").await,
            vec![COULD_NOT_FIND_TEAM]
        );
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick inra").await,
            vec!["Sorry, I couldn't find a team with that name. Did you mean one of: infra, intra?"]
        );
    }

    #[tokio::test]
    async fn test_flair_round_trip() {
        let h = harness(&[1]).await;

        assert_eq!(
            say(&h, "U3", "<@UBOT> add flair =]").await,
            vec!["<@U3>, I like your style!"]
        );
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick example-team").await,
            vec!["I choose you: <@U3> =]"]
        );
        assert_eq!(h.directory.upserts().last().unwrap().1.profile.flair, "=]");

        assert_eq!(
            say(&h, "U3", "<@UBOT> remove flair").await,
            vec!["OK, so you don't like flair."]
        );
        assert_eq!(h.bot.state().display("U3"), "<@U3>");
        assert_eq!(h.directory.upserts().last().unwrap().1.profile.flair, "");
    }

    #[tokio::test]
    async fn test_who_is_lists_sorted_names_with_flair() {
        let h = harness(&[]).await;
        h.bot.state().set_flair("U2", ":crab:");
        assert_eq!(
            say(&h, "U9", "<@UBOT> who is in example-team").await,
            vec!["Team example-team has the following members: ada, grace :crab:, linus"]
        );
    }

    #[tokio::test]
    async fn test_pick_individual() {
        let h = harness(&[]).await;
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick <@U2>").await,
            vec!["I choose you: <@U2>"]
        );
        assert_eq!(
            say(&h, "U1", "<@UBOT> pick <@U404>").await,
            vec![PICK_USER_PROBLEM]
        );
    }

    #[tokio::test]
    async fn test_assign_from_team() {
        let h = harness(&[1]).await;
        let replies = say(
            &h,
            "U1",
            "<@UBOT> assign example-team https://github.com/acme/api/pull/12",
        )
        .await;
        assert_eq!(replies, vec!["Set <@U3> as pull-request reviewer"]);
        assert_eq!(
            h.hosting.calls(),
            vec![
                "assignees acme/api#12 linus-gh",
                "reviewers acme/api#12 linus-gh"
            ]
        );
    }

    #[tokio::test]
    async fn test_assign_error_is_reported() {
        let h = harness(&[]).await;
        let replies = say(
            &h,
            "U1",
            "<@UBOT> assign <@U5555> https://github.com/acme/api/pull/12",
        )
        .await;
        assert_eq!(
            replies,
            vec!["Error setting <@U5555> as pull-request reviewer: no github account for slack user <@U5555>"]
        );
    }

    #[tokio::test]
    async fn test_dev_mode_assignment() {
        let mut config = test_config();
        config.bot.dev_mode = true;
        let h = harness_with(example_team(), config, &[0]);
        h.bot.refresh().await.unwrap();

        let replies = say(
            &h,
            "U1",
            "<@UBOT> pick and assign example-team https://github.com/acme/api/pull/12",
        )
        .await;
        assert_eq!(
            replies,
            vec![
                "would have assigned grace-gh to api",
                "Set <@U2> as pull-request reviewer"
            ]
        );
        assert!(h.hosting.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_permissions_and_failure() {
        let mut config = test_config();
        config.bot.operators = vec!["U1".into()];
        let h = harness_with(example_team(), config, &[]);

        assert_eq!(say(&h, "U2", "<@UBOT> refresh").await, vec![NOT_AN_OPERATOR]);
        assert_eq!(
            say(&h, "U1", "<@UBOT> refresh").await,
            vec!["Refreshed the team roster: 3 teams."]
        );

        h.directory.fail_list.store(true, Ordering::SeqCst);
        assert_eq!(say(&h, "U1", "<@UBOT> refresh").await, vec![REFRESH_PROBLEM]);
        assert_eq!(h.bot.state().team_names().len(), 3);
    }

    #[tokio::test]
    async fn test_ignores_messages_for_others() {
        let h = harness(&[]).await;
        assert!(say(&h, "U1", "<@UOTHER> pick example-team").await.is_empty());
        assert!(say(&h, "U1", "<@UNKNOWN> pick example-team").await.is_empty());
        assert!(say(&h, "U1", "pick example-team").await.is_empty());
        assert!(say(&h, "U1", "<@UBOT>    ").await.is_empty());
    }

    #[tokio::test]
    async fn test_help_and_unknown() {
        let h = harness(&[]).await;
        let help = say(&h, "U1", "<@UBOT> help").await;
        assert!(help[0].contains("`@pickbot who is <team>`"));
        assert_eq!(
            say(&h, "U1", "<@UBOT> make me a sandwich").await,
            vec![DID_NOT_UNDERSTAND]
        );
    }

    #[tokio::test]
    async fn test_run_replies_in_thread() {
        let h = harness(&[1]).await;
        let bus = h.bot.bus.clone();

        let mut msg = InboundMessage::new("slack", "U1", "C1", "<@UBOT> pick example-team");
        msg.metadata
            .insert("thread_ts".to_string(), "1700000000.000100".to_string());
        bus.publish_inbound(msg).await.unwrap();

        let bot = Arc::new(h.bot);
        let runner = bot.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        let reply = bus.consume_outbound().await.unwrap();
        assert_eq!(reply.chat_id, "C1");
        assert_eq!(reply.content, "I choose you: <@U3>");
        assert_eq!(reply.metadata.get("thread_ts").unwrap(), "1700000000.000100");
        handle.abort();
    }
}
