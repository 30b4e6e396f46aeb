//! Gateway command — runs the bot against the chat platform.
//!
//! Startup sequence:
//! 1. Load config
//! 2. Build the directory and GitHub clients
//! 3. Create the message bus, team state and channel manager
//! 4. Load the first roster generation (fatal on failure)
//! 5. Run: `tokio::select!` of bot loop + channel manager + refresh service
//! 6. Handle Ctrl+C for graceful shutdown

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use pickbot_bot::Bot;
use pickbot_channels::{ChannelManager, ChatUsers};
use pickbot_core::bus::queue::MessageBus;
use pickbot_core::config::load_config;
use pickbot_core::refresh::{OnRefreshFn, RefreshService};
use pickbot_core::TeamState;

use crate::helpers;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    helpers::print_banner();
    println!("  Mode: Gateway");
    println!();

    let config = load_config(config_path);

    let directory = helpers::build_directory(&config)?;
    let hosting = helpers::build_hosting(&config)?;

    let bus = Arc::new(MessageBus::new(100));
    let state = Arc::new(TeamState::new(config.roster.team_match_distance));

    #[allow(unused_mut)]
    let mut channel_manager = ChannelManager::new(bus.clone());
    #[allow(unused_mut)]
    let mut users: Arc<dyn ChatUsers> = Arc::new(helpers::NoChatPlatform);

    #[cfg(feature = "slack")]
    {
        let sl = &config.slack;
        if sl.is_configured() {
            use pickbot_channels::slack::SlackChannel;
            let slack = Arc::new(SlackChannel::new(sl.clone(), bus.clone()));
            users = slack.clone() as Arc<dyn ChatUsers>;
            channel_manager.register(slack);
            info!("registered slack channel");
        }
    }

    let bot = Arc::new(Bot::new(
        bus.clone(),
        state.clone(),
        directory,
        hosting,
        users,
        config.clone(),
    ));

    let teams = bot
        .refresh()
        .await
        .context("initial roster refresh failed")?;

    let refresh = {
        let bot = bot.clone();
        let callback: OnRefreshFn = Arc::new(move || {
            let bot = bot.clone();
            Box::pin(async move { bot.refresh().await })
        });
        Arc::new(RefreshService::new(
            callback,
            Some(config.roster.refresh_interval_s),
        ))
    };

    info!(
        teams,
        dev_mode = config.bot.dev_mode,
        channels = ?channel_manager.channel_names(),
        "gateway starting"
    );

    println!("  Bot name:  {}", config.bot.name);
    println!("  Teams:     {}", teams);
    println!(
        "  Dev mode:  {}",
        if config.bot.dev_mode { "on (no GitHub writes)" } else { "off" }
    );
    println!("  Channels:  {} registered", channel_manager.len());
    if config.roster.refresh_interval_s > 0 {
        println!("  Refresh:   every {}s", config.roster.refresh_interval_s);
    } else {
        println!("  Refresh:   on request only");
    }
    println!();

    if channel_manager.is_empty() {
        println!("  ⚠  No channels registered. Configure slack.botToken and");
        println!("     slack.appToken in ~/.pickbot/config.json");
        println!();
    }

    println!("  Ctrl+C to stop");
    println!();

    tokio::select! {
        _ = bot.run() => {
            info!("bot loop exited");
        }
        result = channel_manager.start_all() => {
            if let Err(e) = result {
                error!(error = %e, "channel manager error");
            }
        }
        result = refresh.start() => {
            if let Err(e) = result {
                error!(error = %e, "refresh service error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
            refresh.stop();
            channel_manager.stop_all().await;
        }
    }

    println!("  Gateway stopped. Goodbye!");
    Ok(())
}
