//! Chat operator commands: list, stats, purge.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use pairlore_core::store::AssociationStore;

use crate::state::AppState;

/// List all tracked chats with their learned-pair counts and pending
/// eviction state.
pub async fn list_chats(state: &AppState, json: bool) -> Result<()> {
    let chats = state.store.list_chats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!(
            "  {} No chats tracked yet.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Chat").fg(Color::White),
        Cell::new("External Id").fg(Color::White),
        Cell::new("Chance").fg(Color::White),
        Cell::new("Pairs").fg(Color::White),
        Cell::new("Eviction").fg(Color::White),
    ]);

    for chat in &chats {
        let pairs = state.store.count_pairs(chat.id).await?;
        let eviction = match state.scheduler.scheduled_interval(chat.id) {
            Some(interval) => Cell::new(format!("queued ({}h)", interval.as_secs() / 3600))
                .fg(Color::Yellow),
            None => Cell::new("-").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(chat.id).fg(Color::Cyan),
            Cell::new(chat.external_id),
            Cell::new(format!("{}%", chat.random_chance)),
            Cell::new(pairs),
            eviction,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} chat{}",
        style(chats.len()).bold(),
        if chats.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show the number of learned pairs for one chat.
pub async fn chat_stats(state: &AppState, external_id: i64, json: bool) -> Result<()> {
    let Some(chat) = state.store.find_chat_by_external_id(external_id).await? else {
        if json {
            println!("{}", serde_json::json!({ "external_id": external_id, "tracked": false }));
        } else {
            println!(
                "  {} Chat {} is not tracked.",
                style("i").blue().bold(),
                external_id
            );
        }
        return Ok(());
    };

    let pairs = state.store.count_pairs(chat.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "external_id": external_id,
                "tracked": true,
                "chat_id": chat.id,
                "random_chance": chat.random_chance.value(),
                "pairs": pairs,
            })
        );
        return Ok(());
    }

    println!();
    println!("  {}  {}", style("Chat:").bold(), style(chat.id).cyan());
    println!("  {}  {}", style("External Id:").bold(), chat.external_id);
    println!("  {}  {}%", style("Chance:").bold(), chat.random_chance);
    println!("  {}  {}", style("Pairs:").bold(), pairs);
    println!();

    Ok(())
}

/// Cancel any pending eviction and delete a chat's learned data now.
pub async fn purge_chat(state: &AppState, external_id: i64, yes: bool, json: bool) -> Result<()> {
    let Some(chat) = state.store.find_chat_by_external_id(external_id).await? else {
        if json {
            println!("{}", serde_json::json!({ "external_id": external_id, "purged": false }));
        } else {
            println!(
                "  {} Chat {} is not tracked, nothing to purge.",
                style("i").blue().bold(),
                external_id
            );
        }
        return Ok(());
    };

    if !yes {
        println!(
            "  {} This deletes every pair and reply learned in chat {}. \
             Re-run with {} to proceed.",
            style("!").yellow().bold(),
            external_id,
            style("--yes").yellow()
        );
        return Ok(());
    }

    let purged = state.scheduler.evict_now(chat.id).await?;

    if json {
        println!("{}", serde_json::json!({ "external_id": external_id, "purged": purged }));
    } else {
        println!(
            "  {} Chat {} purged.",
            style("\u{2713}").green().bold(),
            external_id
        );
    }

    Ok(())
}
