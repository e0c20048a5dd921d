use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use sorteio_core::Participant;
use sorteio_draw::{DrawDesk, DrawError, Result};

/// Adds each name in turn. Invalid or duplicate names are reported and
/// skipped; the rest are still added.
pub async fn handle_add(desk: &DrawDesk, names: Vec<String>) -> Result<()> {
    for name in names {
        match desk.add_name(&name).await {
            Ok(participant) => println!("Added: {}", participant),
            Err(e) if e.is_user_input() => eprintln!("Skipped '{}': {}", name.trim(), e),
            Err(e) => return Err(e),
        }
    }

    let snapshot = desk.snapshot().await;
    println!("{} names available", snapshot.available.len());
    Ok(())
}

/// `position` is 1-based, as shown by `list`.
pub async fn handle_remove(desk: &DrawDesk, position: u64) -> Result<()> {
    let index = usize::try_from(position.saturating_sub(1)).unwrap_or(usize::MAX);
    let removed = desk.remove_name(index).await?;
    println!("Removed: {}", removed);
    Ok(())
}

pub async fn handle_list(desk: &DrawDesk) -> Result<()> {
    let snapshot = desk.snapshot().await;

    println!("Available ({})", snapshot.available.len());
    if snapshot.available.is_empty() {
        println!("  No names added");
        println!("  Add names with: sorteio add <name>...");
    } else {
        println!("{}", numbered_table(&snapshot.available));
    }

    println!();
    println!("Drawn ({})", snapshot.drawn.len());
    if snapshot.drawn.is_empty() {
        println!("  No names drawn yet");
    } else {
        println!("{}", numbered_table(&snapshot.drawn));
    }

    if !desk.is_persistent().await {
        println!();
        println!("Note: storage is unavailable, changes will not be saved");
    }

    Ok(())
}

pub async fn handle_reset(desk: &DrawDesk, force: bool) -> Result<()> {
    let drawn = desk.snapshot().await.drawn.len();
    if drawn == 0 {
        println!("Nothing to reset: no names have been drawn");
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Return {} drawn names to the pool?", drawn))
            .default(false)
            .interact()
            .map_err(|e| DrawError::Aborted(e.to_string()))?;

        if !confirmed {
            println!("Reset cancelled");
            return Ok(());
        }
    }

    desk.reset_all().await?;
    println!(
        "Reset complete: {} names available",
        desk.snapshot().await.available.len()
    );
    Ok(())
}

pub async fn handle_status(desk: &DrawDesk, json: bool) -> Result<()> {
    let snapshot = desk.snapshot().await;
    let persistent = desk.is_persistent().await;

    if json {
        let status = serde_json::json!({
            "available": snapshot.available,
            "drawn": snapshot.drawn,
            "persistent": persistent,
        });
        println!("{:#}", status);
        return Ok(());
    }

    println!("Available: {}", snapshot.available.len());
    println!("Drawn:     {}", snapshot.drawn.len());
    if let Some(last) = snapshot.drawn.last() {
        println!("Last pick: {}", last);
    }
    println!("Storage:   {}", if persistent { "saved" } else { "memory only" });
    Ok(())
}

fn numbered_table(names: &[Participant]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Name"]);

    for (i, name) in names.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), name.to_string()]);
    }

    table
}
