use sorteio_draw::{DrawDesk, DrawStart, DrawState, Result};
use std::io::{self, Write};

/// Run one draw, rendering the shuffle in place until the pick is committed.
pub async fn handle_draw(desk: &DrawDesk) -> Result<()> {
    let mut updates = desk.subscribe();

    let ticket = match desk.draw().await {
        DrawStart::Started(ticket) => ticket,
        DrawStart::EmptyPool => {
            println!("No names to draw");
            println!("Add names with: sorteio add <name>...");
            return Ok(());
        }
        DrawStart::AlreadyDrawing => {
            println!("A draw is already in progress");
            return Ok(());
        }
    };

    let finished = ticket.finished();
    tokio::pin!(finished);

    let result = loop {
        tokio::select! {
            result = &mut finished => break result?,
            Ok(()) = updates.changed() => {
                if let DrawState::Shuffling { shown, .. } = &*updates.borrow_and_update() {
                    print!("\r  Sorteando: {:<40}", shown.as_str());
                    let _ = io::stdout().flush();
                }
            }
        }
    };

    println!("\r  Sorteado:  {:<40}", result.pick.as_str());
    if !result.recorded {
        println!("  '{}' was removed during the draw and was not recorded", result.pick);
    }

    let snapshot = desk.snapshot().await;
    println!(
        "{} names left, {} drawn",
        snapshot.available.len(),
        snapshot.drawn.len()
    );

    // The completion cue has just started; let it ring out before exiting.
    tokio::time::sleep(desk.engine().config().completion_cue.duration()).await;
    Ok(())
}
