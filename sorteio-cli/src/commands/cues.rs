use comfy_table::{presets::UTF8_FULL, Table};
use sorteio_core::Cue;
use sorteio_draw::{DrawDesk, Result};

pub async fn handle_play(desk: &DrawDesk, name: &str) -> Result<()> {
    desk.play_cue(name);

    match name.parse::<Cue>() {
        Ok(cue) => {
            println!("♪ {}", cue.label());
            // Let the clip run before the process exits.
            tokio::time::sleep(cue.duration()).await;
        }
        Err(_) => {
            println!("Unknown cue '{}'. See: sorteio cues", name);
        }
    }

    Ok(())
}

pub fn handle_cues() -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Cue", "Label", "Length"]);

    for cue in Cue::ALL {
        table.add_row(vec![
            cue.name().to_string(),
            cue.label().to_string(),
            format!("{}ms", cue.duration().as_millis()),
        ]);
    }

    println!("{table}");
    Ok(())
}
