use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_BORDERS_ONLY, ContentArrangement, Table};
use indicatif::ProgressBar;
use rover_core::{FormValidation, LoadEvent, MissionManifest, PhotoRecord, SearchSession};

pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

/// Loads every mission manifest behind a spinner. Searching is impossible if this
/// fails, so the error ends the command.
pub async fn load_manifests(session: &SearchSession) -> Result<()> {
    let spinner = create_spinner("Loading mission manifests...");
    let result = session
        .load_manifests(|event| match event {
            LoadEvent::Loaded {
                mission,
                loaded,
                required,
            } => spinner.set_message(format!(
                "Loaded {} manifest ({loaded}/{required})",
                mission.cyan()
            )),
            LoadEvent::Ready => spinner.set_message("Mission manifests loaded"),
            LoadEvent::Failed { mission, .. } => {
                spinner.set_message(format!("Manifest for {} failed", mission.red()))
            }
        })
        .await;
    spinner.finish_and_clear();
    Ok(result?)
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn manifests_table(manifests: &[MissionManifest]) -> Table {
    let mut table = table();
    table.set_header(vec!["Mission", "Landing date", "Latest date", "Latest SOL"]);
    for m in manifests {
        table.add_row(vec![
            m.mission_id.clone(),
            m.landing_date.to_string(),
            m.most_recent_earth_date.to_string(),
            m.most_recent_sol.to_string(),
        ]);
    }
    table
}

pub fn photos_table<'a>(photos: impl IntoIterator<Item = &'a PhotoRecord>) -> Table {
    let mut table = table();
    table.set_header(vec!["Id", "Earth date", "Sol", "Camera", "Mission", "Image"]);
    for p in photos {
        table.add_row(vec![
            p.id.to_string(),
            p.earth_date.clone(),
            p.sol.to_string(),
            p.camera_name.clone(),
            p.rover_name.clone(),
            p.image_url.clone(),
        ]);
    }
    table
}

/// One-line description used in selection prompts.
pub fn photo_label(photo: &PhotoRecord) -> String {
    format!(
        "{} · {} · sol {} · {}",
        photo.id, photo.earth_date, photo.sol, photo.camera_name
    )
}

pub fn print_field_errors(form: &FormValidation) {
    for (field, message) in form.errors() {
        let field = match field {
            "date_or_sol" => "Date or SOL",
            "rover" => "Rover",
            "camera" => "Camera",
            other => other,
        };
        eprintln!("{} {}: {}", "✗".red(), field.bold(), message);
    }
}

pub fn print_no_results() {
    println!("{}", "No images found!".yellow().bold());
}

pub fn print_request_failed(reason: &str) {
    eprintln!("{} Sorry, the request failed... try again!", "✗".red());
    eprintln!("  {}", reason.dimmed());
}
