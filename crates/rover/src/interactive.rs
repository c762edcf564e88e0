use anyhow::Result;
use clap::Args;
use colored::Colorize;
use inquire::{Confirm, InquireError, MultiSelect, Select, Text};
use rover_core::{FormInput, PhotoRecord, SearchOutcome, SearchSession, SubmitError};

use crate::render;

const CAMERAS: [&str; 9] = [
    "fhaz", "rhaz", "mast", "chemcam", "mahli", "mardi", "navcam", "pancam", "minites",
];

#[derive(Args, Debug)]
#[command(about = "Search repeatedly and collect photos for this session")]
pub struct InteractiveArgs {}

pub async fn execute(session: &SearchSession, _args: InteractiveArgs) -> Result<()> {
    render::load_manifests(session).await?;

    loop {
        match search_once(session).await {
            Ok(()) => {}
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e),
        }
        match Confirm::new("Search again?").with_default(true).prompt() {
            Ok(true) => {}
            Ok(false) | Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_saved(session);
    Ok(())
}

fn is_cancel(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<InquireError>(),
        Some(InquireError::OperationCanceled | InquireError::OperationInterrupted)
    )
}

async fn search_once(session: &SearchSession) -> Result<()> {
    let date_or_sol = Text::new("Earth date (YYYY-M-D) or SOL:").prompt()?;
    let rover = Select::new("Rover:", session.missions()).prompt()?;
    let camera = Select::new("Camera:", CAMERAS.to_vec()).prompt()?;

    let input = FormInput::new(date_or_sol, rover, camera);
    let spinner = render::create_spinner("Searching for photos...");
    let submitted = session.submit(&input).await;
    spinner.finish_and_clear();

    match submitted {
        Ok(SearchOutcome::Success(photos)) => {
            println!("{} {} photos", "Found".green().bold(), photos.len());
            println!("{}", render::photos_table(&photos));
            choose_photos_to_save(session, &photos)?;
        }
        Ok(SearchOutcome::Empty) => render::print_no_results(),
        Ok(SearchOutcome::RequestFailed(reason)) => render::print_request_failed(&reason),
        Err(SubmitError::Invalid(form)) => render::print_field_errors(&form),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn choose_photos_to_save(session: &SearchSession, photos: &[PhotoRecord]) -> Result<()> {
    let labels: Vec<String> = photos.iter().map(render::photo_label).collect();
    let chosen = MultiSelect::new("Save photos:", labels.clone()).prompt()?;

    for label in chosen {
        let Some(index) = labels.iter().position(|l| *l == label) else {
            continue;
        };
        let photo = &photos[index];
        if session.save(photo) {
            println!("{} Saved {}", "✓".green(), photo.id);
        } else {
            println!("{} Photo {} is already saved", "ℹ".blue().bold(), photo.id);
        }
    }
    Ok(())
}

fn print_saved(session: &SearchSession) {
    let saved = session.saved();
    if saved.is_empty() {
        println!("No photos saved this session.");
        return;
    }
    println!("{} {} photos", "Saved".green().bold(), saved.len());
    println!("{}", render::photos_table(saved.iter()));
}
