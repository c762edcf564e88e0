use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rover_core::{FormInput, SearchOutcome, SearchSession, SubmitError};

use crate::render;

#[derive(Args, Debug)]
#[command(about = "Search photos by Earth date or SOL, rover and camera")]
pub struct SearchArgs {
    #[arg(help = "Earth date (YYYY-M-D) or SOL number")]
    date_or_sol: String,

    #[arg(long, short = 'r', help = "Rover whose photos to search")]
    rover: String,

    #[arg(long, short = 'c', help = "Camera abbreviation, e.g. fhaz or navcam")]
    camera: String,

    #[arg(long, help = "Return search results in JSON format")]
    json: bool,
}

pub async fn execute(session: &SearchSession, args: SearchArgs) -> Result<()> {
    render::load_manifests(session).await?;

    let input = FormInput::new(args.date_or_sol, args.rover, args.camera);
    let spinner = render::create_spinner("Searching for photos...");
    let submitted = session.submit(&input).await;
    spinner.finish_and_clear();

    let outcome = match submitted {
        Ok(outcome) => outcome,
        Err(SubmitError::Invalid(form)) => {
            render::print_field_errors(&form);
            anyhow::bail!("Search input is invalid");
        }
        Err(e) => return Err(e.into()),
    };

    match outcome {
        SearchOutcome::Success(photos) if args.json => {
            println!("{}", serde_json::to_string_pretty(&photos)?);
        }
        SearchOutcome::Empty if args.json => println!("[]"),
        SearchOutcome::Success(photos) => {
            println!("{} {} photos", "Found".green().bold(), photos.len());
            println!("{}", render::photos_table(&photos));
        }
        SearchOutcome::Empty => render::print_no_results(),
        SearchOutcome::RequestFailed(reason) => {
            render::print_request_failed(&reason);
            anyhow::bail!("Photo search failed");
        }
    }
    Ok(())
}
