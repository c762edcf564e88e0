use anyhow::Result;
use clap::Args;
use rover_core::SearchSession;

use crate::render;

#[derive(Args, Debug)]
#[command(about = "Show the date and SOL range of every mission")]
pub struct MissionsArgs {
    #[arg(long, help = "Print the manifests as JSON")]
    json: bool,
}

pub async fn execute(session: &SearchSession, args: MissionsArgs) -> Result<()> {
    render::load_manifests(session).await?;
    let manifests = session.manifests();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifests)?);
    } else {
        println!("{}", render::manifests_table(&manifests));
    }
    Ok(())
}
