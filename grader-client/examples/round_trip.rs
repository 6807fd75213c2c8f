//! Full round trip against a grading service
//!
//! Uploads an answer sheet, processes it, and downloads both artifacts.
//!
//! ```text
//! GRADER_URL=https://actgrader.com GRADER_TOKEN=... RUST_LOG=grader_client=debug \
//!     cargo run --example round_trip -- scans/sheet.jpg out/
//! ```

use grader_client::{GraderClient, Outcome, Overrides};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let image = args.next().ok_or("usage: round_trip <image> [download dir]")?;
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    let mut client = GraderClient::from_env()?;
    client.set_download_directory(&out_dir);

    println!("Uploading {}...", image);
    let uri = match client.upload_image(&image, &Overrides::new())? {
        Outcome::Success { value, .. } => value,
        Outcome::ServerRejected(response) => {
            println!("✗ Upload rejected ({}): {}", response.status(), response.text());
            return Ok(());
        }
    };
    println!("✓ Uploaded as {}", uri);
    client.set_uri(uri);

    let processed = client.process_image(&Overrides::new())?;
    if !processed.is_success() {
        println!("✗ Processing rejected ({})", processed.response().status());
        return Ok(());
    }
    println!("✓ Processed");

    let answers = out_dir.join("answers.json");
    match client.download_marked_answers(&answers, &Overrides::new())? {
        Outcome::Success { value, .. } => println!("✓ Marked answers saved to {}", value.display()),
        Outcome::ServerRejected(response) => println!("✗ Download rejected ({})", response.status()),
    }

    let confirmation = out_dir.join("confirmation.jpg");
    match client.download_confirmation_image(&confirmation, &Overrides::new())? {
        Outcome::Success { value, .. } => println!("✓ Confirmation image saved to {}", value.display()),
        Outcome::ServerRejected(response) => println!("✗ Download rejected ({})", response.status()),
    }

    Ok(())
}
