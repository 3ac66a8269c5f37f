//! The `prephub init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("prephub.toml").exists() {
        println!("prephub.toml already exists, skipping.");
    } else {
        std::fs::write("prephub.toml", SAMPLE_CONFIG)?;
        println!("Created prephub.toml");
    }

    std::fs::create_dir_all("banks")?;
    let sample_path = Path::new("banks/sample.toml");
    if sample_path.exists() {
        println!("banks/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_BANK)?;
        println!("Created banks/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point api_base_url in prephub.toml at your server, or work offline");
    println!("  2. Run: prephub validate --bank banks/sample.toml");
    println!("  3. Run: prephub take --quiz 2 --bank banks/sample.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# prephub configuration

api_base_url = "http://localhost:8000"
request_timeout_secs = 30
output_dir = "./prephub-results"

# Where `prephub login` stores credentials.
# credentials_path = "~/.config/prephub/credentials.json"

# Use a token directly instead of logging in.
# token = "${PREPHUB_TOKEN}"
"#;

const SAMPLE_BANK: &str = include_str!("../../../../banks/sample.toml");
