use anyhow::Result;
use wayshare::provider::ProviderFile;

fn main() -> Result<()> {
    let schema = schemars::schema_for!(ProviderFile);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
