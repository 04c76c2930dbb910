use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

pub fn validate_csv_file(path: &str) -> Result<()> {
    validate_file_with_extension(path, "csv")
}

pub fn validate_json_file(path: &str) -> Result<()> {
    validate_file_with_extension(path, "json")
}

fn validate_file_with_extension(path: &str, expected: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if ext.as_deref() != Some(expected) {
        anyhow::bail!("File must have a .{} extension: {}", expected, path);
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Print a config as pretty JSON so it can be saved and edited.
pub fn print_config_template<T: Serialize>(config: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    println!("{}", json);
    Ok(())
}
