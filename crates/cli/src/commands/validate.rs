use std::io::Read as _;
use std::path::Path;

use anyhow::{Context as _, Result};
use dqbot_core::sql;

pub(crate) fn run(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        },
    };
    sql::validate(&text)?;
    println!("OK");
    Ok(())
}
