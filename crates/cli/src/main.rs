use clap::Parser;

fn main() -> anyhow::Result<()> {
    plates_observability::init();

    let args = plates_cli::ReportArgs::parse();
    let config = plates_infra::config::CatalogConfig::from_env();
    tracing::debug!(?config, "catalog config loaded");

    let report = plates_cli::run(&args, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
