use ps_space::SearchSpaceConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => std::env::var("PARAMSPACE_CONFIG").map_err(|_| {
            anyhow::anyhow!("usage: space-inspect <config.json> (or set PARAMSPACE_CONFIG)")
        })?,
    };

    let space = SearchSpaceConfig::from_path(&path)?.build()?;
    tracing::info!(
        "Built {} search space with {} parameters",
        space.as_parameter_space().name(),
        space.as_parameter_space().search_space().parameters().len()
    );
    println!("{space}");

    if let Some(hss) = space.as_hierarchical() {
        println!();
        print!("{}", hss.hierarchical_structure_str(true));
    }

    match space.as_parameter_space().search_space().digest() {
        Ok(digest) => {
            println!();
            println!("{}", serde_json::to_string_pretty(&digest)?);
        }
        Err(e) => tracing::warn!("Search space has no numeric digest: {}", e),
    }

    Ok(())
}
