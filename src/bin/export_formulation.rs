//! Utility to export a saved formulation's nutrition sheet
//!
//! Usage: export_formulation <formulation-id> [--csv] [RDA category...]

use nutrieyeq::api::{ApiClient, FormulationStore};
use nutrieyeq::config::Config;
use nutrieyeq::tools::export::{export_formulation, SheetFormat};
use nutrieyeq::tools::formulation::Workbench;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let id = args
        .next()
        .ok_or("usage: export_formulation <formulation-id> [--csv] [RDA category...]")?;

    let mut with_csv = false;
    let mut categories = Vec::new();
    for arg in args {
        if arg == "--csv" {
            with_csv = true;
        } else {
            categories.push(arg);
        }
    }

    let config = Config::from_env();
    println!("API URL: {}", config.api_url);
    let client = ApiClient::new(config.api_url.clone(), config.session());

    let stored = client.load(&id).await?;
    let mut bench = Workbench::new(config.default_serve_size);
    bench.load(stored.into_formulation(config.default_serve_size));
    println!(
        "Loaded formulation: {} ({} ingredients)",
        bench.formulation().name,
        bench.formulation().ingredients.len()
    );

    let mut formats = vec![SheetFormat::Xlsx];
    if with_csv {
        formats.push(SheetFormat::Csv);
    }
    for format in formats {
        let result = export_formulation(&bench, &categories, format, &config.export_dir)?;
        println!("Wrote {} ({} bytes)", result.path, result.size_bytes);
    }

    Ok(())
}
