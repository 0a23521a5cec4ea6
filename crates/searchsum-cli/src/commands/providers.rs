use anyhow::Result;

use searchsum_core::ProviderFactory;

pub fn run() -> Result<()> {
    let default = ProviderFactory::default_provider();

    println!("Providers:\n");
    for (id, name) in ProviderFactory::available_providers() {
        let marker = if id == default { " (default)" } else { "" };
        println!("  {id:<8} {name}{marker}");
    }

    Ok(())
}
