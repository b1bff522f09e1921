use anyhow::Result;
use woudc::Client;

fn main() -> Result<()> {
    // Example program that lists WOUDC stations.
    // The public endpoint is used unless overridden via env vars or `.woudcrc`.
    let client = Client::from_env()?;

    let stations = client.stations()?;
    for station in &stations.features {
        println!("{:?}", station.id);
    }
    println!("{} stations", stations.features.len());

    Ok(())
}
