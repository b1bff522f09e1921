use anyhow::Result;
use woudc::{Client, DataQuery, SortOrder, TimeInterval};

fn main() -> Result<()> {
    // Example program that fetches total ozone observations for the Toronto
    // station over one year, newest first.
    let client = Client::from_env()?;

    let query = DataQuery::new()
        .with_property("platform_id", "077")
        .with_interval(TimeInterval::between(
            "2024-01-01".parse::<woudc::Instant>()?,
            "2024-12-31".parse::<woudc::Instant>()?,
        ))
        .with_sortby("observation_date", SortOrder::Desc);

    let data = client.get_data("totalozone", &query)?;
    println!("{}", serde_json::to_string_pretty(&data)?);

    Ok(())
}
