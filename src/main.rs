use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use woudc::{BoundingBox, Client, DataQuery, Instant, SortOrder, TimeInterval};

#[derive(Debug, Parser)]
#[command(name = "woudc", version, about = "WOUDC data service client")]
struct Cli {
    /// Base URL of the WOUDC API (default: https://api.woudc.org).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all stations.
    Stations {
        /// Print the full GeoJSON payload instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Show a single station by WOUDC platform identifier.
    Station { id: String },

    /// List all instruments.
    Instruments {
        #[arg(long)]
        json: bool,
    },

    /// Show a single instrument by identifier.
    Instrument { id: String },

    /// List all contributors.
    Contributors {
        #[arg(long)]
        json: bool,
    },

    /// Show a single contributor by acronym.
    Contributor { id: String },

    /// Query observations from a data collection.
    Data {
        /// Data collection name, e.g. "totalozone".
        dataset: String,

        /// Spatial filter: minx,miny,maxx,maxy (WGS 84).
        #[arg(long)]
        bbox: Option<BoundingBox>,

        /// Start of the temporal filter (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS").
        #[arg(long)]
        begin: Option<Instant>,

        /// End of the temporal filter.
        #[arg(long)]
        end: Option<Instant>,

        /// Property equality filter, repeatable.
        #[arg(long = "property", value_name = "NAME=VALUE")]
        properties: Vec<String>,

        /// Property to sort results by (server-side).
        #[arg(long)]
        sortby: Option<String>,

        /// Sort order: asc or desc.
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new(cli.url, cli.timeout.map(Duration::from_secs))?;

    match cli.command {
        Command::Stations { json } => print_collection(&client.stations()?, json),
        Command::Station { id } => print_feature(&client.station(&id)?),
        Command::Instruments { json } => print_collection(&client.instruments()?, json),
        Command::Instrument { id } => print_feature(&client.instrument(&id)?),
        Command::Contributors { json } => print_collection(&client.contributors()?, json),
        Command::Contributor { id } => print_feature(&client.contributor(&id)?),
        Command::Data {
            dataset,
            bbox,
            begin,
            end,
            properties,
            sortby,
            order,
        } => {
            let query = build_query(bbox, begin, end, &properties, sortby, order)?;
            let data = client.get_data(&dataset, &query)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
    }
}

fn build_query(
    bbox: Option<BoundingBox>,
    begin: Option<Instant>,
    end: Option<Instant>,
    properties: &[String],
    sortby: Option<String>,
    order: SortOrder,
) -> Result<DataQuery> {
    let mut query = DataQuery::new();

    if let Some(bbox) = bbox {
        query = query.with_bbox(bbox);
    }
    if begin.is_some() || end.is_some() {
        query = query.with_interval(TimeInterval::new(begin, end)?);
    }
    for pair in properties {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("property filter must be NAME=VALUE, got {pair:?}");
        };
        query = query.with_property(name, value);
    }
    if let Some(property) = sortby {
        query = query.with_sortby(property, order);
    }

    Ok(query)
}

fn print_collection(collection: &FeatureCollection, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(collection)?);
        return Ok(());
    }

    for feature in &collection.features {
        println!("{}", feature_label(feature));
    }
    Ok(())
}

fn print_feature(feature: &Feature) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(feature).context("failed to render feature")?
    );
    Ok(())
}

/// One-line summary of a feature: its identifier, plus a `name` property
/// when the collection carries one.
fn feature_label(feature: &Feature) -> String {
    let id = match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => "-".to_string(),
    };

    match feature.property("name").and_then(Value::as_str) {
        Some(name) => format!("{id}: {name}"),
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn query_assembles_all_filters() {
        let query = build_query(
            Some(BoundingBox::new(-142.0, 42.0, -52.0, 84.0)),
            Some("2024-01-01".parse().unwrap()),
            None,
            &["platform_id=077".to_string()],
            Some("observation_date".to_string()),
            SortOrder::Desc,
        )
        .unwrap();

        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("bbox".to_string(), "-142,42,-52,84".to_string())));
        assert!(pairs.contains(&("datetime".to_string(), "2024-01-01T00:00:00Z/..".to_string())));
        assert!(pairs.contains(&("platform_id".to_string(), "077".to_string())));
        assert!(pairs.contains(&("sortby".to_string(), "-observation_date".to_string())));
    }

    #[test]
    fn query_rejects_malformed_property() {
        let err = build_query(None, None, None, &["platform_id".to_string()], None, SortOrder::Asc);
        assert!(err.is_err());
    }

    #[test]
    fn feature_labels() {
        let feature: Feature = serde_json::from_str(
            r#"{"type": "Feature", "id": "077", "geometry": null,
                "properties": {"name": "Toronto"}}"#,
        )
        .unwrap();
        assert_eq!(feature_label(&feature), "077: Toronto");

        let bare: Feature = serde_json::from_str(
            r#"{"type": "Feature", "id": 7, "geometry": null, "properties": {}}"#,
        )
        .unwrap();
        assert_eq!(feature_label(&bare), "7");
    }
}
