use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::http::{AyushSystem, SearchSource};

#[derive(Parser)]
#[command(name = "namaste-explorer")]
#[command(about = "Explore the NAMASTE/ICD-11 terminology mapping API", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the configuration file",
        default_value = "data/config.toml"
    )]
    pub config: PathBuf,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[arg(long, global = true, help = "Print responses as JSON instead of tables")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    #[arg(
        short = 'u',
        long,
        global = true,
        help = "Base URL of the terminology API (overrides the config file)"
    )]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check API liveness and version
    Health,
    /// Show the server's aggregate statistics
    Stats {
        #[arg(short, long, help = "Keep refreshing until Ctrl+C")]
        watch: bool,
    },
    /// Search NAMASTE and ICD-11 terms
    Search {
        #[arg(help = "Free-text query")]
        query: String,
        #[arg(short, long, help = "Vocabulary to search (namaste, icd11, both)", default_value_t = SearchSource::Both)]
        source: SearchSource,
        #[arg(long, alias = "ayush-system", help = "AYUSH system filter (ayurveda, yoga, unani, siddha, homeopathy)")]
        system: Option<AyushSystem>,
        #[arg(short, long, help = "Also print the untransformed server payload")]
        raw: bool,
        #[arg(long, help = "Only print the request URL, do not send it")]
        dry_run: bool,
    },
    /// Map a NAMASTE term to ICD-11
    Map {
        #[arg(help = "NAMASTE identifier, e.g. NAM001")]
        namaste_id: String,
        #[arg(short, long, help = "Embed a FHIR Condition resource in the result")]
        include_fhir: bool,
        #[arg(long, help = "Only print the request URL, do not send it")]
        dry_run: bool,
    },
    /// Map several NAMASTE terms in one request
    BulkMap {
        #[arg(
            short,
            long,
            conflicts_with = "body",
            required_unless_present = "body",
            help = "Path to a JSON file of the form {\"terms\":[{\"namaste_id\":..,\"patient_id\":..}]}"
        )]
        file: Option<PathBuf>,
        #[arg(short, long, help = "Inline JSON request body")]
        body: Option<String>,
    },
    /// Fetch a FHIR Condition resource for a patient
    Fhir {
        #[arg(help = "NAMASTE identifier")]
        namaste_id: String,
        #[arg(help = "Patient identifier")]
        patient_id: String,
        #[arg(long, help = "Only print the request URL, do not send it")]
        dry_run: bool,
    },
    /// Poll health and stats periodically, like the web dashboard
    Dashboard {
        #[arg(short, long, help = "Seconds between refreshes (overrides the config file)")]
        interval: Option<u64>,
        #[arg(short, long, help = "Stop after this many refreshes")]
        ticks: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments_parse() {
        let cli = Cli::parse_from([
            "namaste-explorer",
            "search",
            "fever",
            "--source",
            "icd11",
            "--system",
            "siddha",
        ]);
        match cli.command {
            Commands::Search {
                query, source, system, ..
            } => {
                assert_eq!(query, "fever");
                assert_eq!(source, SearchSource::Icd11);
                assert_eq!(system, Some(AyushSystem::Siddha));
            },
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_bulk_map_requires_input() {
        assert!(Cli::try_parse_from(["namaste-explorer", "bulk-map"]).is_err());
        assert!(Cli::try_parse_from(["namaste-explorer", "bulk-map", "--body", "{}"]).is_ok());
    }
}
