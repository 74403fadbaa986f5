use clap::{Parser, Subcommand};
use reelhook_common::{ContentKind, MediaKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelhook")]
#[command(author, version, about = "Channel upload ingestion and catalog builder")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a filename and print the result without storing anything
    Parse {
        /// Filename to parse
        #[arg(required = true)]
        input: String,

        /// Caption posted with the upload
        #[arg(long)]
        caption: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ingest a single upload into the catalog
    Ingest {
        /// Uploaded filename
        #[arg(required = true)]
        filename: String,

        /// Opaque media reference (e.g. the channel's file id)
        #[arg(long)]
        media_ref: String,

        /// Caption posted with the upload
        #[arg(long)]
        caption: Option<String>,

        /// Size of the upload in bytes
        #[arg(long, default_value = "0")]
        size: i64,

        /// How the media was posted
        #[arg(long, default_value = "video")]
        media_kind: MediaKind,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ingest every event of a JSON-lines file, in order
    Replay {
        /// File with one ingestion event per line
        #[arg(required = true)]
        events: PathBuf,
    },

    /// List catalog records
    List {
        /// Only records of this kind (movie, series)
        #[arg(long)]
        kind: Option<ContentKind>,

        /// Only placeholder records awaiting resolution
        #[arg(long)]
        unresolved: bool,

        /// Only titles containing this text
        #[arg(long)]
        title: Option<String>,

        /// Maximum number of records
        #[arg(long)]
        limit: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record with its variants
    Show {
        /// Content id
        #[arg(required = true)]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retry the catalog lookup for a placeholder record
    Resolve {
        /// Content id
        #[arg(required = true)]
        id: String,

        /// Corrected title to search for (also renames the record)
        #[arg(long)]
        title: Option<String>,
    },

    /// Send the announcement for a stored record again
    Notify {
        /// Content id
        #[arg(required = true)]
        id: String,
    },

    /// Delete a record and all of its variants
    Delete {
        /// Content id
        #[arg(required = true)]
        id: String,
    },

    /// Set the trending / coming-soon flags of a record
    Flag {
        /// Content id
        #[arg(required = true)]
        id: String,

        /// Mark or unmark as trending
        #[arg(long)]
        trending: Option<bool>,

        /// Mark or unmark as coming soon
        #[arg(long)]
        coming_soon: Option<bool>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
