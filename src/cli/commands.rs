use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fundledger", about = "Crowdfunding ledger for investors and startups")]
pub struct Cli {
    /// Act as this user (id or id prefix)
    #[arg(long = "as", global = true)]
    pub caller: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a user
    UserAdd {
        /// JSON data with username, password, email, role (investor, startup), wallet_address
        json: String,
    },
    /// List users, or show one
    Users {
        id: Option<String>,
    },
    /// Set the caller's wallet address
    WalletSet {
        user: String,
        address: String,
    },
    /// Confirm the caller's stored wallet address (one-way)
    WalletConfirm {
        user: String,
        address: String,
    },
    /// Delete the caller and everything they own or invested
    UserDelete {
        user: String,
    },
    /// Create the caller's startup
    StartupAdd {
        /// JSON data with name, description, industry, location, website, funding_goal, logo, pitch_deck
        json: String,
    },
    /// List startups, or show one
    Startups {
        id: Option<String>,
        /// Show the startup owned by this user instead
        #[arg(long, conflicts_with = "id")]
        owner: Option<String>,
    },
    /// Record an investment backed by an existing transfer
    Invest {
        startup: String,
        /// Decimal amount, e.g. 1.5
        amount: String,
        /// Transfer reference
        #[arg(long)]
        tx: String,
    },
    /// Pay the founder's wallet and record the investment once confirmed
    Fund {
        startup: String,
        amount: String,
    },
    /// List investments
    Investments {
        #[arg(long, conflicts_with = "investor")]
        startup: Option<String>,
        #[arg(long)]
        investor: Option<String>,
    },
    /// Recompute a startup's funding total from its investments
    Reconcile {
        startup: String,
    },
    /// Funding progress for a startup
    Progress {
        startup: String,
    },
    /// Post an update for the caller's startup
    UpdateAdd {
        startup: String,
        /// JSON data with title, content
        json: String,
    },
    /// List updates
    Updates {
        #[arg(long)]
        startup: Option<String>,
    },
    /// Add a milestone to the caller's startup
    MilestoneAdd {
        startup: String,
        /// JSON data with title, description, target_date (YYYY-MM-DD)
        json: String,
    },
    /// List milestones, soonest target first
    Milestones {
        #[arg(long)]
        startup: Option<String>,
    },
    /// Mark a milestone completed
    MilestoneDone {
        id: String,
        /// Mark it open again instead
        #[arg(long)]
        undo: bool,
    },
    /// Resolve a possibly truncated id
    ResolveId {
        /// users, startups, investments, updates or milestones
        collection: String,
        id: String,
    },
    /// Show the minor-unit encoding of a decimal amount
    MinorUnits {
        amount: String,
    },
    /// Send a raw wallet transfer and wait for its receipt
    Transfer {
        to: String,
        amount: String,
        /// Print the reference and exit without waiting
        #[arg(long)]
        no_wait: bool,
    },
}
