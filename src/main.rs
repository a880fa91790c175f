use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use travel_admin_core::models::{BookingStatus, PaymentStatus};
use travel_admin_core::{
    AppConfig, BookingFeed, BookingFilters, BookingStats, CsvExport, HotelOperations, HotelSearch,
    RestClient, TracingNotifier,
};

#[derive(Parser, Debug)]
#[command(name = "travel-admin", version, about = "Booking and hotel inventory administration")]
struct Cli {
    /// Recorded as the actor in audit logs
    #[arg(long, global = true, default_value = "cli")]
    actor: String,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hotel, car, bike and adventure bookings
    #[command(subcommand)]
    Bookings(BookingsCommand),
    /// Hotel inventory
    #[command(subcommand)]
    Hotels(HotelsCommand),
}

#[derive(Subcommand, Debug)]
enum BookingsCommand {
    /// List bookings, newest first
    List(FilterArgs),
    /// Dashboard totals for the matching bookings
    Stats(FilterArgs),
    /// Write the matching bookings to bookings-YYYY-MM-DD.csv
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output directory, defaults to export.directory from the configuration
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Case-insensitive match on guest name, email, hotel or room type
    #[arg(long)]
    search: Option<String>,
    /// pending, confirmed, cancelled or completed
    #[arg(long)]
    status: Option<BookingStatus>,
    /// pending, paid, refunded or failed
    #[arg(long)]
    payment_status: Option<PaymentStatus>,
    #[arg(long)]
    hotel_id: Option<String>,
    /// Earliest check-in date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Latest check-in date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl From<FilterArgs> for BookingFilters {
    fn from(args: FilterArgs) -> Self {
        BookingFilters {
            search: args.search,
            status: args.status,
            payment_status: args.payment_status,
            hotel_id: args.hotel_id,
            date_from: args.from,
            date_to: args.to,
        }
    }
}

#[derive(Subcommand, Debug)]
enum HotelsCommand {
    /// List every hotel
    List,
    /// Search active hotels, featured first then cheapest
    Search {
        /// Substring of the hotel location
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_stars: Option<u8>,
        /// Required amenity, repeatable
        #[arg(long = "amenity")]
        amenities: Vec<String>,
        /// Only featured hotels
        #[arg(long)]
        featured: bool,
    },
    /// Flip the featured flag
    ToggleFeatured { id: String },
    /// Switch between active and inactive
    ToggleStatus { id: String },
    /// Copy a hotel with its rooms and seasonal pricing
    #[command(name = "clone")]
    CloneHotel { id: String },
    /// Audit entries and saved versions for a hotel
    History { id: String },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = AppConfig::load_with_dotenv().context("failed to load configuration")?;
    let backend_config = config.require_backend()?.clone();
    let backend = Arc::new(RestClient::new(backend_config).context("failed to create backend client")?);

    match cli.command {
        Command::Bookings(command) => {
            let feed = BookingFeed::new(Arc::clone(&backend));
            feed.refresh().await.context("failed to fetch bookings")?;
            let all = feed.bookings();

            match command {
                BookingsCommand::List(args) => {
                    let bookings = BookingFilters::from(args).apply(&all);
                    if cli.json {
                        print_json(&bookings)?;
                    } else {
                        for b in &bookings {
                            println!(
                                "{:<38} {:<10} {:<24} {:<28} {} -> {} {:>10.2} {:<10} {}",
                                b.id,
                                b.booking_type.label(),
                                b.guest_name,
                                b.hotel_name,
                                b.check_in,
                                b.check_out,
                                b.total_price,
                                b.booking_status,
                                b.payment_status,
                            );
                        }
                        println!("{} of {} bookings", bookings.len(), all.len());
                    }
                }
                BookingsCommand::Stats(args) => {
                    let stats = BookingStats::compute(&BookingFilters::from(args).apply(&all));
                    if cli.json {
                        print_json(&stats)?;
                    } else {
                        println!("Total bookings:   {}", stats.total_bookings);
                        println!("Total revenue:    {:.2}", stats.total_revenue);
                        println!("Average value:    {:.2}", stats.average_booking_value);
                        println!("Occupancy rate:   {:.1}%", stats.occupancy_rate * 100.0);
                        for (status, count) in &stats.by_status {
                            println!("  {:<12} {}", status.to_string(), count);
                        }
                    }
                }
                BookingsCommand::Export { filters, dir } => {
                    let bookings = BookingFilters::from(filters).apply(&all);
                    let export = CsvExport::from_bookings(&bookings, Utc::now().date_naive());
                    let directory = dir.unwrap_or_else(|| config.export.directory.clone());
                    let path = export
                        .write_to(&directory)
                        .with_context(|| format!("failed to write export to {}", directory.display()))?;
                    println!("Exported {} bookings to {}", bookings.len(), path.display());
                }
            }
        }
        Command::Hotels(command) => {
            let ops = HotelOperations::new(Arc::clone(&backend), Arc::new(TracingNotifier), &cli.actor);

            match command {
                HotelsCommand::List => {
                    let hotels = ops.list_hotels().await?;
                    if cli.json {
                        print_json(&hotels)?;
                    } else {
                        for h in &hotels {
                            println!(
                                "{:<38} {:<32} {:<24} {}* {:>8.2} {:<8} {}",
                                h.id,
                                h.name,
                                h.location,
                                h.stars,
                                h.price_per_night,
                                h.status.as_str(),
                                if h.featured { "featured" } else { "" },
                            );
                        }
                    }
                }
                HotelsCommand::Search {
                    location,
                    min_price,
                    max_price,
                    min_stars,
                    amenities,
                    featured,
                } => {
                    let criteria = HotelSearch {
                        location,
                        min_price,
                        max_price,
                        min_stars,
                        amenities,
                        featured_only: featured,
                    };
                    let hotels = ops.search(&criteria).await?;
                    if cli.json {
                        print_json(&hotels)?;
                    } else {
                        for h in &hotels {
                            println!("{:<32} {:<24} {:>8.2}", h.name, h.location, h.price_per_night);
                        }
                    }
                }
                HotelsCommand::ToggleFeatured { id } => {
                    let hotel = ops.toggle_featured(&id).await?;
                    println!("{} featured: {}", hotel.name, hotel.featured);
                }
                HotelsCommand::ToggleStatus { id } => {
                    let hotel = ops.toggle_status(&id).await?;
                    println!("{} is now {}", hotel.name, hotel.status.as_str());
                }
                HotelsCommand::CloneHotel { id } => {
                    let copy = ops.clone_hotel(&id).await?;
                    println!("Created {} ({})", copy.name, copy.id);
                }
                HotelsCommand::History { id } => {
                    let history = ops.audit().history(&id).await?;
                    let versions = ops.audit().versions(&id).await?;
                    if cli.json {
                        print_json(&serde_json::json!({ "audit": history, "versions": versions }))?;
                    } else {
                        for entry in &history {
                            println!("{} {:<20} {:<24} {}", entry.created_at, entry.action, entry.actor, entry.details);
                        }
                        for version in &versions {
                            println!("v{} by {} at {}", version.version_number, version.changed_by, version.created_at);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_describes_commands_and_flags() {
        let mut cli = Cli::command();
        let help = cli.render_help().to_string();
        assert!(help.contains("Recorded as the actor in audit logs"));
        assert!(help.contains("Hotel inventory"));

        let export = cli
            .find_subcommand_mut("bookings")
            .and_then(|bookings| bookings.find_subcommand_mut("export"))
            .unwrap();
        let help = export.render_help().to_string();
        assert!(help.contains("Output directory"));
        assert!(help.contains("Earliest check-in date"));
    }

    #[test]
    fn test_filter_flags_parse_into_booking_filters() {
        let cli = Cli::try_parse_from([
            "travel-admin",
            "bookings",
            "list",
            "--status",
            "canceled",
            "--from",
            "2025-06-01",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Bookings(BookingsCommand::List(args)) => {
                let filters = BookingFilters::from(args);
                assert_eq!(filters.status, Some(BookingStatus::Cancelled));
                assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2025, 6, 1));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_clone_subcommand_keeps_its_name() {
        let cli = Cli::try_parse_from(["travel-admin", "hotels", "clone", "h1"]).unwrap();
        assert!(matches!(cli.command, Command::Hotels(HotelsCommand::CloneHotel { id }) if id == "h1"));
    }
}
