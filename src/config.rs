use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "ticket-gateway")]
#[command(about = "Rate-limiting ingress gateway for the ticket support API")]
pub struct Args {
    // Port to run the gateway on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Ticket API backend to forward admitted requests to
    #[arg(short, long, default_value = "http://localhost:3000")]
    pub backend: String,

    // Max requests per client per minute
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub requests_per_minute: u32,

    // Max requests per client per hour
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    pub requests_per_hour: u32,

    // Seconds between idle-window eviction sweeps
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,
}
