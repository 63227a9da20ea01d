use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "salon", version, about = "Salon booking admin CLI")]
struct Cli {
    /// Server URL
    #[arg(long, env = "SALON_URL", default_value = "http://localhost:8080")]
    server: String,

    /// Access token (from `salon login`)
    #[arg(long, env = "SALON_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print an access token
    Login { email: String, password: String },
    /// List all bookings (admin)
    Bookings {
        /// Only show bookings with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show booking statistics (admin)
    Stats,
    /// Permanently delete a booking (admin)
    Delete {
        /// Booking ID
        booking_id: String,
    },
    /// Cancel a booking
    Cancel {
        /// Booking ID
        booking_id: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let api = Api {
        client: Client::new(),
        server: cli.server.trim_end_matches('/').to_string(),
        token: cli.token,
    };

    match cli.command {
        Commands::Login { email, password } => cmd_login(&api, &email, &password).await?,
        Commands::Bookings { status } => cmd_bookings(&api, status.as_deref()).await?,
        Commands::Stats => cmd_stats(&api).await?,
        Commands::Delete { booking_id } => cmd_delete(&api, &booking_id).await?,
        Commands::Cancel { booking_id, notes } => {
            cmd_cancel(&api, &booking_id, notes.as_deref()).await?
        }
    }

    Ok(())
}

struct Api {
    client: Client,
    server: String,
    token: Option<String>,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.server, path)
    }

    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .context("No token given: pass --token or set SALON_TOKEN (see `salon login`)")?;
        Ok(req.bearer_auth(token))
    }

    /// Send the request and return the JSON body of a successful response
    async fn send(&self, req: RequestBuilder) -> Result<Value> {
        let resp = req.send().await.context("Failed to connect to server")?;

        let status = resp.status();
        let body: Value = resp.json().await.context("Failed to parse response")?;

        if !status.is_success() {
            let err = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");
            anyhow::bail!("Server returned {}: {}", status, err);
        }
        Ok(body)
    }
}

async fn cmd_login(api: &Api, email: &str, password: &str) -> Result<()> {
    let body = api
        .send(
            api.client
                .post(api.url("/auth/login"))
                .json(&json!({"email": email, "password": password})),
        )
        .await?;

    let token = body
        .get("token")
        .and_then(|v| v.as_str())
        .context("Response has no token")?;
    println!("{}", token);
    Ok(())
}

async fn cmd_bookings(api: &Api, status: Option<&str>) -> Result<()> {
    let mut req = api.client.get(api.url("/admin/bookings"));
    if let Some(status) = status {
        req = req.query(&[("status", status)]);
    }
    let body = api.send(api.authed(req)?).await?;

    let bookings = body
        .get("bookings")
        .and_then(|v| v.as_array())
        .context("Expected bookings array")?;

    if bookings.is_empty() {
        println!("No bookings found.");
        return Ok(());
    }

    println!(
        "{:36} {:10} {:5} {:12} {:16} {:20} CLIENT",
        "BOOKING ID", "DATE", "TIME", "STATUS", "BARBER", "SERVICE"
    );
    println!("{}", "-".repeat(130));
    for booking in bookings {
        println!("{}", format_booking_row(booking));
    }

    Ok(())
}

async fn cmd_stats(api: &Api) -> Result<()> {
    let req = api.authed(api.client.get(api.url("/admin/bookings")))?;
    let body = api.send(req).await?;
    let stats = body.get("stats").context("Response has no stats")?;

    print!("{}", format_stats(stats));
    Ok(())
}

async fn cmd_delete(api: &Api, booking_id: &str) -> Result<()> {
    let req = api.authed(
        api.client
            .delete(api.url(&format!("/admin/bookings/{}", booking_id))),
    )?;
    api.send(req).await?;

    println!("Booking deleted: {}", booking_id);
    Ok(())
}

async fn cmd_cancel(api: &Api, booking_id: &str, notes: Option<&str>) -> Result<()> {
    let req = api.authed(
        api.client
            .post(api.url("/bookings/cancel"))
            .json(&json!({"booking_id": booking_id, "notes": notes})),
    )?;
    let body = api.send(req).await?;

    let status = body
        .pointer("/booking/status")
        .and_then(|v| v.as_str())
        .unwrap_or("-");
    println!("Booking {}: {}", booking_id, status);
    Ok(())
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(|v| v.as_str()).unwrap_or("-")
}

fn format_booking_row(booking: &Value) -> String {
    let time = str_field(booking, "/time");
    format!(
        "{:36} {:10} {:5} {:12} {:16} {:20} {} <{}>",
        str_field(booking, "/booking_id"),
        str_field(booking, "/date"),
        time.get(..5).unwrap_or(time),
        str_field(booking, "/status"),
        str_field(booking, "/barber"),
        str_field(booking, "/service"),
        str_field(booking, "/owner/name"),
        str_field(booking, "/owner/email"),
    )
}

fn format_stats(stats: &Value) -> String {
    let count = |key: &str| stats.get(key).and_then(|v| v.as_u64()).unwrap_or(0);

    let mut out = format!(
        "Total:       {}\nConfirmed:   {}\nCancelled:   {}\nRescheduled: {}\n",
        count("total"),
        count("confirmed"),
        count("cancelled"),
        count("rescheduled"),
    );
    if let Some(by_service) = stats.get("by_service").and_then(|v| v.as_object()) {
        if !by_service.is_empty() {
            out.push_str("\nBy service:\n");
            for (service, n) in by_service {
                out.push_str(&format!("  {:24} {}\n", service, n.as_u64().unwrap_or(0)));
            }
        }
    }
    out
}
