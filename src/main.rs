//! Terminal front end for the QRush ticketing API.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qrush_client::auth::{self, SignupForm};
use qrush_client::editor::{self, EventDraft};
use qrush_client::event::parse_local_datetime;
use qrush_client::models::Role;
use qrush_client::organizer::{self, Compensation, Propagation};
use qrush_client::prefs::{EventDefaults, OrganizerProfile};
use qrush_client::purchase::{self, TicketPurchase};
use qrush_client::{views, Client, ClientConfig, Event, PaymentMethod};

#[derive(Parser)]
#[command(name = "qrush")]
#[command(version = "0.1")]
#[command(about = "Browse events, book tickets and manage organizer settings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides QRUSH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all events
    Events,
    /// Show one event
    Event { id: i64 },
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        contact: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birthdate: String,
        #[arg(long)]
        gender: String,
        #[arg(long, default_value = "attendee")]
        role: String,
    },
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Book tickets for an event
    Book {
        id: i64,
        /// Ticket type name; defaults to the first one listed
        #[arg(long)]
        ticket_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
        /// gcash, maya, credit-card or bank-transfer
        #[arg(long)]
        payment: String,
    },
    /// Show the dashboard for the signed-in user
    Dashboard,
    /// Publish a new event, or update one with --edit.
    /// When editing, only the flags given are changed.
    Publish {
        #[arg(long)]
        title: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        end_time: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long)]
        edit: Option<i64>,
    },
    /// Cancel one of your events
    Cancel {
        id: i64,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Save the organizer profile and push it to your events
    Profile {
        #[arg(long, default_value = "")]
        organization: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        contact: String,
        /// Restore already-updated events if any update fails
        #[arg(long)]
        revert_on_failure: bool,
    },
    /// Save default location and price for new events
    Defaults {
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        price: Option<f64>,
    },
    /// List notifications
    Notifications,
    /// Show or change local notification settings
    Settings {
        #[arg(long)]
        email: Option<bool>,
        #[arg(long)]
        push: Option<bool>,
        #[arg(long)]
        reminders: Option<bool>,
        #[arg(long)]
        promotions: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_event_line(event: &Event) {
    println!(
        "{:>5}  {:<40} {:<28} {:>12}  {}",
        event.id.map(|id| id.to_string()).unwrap_or_default(),
        event.title,
        views::format_event_date(event.start.as_ref()),
        views::format_price(event.starting_price()),
        event.availability().label()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    let mut client = Client::open(config).context("failed to start client")?;
    let session = client.session().context("failed to restore session")?;

    match cli.command {
        Commands::Events => {
            let records = client.api.get_events().await.context("failed to load events")?;
            for record in records {
                print_event_line(&Event::from_record(record));
            }
        }
        Commands::Event { id } => {
            purchase::track_view(&client.api, &session, id).await;
            let event = purchase::load_event(&client.api, id, &client.prefs.reader(), &session)
                .await
                .context("failed to load event")?;
            println!("{}", event.title);
            println!("{}", event.description.summary_or_default());
            println!(
                "{} · {}",
                views::format_event_date(event.start.as_ref()),
                views::format_time_range(event.start.as_ref(), event.end.as_ref())
            );
            println!("{}", event.location);
            println!(
                "Organizer: {} {} {}",
                event.organizer_name, event.organizer_email, event.organizer_phone
            );
            println!("{}", event.availability().label());
            for ticket in &event.ticket_types {
                println!("  {:<20} {}", ticket.name, views::format_price(ticket.price));
            }
            for item in &event.agenda {
                println!("  {} {} {}", item.time, item.title, item.speaker);
            }
        }
        Commands::Signup {
            name,
            email,
            password,
            contact,
            birthdate,
            gender,
            role,
        } => {
            let form = SignupForm {
                name,
                email,
                password,
                contact,
                birthdate,
                gender,
                role,
            };
            let message = auth::signup(&client.api, &form).await?;
            println!("{message}");
        }
        Commands::Login { email, password } => {
            let session =
                auth::login(&client.api, &email, &password, Some(&client.sessions)).await?;
            if let Some(user) = session.user() {
                println!("Signed in as {} ({})", user.name, user.email);
            }
        }
        Commands::Logout => {
            auth::logout(&client.sessions)?;
            println!("Signed out.");
        }
        Commands::Book {
            id,
            ticket_type,
            quantity,
            payment,
        } => {
            let event = purchase::load_event(&client.api, id, &client.prefs.reader(), &session)
                .await
                .context("failed to load event")?;
            let mut selection = TicketPurchase::for_event(&event);
            if ticket_type.is_some() {
                selection.ticket_type = ticket_type;
            }
            selection.quantity = quantity;
            selection.payment_method = PaymentMethod::parse(&payment);
            let message = purchase::purchase(&client.api, &session, &event, &selection).await?;
            println!("{message}");
        }
        Commands::Dashboard => match session.role() {
            Some(Role::Organizer) => {
                let dashboard = organizer::fetch_dashboard(&client.api, &session).await?;
                println!(
                    "Events: {}  Tickets sold: {}  Revenue: {}  Avg attendance: {}%",
                    dashboard.total_events,
                    dashboard.total_tickets_sold,
                    views::format_currency(dashboard.total_revenue),
                    dashboard.average_attendance
                );
                for point in views::revenue_series(&dashboard.events) {
                    println!("  {:<12} {}", point.label, views::format_currency(point.value));
                }
                for event in &dashboard.events {
                    let start = event.event_start.as_deref().and_then(parse_local_datetime);
                    println!(
                        "{:>5}  {:<40} {:<14} {:>4}% sold  {} views",
                        event.event_id.map(|id| id.to_string()).unwrap_or_default(),
                        event.title,
                        views::format_short_date(start.as_ref()),
                        views::attendance_percentage(event.tickets_sold, event.capacity),
                        views::group_digits(event.views)
                    );
                }
            }
            Some(_) => {
                let Some(user_id) = session.user_id() else {
                    bail!("your profile is missing an identifier, sign in again");
                };
                let dashboard = client.api.get_attendee_dashboard(user_id).await?;
                println!(
                    "Active tickets: {}  Events attended: {}  Total spent: {}",
                    dashboard.active_tickets,
                    dashboard.events_attended,
                    views::format_currency(dashboard.total_spent)
                );
                for ticket in dashboard.upcoming_tickets {
                    println!(
                        "  {} {}",
                        ticket.ticket_number.unwrap_or_default(),
                        ticket.event_title.unwrap_or_default()
                    );
                }
            }
            None => bail!("sign in first with `qrush login`"),
        },
        Commands::Publish {
            title,
            date,
            time,
            end_time,
            location,
            summary,
            capacity,
            edit,
        } => {
            let reader = client.prefs.reader();
            let mut draft = match edit {
                Some(event_id) => editor::load_draft(&client.api, event_id).await?,
                None => EventDraft::new_with_defaults(reader.event_defaults()?.as_ref()),
            };
            let changes = [
                (&mut draft.title, title),
                (&mut draft.date, date),
                (&mut draft.time, time),
                (&mut draft.end_time, end_time),
                (&mut draft.location, location),
                (&mut draft.summary, summary),
            ];
            for (slot, value) in changes {
                if let Some(value) = value {
                    *slot = value;
                }
            }
            if let Some(capacity) = capacity {
                draft.capacity = capacity;
            }
            let profile = reader.organizer_profile_for(session.user_id())?;
            let published =
                editor::publish(&client.api, &session, &draft, profile.as_ref(), edit).await?;
            println!("{}", published.message());
        }
        Commands::Cancel { id, reason } => {
            let title = client
                .api
                .get_event(id)
                .await?
                .map(|record| Event::from_record(record).title)
                .unwrap_or_else(|| format!("Event {id}"));
            let message = organizer::cancel_event(&client.api, id, &title, &reason).await?;
            println!("{message}");
        }
        Commands::Profile {
            organization,
            email,
            contact,
            revert_on_failure,
        } => {
            let dashboard = organizer::fetch_dashboard(&client.api, &session).await?;
            let form = OrganizerProfile {
                organization_name: organization,
                email,
                contact_number: contact,
                ..OrganizerProfile::default()
            };
            let compensation = if revert_on_failure {
                Compensation::Revert
            } else {
                Compensation::Keep
            };
            let propagation =
                Propagation::from_config(&client.config).with_compensation(compensation);
            let update = organizer::save_profile(
                &client.api,
                &mut client.prefs,
                &session,
                &form,
                &organizer::dashboard_event_ids(&dashboard),
                propagation,
            )
            .await?;
            println!("{}", update.report.message());
            for (event_id, outcome) in &update.report.items {
                println!("  {event_id}: {outcome:?}");
            }
        }
        Commands::Defaults { location, price } => {
            let defaults = EventDefaults {
                location: location.trim().to_string(),
                price,
            };
            println!("{}", organizer::save_defaults(&mut client.prefs, &defaults)?);
        }
        Commands::Notifications => {
            let Some(user_id) = session.user_id() else {
                bail!("sign in first with `qrush login`");
            };
            let unread = client.api.get_unread_notification_count(user_id).await?;
            println!("{} unread", unread.count);
            for note in client.api.get_notifications(user_id).await? {
                let marker = if note.is_read { " " } else { "*" };
                println!("{marker} {:<30} {}", note.title, note.message);
            }
        }
        Commands::Settings {
            email,
            push,
            reminders,
            promotions,
            sound,
        } => {
            let mut settings = client.prefs.reader().notification_settings()?;
            let changes = [
                (&mut settings.email, email),
                (&mut settings.push, push),
                (&mut settings.event_reminders, reminders),
                (&mut settings.promotions, promotions),
                (&mut settings.sound, sound),
            ];
            let mut changed = false;
            for (slot, value) in changes {
                if let Some(value) = value {
                    *slot = value;
                    changed = true;
                }
            }
            if changed {
                client.prefs.save_notification_settings(&settings)?;
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
