//! Command-line surface of `barber`.

use std::path::PathBuf;

use barber_core::models::UserType;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "barber", version, about = "Book and manage barbershop appointments")]
pub struct Cli {
    /// Config file (defaults to ./barber.toml, then the user config dir).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Print data as JSON instead of text.
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Create a client or barber account.
    Register(RegisterArgs),
    /// Show the logged-in user.
    Whoami,
    /// List barbers.
    Barbers,
    /// Free times of a barber on a date.
    Slots(SlotsArgs),
    /// Book an appointment.
    Book(BookArgs),
    /// Your appointments.
    #[command(subcommand)]
    Appointments(AppointmentsCommand),
    /// Your weekly working hours (barbers).
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// The services you offer (barbers).
    #[command(subcommand)]
    Services(ServicesCommand),
    /// Your profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, short = 'e')]
    pub email: String,

    #[arg(long, short = 'p', env = "BARBER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "BARBER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Defaults to `--password`.
    #[arg(long)]
    pub confirm_password: Option<String>,

    #[arg(long)]
    pub phone: String,

    /// `client` or `barber`.
    #[arg(long = "type", default_value = "client")]
    pub user_type: UserType,
}

#[derive(Debug, Args)]
pub struct SlotsArgs {
    #[arg(long, short = 'b')]
    pub barber: i64,

    /// `YYYY-MM-DD`
    #[arg(long, short = 'd')]
    pub date: NaiveDate,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    #[arg(long, short = 'b')]
    pub barber: i64,

    #[arg(long, short = 's')]
    pub service: i64,

    /// `YYYY-MM-DD`
    #[arg(long, short = 'd')]
    pub date: NaiveDate,

    /// `HH:MM`, one of `barber slots`.
    #[arg(long, short = 't')]
    pub time: String,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Debug, Subcommand)]
pub enum AppointmentsCommand {
    /// Upcoming first, then the rest.
    List,
    Cancel { id: i64 },
    /// Barbers only.
    Complete { id: i64 },
}

#[derive(Debug, Args)]
pub struct SlotArgs {
    /// 0 = Monday … 6 = Sunday.
    #[arg(long)]
    pub day: u8,

    /// `HH:MM`
    #[arg(long)]
    pub start: String,

    /// `HH:MM`
    #[arg(long)]
    pub end: String,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    List,
    /// Flip a slot between active and inactive.
    Toggle { id: i64 },
    Add(SlotArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        slot: SlotArgs,
    },
    Delete { id: i64 },
    /// Let the server create its standard week.
    Defaults,
}

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub price: f64,

    /// Minutes.
    #[arg(long)]
    pub duration: u32,
}

#[derive(Debug, Subcommand)]
pub enum ServicesCommand {
    List,
    Add(ServiceArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        service: ServiceArgs,
    },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    /// Change only the fields given.
    Edit(ProfileEditArgs),
}

#[derive(Debug, Args)]
pub struct ProfileEditArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long, conflicts_with = "clear_avatar")]
    pub avatar_url: Option<String>,

    /// Go back to the default avatar.
    #[arg(long)]
    pub clear_avatar: bool,
}
