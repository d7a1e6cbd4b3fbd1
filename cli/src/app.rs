//! Command handlers. Each one opens the screen it needs, runs one action,
//! and lets the screen close when it goes out of scope.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use barber_core::models::{RegisterUser, User};
use barber_core::registration::register;
use barber_core::screens::{
    AppointmentBook, BookingWizard, ProfileEditor, ServiceCatalog, ServiceInput, SlotInput,
    WeeklySchedule,
};
use barber_core::{
    BookingClient, ClientConfig, ConfigLoader, FileSessionStore, NoticeBuffer, ScreenContext,
    SessionStore,
};
use chrono::Local;

use crate::args::{
    AppointmentsCommand, BookArgs, Cli, Command, LoginArgs, ProfileCommand, ProfileEditArgs,
    RegisterArgs, ScheduleCommand, ServiceArgs, ServicesCommand, SlotArgs, SlotsArgs,
};
use crate::output::{self, Output};

pub struct App {
    config: ClientConfig,
    store: FileSessionStore,
    notices: NoticeBuffer,
    pub out: Output,
}

impl App {
    pub fn new(config_path: Option<PathBuf>, json: bool) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::new().with_file(path).load()?,
            None => ConfigLoader::load_default()?,
        };
        let session_path = config
            .session_path()
            .context("no config directory for the session file; set `session_file`")?;
        let notices = NoticeBuffer::new();
        Ok(Self {
            store: FileSessionStore::new(session_path),
            out: Output::new(json, notices.clone()),
            notices,
            config,
        })
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Login(args) => self.login(args).await,
            Command::Logout => self.logout(),
            Command::Register(args) => self.register(args).await,
            Command::Whoami => self.whoami().await,
            Command::Barbers => self.barbers().await,
            Command::Slots(args) => self.slots(args).await,
            Command::Book(args) => self.book(args).await,
            Command::Appointments(cmd) => self.appointments(cmd).await,
            Command::Schedule(cmd) => self.schedule(cmd).await,
            Command::Services(cmd) => self.services(cmd).await,
            Command::Profile(cmd) => self.profile(cmd).await,
        }
    }

    fn anonymous_client(&self) -> anyhow::Result<BookingClient> {
        let client = BookingClient::new(self.config.api_url()?, self.config.request_timeout())?
            .with_retry(self.config.retry.clone());
        Ok(client)
    }

    fn client(&self) -> anyhow::Result<BookingClient> {
        let Some(session) = self.store.load()? else {
            bail!("Not logged in. Run `barber login` first.");
        };
        Ok(self.anonymous_client()?.with_session(session))
    }

    fn context(&self) -> anyhow::Result<ScreenContext> {
        Ok(ScreenContext::new(self.client()?, Arc::new(self.notices.clone()))
            .with_mutation_timeout(self.config.mutation_timeout())
            .with_retry(self.config.retry.clone()))
    }

    async fn login(&self, args: LoginArgs) -> anyhow::Result<()> {
        let session = self
            .anonymous_client()?
            .login(args.email.trim(), &args.password)
            .await?;
        self.store.save(&session)?;
        tracing::debug!(path = %self.store.path().display(), "session stored");
        if self.out.is_json() {
            return self.out.data(&session_summary(&session));
        }
        self.out
            .line(format!("Logged in as {} ({})", session.name, session.user_type));
        Ok(())
    }

    fn logout(&self) -> anyhow::Result<()> {
        self.store.clear()?;
        self.out.line("Logged out");
        Ok(())
    }

    async fn register(&self, args: RegisterArgs) -> anyhow::Result<()> {
        let form = RegisterUser {
            confirm_password: args.confirm_password.unwrap_or_else(|| args.password.clone()),
            name: args.name,
            email: args.email,
            password: args.password,
            phone: args.phone,
            user_type: args.user_type,
        };
        let message = register(&self.anonymous_client()?, &form).await?;
        self.out.line(if message.is_empty() {
            "Account created. You can log in now.".to_string()
        } else {
            message
        });
        Ok(())
    }

    async fn whoami(&self) -> anyhow::Result<()> {
        let user = self.client()?.current_user().await?;
        self.show_user(&user)
    }

    async fn barbers(&self) -> anyhow::Result<()> {
        let barbers = self.client()?.barbers().await?;
        if self.out.is_json() {
            return self.out.data(&barbers);
        }
        output::users(&barbers);
        Ok(())
    }

    async fn slots(&self, args: SlotsArgs) -> anyhow::Result<()> {
        let times = self
            .client()?
            .available_times(args.barber, args.date)
            .await?;
        if self.out.is_json() {
            return self.out.data(&times);
        }
        if times.is_empty() {
            self.out.line("No free times on that date");
        } else {
            self.out.line(times.join("  "));
        }
        Ok(())
    }

    async fn book(&self, args: BookArgs) -> anyhow::Result<()> {
        let mut wizard = BookingWizard::open(self.context()?).await?;
        wizard.select_barber(args.barber).await?;
        wizard.select_service(args.service)?;
        wizard
            .select_date(args.date, Local::now().date_naive())
            .await?;
        wizard.select_time(&args.time)?;
        wizard.set_notes(args.notes);
        wizard.review()?;
        wizard.submit().await?;
        if self.out.is_json() {
            return self.out.data(wizard.selection());
        }
        Ok(())
    }

    async fn appointments(&self, cmd: AppointmentsCommand) -> anyhow::Result<()> {
        let book = AppointmentBook::open(self.context()?).await?;
        match cmd {
            AppointmentsCommand::List => {
                let now = Local::now().naive_local();
                let view = book.view(now);
                if self.out.is_json() {
                    return self.out.data(&view);
                }
                output::appointments(&view, now);
            }
            AppointmentsCommand::Cancel { id } => book.cancel(id).await?,
            AppointmentsCommand::Complete { id } => book.complete(id).await?,
        }
        Ok(())
    }

    async fn schedule(&self, cmd: ScheduleCommand) -> anyhow::Result<()> {
        let schedule = WeeklySchedule::open(self.context()?).await?;
        match cmd {
            ScheduleCommand::List => {}
            ScheduleCommand::Toggle { id } => schedule.toggle_active(id).await?,
            ScheduleCommand::Add(slot) => schedule.add(slot_input(slot)).await?,
            ScheduleCommand::Edit { id, slot } => schedule.edit(id, slot_input(slot)).await?,
            ScheduleCommand::Delete { id } => schedule.delete(id).await?,
            ScheduleCommand::Defaults => schedule.create_defaults().await?,
        }
        let rows = schedule.rows();
        if self.out.is_json() {
            return self.out.data(&rows);
        }
        output::schedule(&rows);
        Ok(())
    }

    async fn services(&self, cmd: ServicesCommand) -> anyhow::Result<()> {
        let catalog = ServiceCatalog::open(self.context()?).await?;
        match cmd {
            ServicesCommand::List => {}
            ServicesCommand::Add(service) => catalog.add(service_input(service)).await?,
            ServicesCommand::Edit { id, service } => {
                catalog.edit(id, service_input(service)).await?;
            }
            ServicesCommand::Delete { id } => catalog.delete(id).await?,
        }
        let services = catalog.services();
        if self.out.is_json() {
            return self.out.data(&services);
        }
        output::services(&services);
        Ok(())
    }

    async fn profile(&self, cmd: ProfileCommand) -> anyhow::Result<()> {
        let editor = ProfileEditor::open(self.context()?).await?;
        if let ProfileCommand::Edit(args) = cmd {
            let Some(current) = editor.form() else {
                bail!("profile not loaded");
            };
            editor.save(&edited_form(current, args)).await?;
        }
        match editor.profile() {
            Some(user) => self.show_user(&user),
            None => Ok(()),
        }
    }

    fn show_user(&self, user: &User) -> anyhow::Result<()> {
        if self.out.is_json() {
            return self.out.data(user);
        }
        output::user(user);
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct SessionSummary<'a> {
    user_id: i64,
    name: &'a str,
    user_type: &'a str,
}

fn session_summary(session: &barber_core::Session) -> SessionSummary<'_> {
    SessionSummary {
        user_id: session.user_id,
        name: &session.name,
        user_type: session.user_type.as_str(),
    }
}

fn slot_input(args: SlotArgs) -> SlotInput {
    SlotInput {
        day_of_week: args.day,
        start_time: args.start,
        end_time: args.end,
    }
}

fn service_input(args: ServiceArgs) -> ServiceInput {
    ServiceInput {
        name: args.name,
        description: args.description,
        price: args.price,
        duration: args.duration,
    }
}

/// Overlay the flags given on the current profile form.
fn edited_form(
    mut form: barber_core::screens::ProfileForm,
    args: ProfileEditArgs,
) -> barber_core::screens::ProfileForm {
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(email) = args.email {
        form.email = email;
    }
    if let Some(phone) = args.phone {
        form.phone = phone;
    }
    if let Some(password) = args.password {
        form.password = password;
    }
    if args.clear_avatar {
        form.avatar_url = None;
    } else if let Some(url) = args.avatar_url {
        form.avatar_url = Some(url);
    }
    form
}
