//! Application state management for vaxsched.
//!
//! This module contains the `App` struct that owns the session store, the API
//! client and all view state. It implements the two-state view lifecycle:
//! without a token the login form is shown; with a token the patient list is
//! shown and fetched once on activation.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use vaxsched_core::api::{ApiClient, AuthError, FetchError};
use vaxsched_core::auth::SessionStore;
use vaxsched_core::config::Config;
use vaxsched_core::models::{Doctor, Immunization, Patient, PatientSchedule, Vaccine};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Generic notice shown for login failures that are not bad credentials.
const LOGIN_FAILED_MESSAGE: &str = "Login failed";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Patients,
    Vaccines,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Patients => "Patients",
            Tab::Vaccines => "Vaccines",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Patients => Tab::Vaccines,
            Tab::Vaccines => Tab::Patients,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Progress of a remote read as seen by the view.
///
/// `Failed` is kept distinct from an empty `Loaded` so that "no patients" and
/// "could not fetch patients" never look the same.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Schedule and immunization history for one patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDetail {
    pub schedule: PatientSchedule,
    pub immunizations: Vec<Immunization>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned fetch tasks back to the main loop.
#[derive(Debug)]
enum BackgroundResult {
    Patients(Result<Vec<Patient>, FetchError>),
    Doctor(Result<Doctor, FetchError>),
    Vaccines(Result<Vec<Vaccine>, FetchError>),
    /// Schedule and immunizations for a single patient (patient_id, detail)
    PatientDetail(i64, Result<PatientDetail, FetchError>),
    /// Token exchange for the login form (username, token)
    Login(String, Result<String, AuthError>),
}

/// A result tagged with the activation it belongs to.
type TaggedResult = (u64, BackgroundResult);

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    config_path: Option<PathBuf>,
    pub session: Box<dyn SessionStore>,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    /// Set while a token request is in flight
    pub login_pending: bool,

    // Selection indices
    pub patient_selection: usize,
    pub vaccine_selection: usize,
    /// Scroll offset of the patient detail pane
    pub detail_scroll: u16,

    // Fetched data
    pub doctor: Option<Doctor>,
    pub patients: LoadState<Vec<Patient>>,
    pub vaccines: LoadState<Vec<Vaccine>>,
    pub patient_details: HashMap<i64, LoadState<PatientDetail>>,

    // Background task channel
    background_rx: mpsc::Receiver<TaggedResult>,
    background_tx: mpsc::Sender<TaggedResult>,
    /// Bumped on every activation and logout; results from older
    /// generations are dropped.
    generation: u64,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance.
    ///
    /// `config_path` is where the config is written back (remembered
    /// username); `None` keeps the config in memory only.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        session: Box<dyn SessionStore>,
        api: ApiClient,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let login_username = config.last_username.clone().unwrap_or_default();

        let state = if session.is_authenticated() {
            AppState::Normal
        } else {
            AppState::LoggingIn
        };
        debug!(?state, "App created");

        let mut app = Self {
            config,
            config_path,
            session,
            api,

            state,
            current_tab: Tab::Patients,
            focus: Focus::List,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
            login_pending: false,

            patient_selection: 0,
            vaccine_selection: 0,
            detail_scroll: 0,

            doctor: None,
            patients: LoadState::Idle,
            vaccines: LoadState::Idle,
            patient_details: HashMap::new(),

            background_rx: rx,
            background_tx: tx,
            generation: 0,

            status_message: None,
        };

        if app.state == AppState::LoggingIn {
            app.start_login();
        }
        app
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Check if the session store holds a token
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Show the login form
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Submit the login form.
    ///
    /// The token request runs on a spawned task so the UI keeps drawing and
    /// reading keys; the outcome arrives through `check_background_tasks`.
    /// Nothing is sent while a previous request is still pending.
    pub fn attempt_login(&mut self) {
        if self.login_pending {
            return;
        }

        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }

        self.login_error = None;
        self.login_pending = true;
        self.status_message = Some("Signing in...".to_string());

        let api = self.api.clone();
        let tx = self.background_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = api.login(&username, &password).await;
            Self::send_result(&tx, generation, BackgroundResult::Login(username, result)).await;
        });
    }

    /// Hand a freshly issued token to the session store and leave the form.
    fn complete_login(&mut self, username: String, token: &str) {
        self.status_message = None;
        if let Err(e) = self.session.set(token) {
            warn!(error = %e, "Failed to persist session token");
            self.status_message = Some("Signed in, but the session could not be saved".to_string());
        }

        self.config.last_username = Some(username);
        self.save_config();

        self.login_password.clear();
        self.state = AppState::Normal;
        info!("Login successful");
    }

    /// Show a failure notice; the session store is left untouched.
    fn reject_login(&mut self, error: &AuthError) {
        error!(error = %error, "Login failed");
        self.status_message = None;
        self.login_error = Some(login_failure_notice(error).to_string());
    }

    /// Interactive login on the plain terminal (used for `--login`)
    pub async fn login_interactive(&mut self) -> Result<()> {
        println!("\n=== vaxsched login ===\n");

        let username = match self.config.last_username.clone() {
            Some(last_user) => {
                print!("Username [{}]: ", last_user);
                io::stdout().flush()?;
                let input = read_line()?;
                if input.is_empty() {
                    last_user
                } else {
                    input
                }
            }
            None => {
                print!("Username: ");
                io::stdout().flush()?;
                read_line()?
            }
        };
        let password = rpassword::prompt_password("Password: ")?;

        if username.is_empty() || password.is_empty() {
            return Err(anyhow::anyhow!("Username and password required"));
        }

        println!("\nAuthenticating...");
        match self.api.login(&username, &password).await {
            Ok(token) => {
                self.complete_login(username, &token);
                println!("Login successful!\n");
                Ok(())
            }
            Err(e) => {
                self.reject_login(&e);
                Err(anyhow::anyhow!(login_failure_notice(&e)))
            }
        }
    }

    /// Clear the token and all fetched data, then show the login form.
    pub fn logout(&mut self) {
        info!("Logging out");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
            self.status_message = Some(format!("Failed to clear session: {}", e));
        } else {
            self.status_message = None;
        }

        self.generation += 1;
        self.doctor = None;
        self.patients = LoadState::Idle;
        self.vaccines = LoadState::Idle;
        self.patient_details.clear();
        self.patient_selection = 0;
        self.vaccine_selection = 0;
        self.detail_scroll = 0;
        self.current_tab = Tab::Patients;
        self.focus = Focus::List;
        self.start_login();
    }

    fn save_config(&self) {
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Data Fetching
    // =========================================================================

    /// Run when the authenticated view becomes active: fetch patients once,
    /// along with the signed-in doctor and the vaccine catalog.
    ///
    /// Also used for manual refresh.
    pub fn activate(&mut self) {
        let Some(token) = self.session.get() else {
            debug!("Activation without token, showing login");
            self.start_login();
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        info!(generation, "Activating patient view");

        self.patients = LoadState::Loading;
        self.vaccines = LoadState::Loading;
        self.patient_details.clear();
        self.status_message = Some("Loading patients...".to_string());

        let api = self.api.clone();
        let tx = self.background_tx.clone();

        tokio::spawn(async move {
            Self::execute_refresh(api, tx, token, generation).await;
        });
    }

    async fn send_result(tx: &mpsc::Sender<TaggedResult>, generation: u64, result: BackgroundResult) {
        if let Err(e) = tx.send((generation, result)).await {
            error!(error = %e, "Failed to send background result - channel closed");
        }
    }

    async fn execute_refresh(
        api: ApiClient,
        tx: mpsc::Sender<TaggedResult>,
        token: String,
        generation: u64,
    ) {
        let token = Some(token.as_str());
        let (patients, doctor, vaccines) = tokio::join!(
            api.list_patients(token),
            api.current_doctor(token),
            api.list_vaccines(token),
        );

        Self::send_result(&tx, generation, BackgroundResult::Patients(patients)).await;
        Self::send_result(&tx, generation, BackgroundResult::Doctor(doctor)).await;
        Self::send_result(&tx, generation, BackgroundResult::Vaccines(vaccines)).await;
    }

    /// Fetch schedule and immunizations for the selected patient if they
    /// have not been requested since the last activation.
    pub fn request_selected_detail(&mut self) {
        let Some(patient_id) = self.selected_patient().map(|p| p.id) else {
            return;
        };
        if self.patient_details.contains_key(&patient_id) {
            return;
        }
        let Some(token) = self.session.get() else {
            return;
        };

        self.patient_details.insert(patient_id, LoadState::Loading);

        let api = self.api.clone();
        let tx = self.background_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let token = Some(token.as_str());
            let (schedule, immunizations) = tokio::join!(
                api.patient_schedule(token, patient_id),
                api.patient_immunizations(token, patient_id),
            );
            let detail = match (schedule, immunizations) {
                (Ok(schedule), Ok(immunizations)) => Ok(PatientDetail {
                    schedule,
                    immunizations,
                }),
                (Err(e), _) | (_, Err(e)) => Err(e),
            };
            Self::send_result(&tx, generation, BackgroundResult::PatientDetail(patient_id, detail))
                .await;
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.background_rx.try_recv() {
            results.push(result);
        }
        for (generation, result) in results {
            self.process_result(generation, result);
        }
    }

    /// Wait for the next background result and process it.
    #[cfg(test)]
    pub async fn process_next_result(&mut self) {
        if let Some((generation, result)) = self.background_rx.recv().await {
            self.process_result(generation, result);
        }
    }

    fn process_result(&mut self, generation: u64, result: BackgroundResult) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale background result");
            return;
        }

        match result {
            BackgroundResult::Patients(Ok(patients)) => {
                info!(count = patients.len(), "Patients loaded");
                self.status_message = None;
                self.patient_selection = self.patient_selection.min(patients.len().saturating_sub(1));
                self.patients = LoadState::Loaded(patients);
                self.request_selected_detail();
            }
            BackgroundResult::Patients(Err(e)) => {
                error!(error = %e, "Failed to load patients");
                self.status_message = Some("Failed to load patients".to_string());
                self.patients = LoadState::Failed(fetch_failure_notice(&e));
            }
            BackgroundResult::Doctor(Ok(doctor)) => {
                debug!(username = %doctor.username, "Current doctor loaded");
                self.doctor = Some(doctor);
            }
            BackgroundResult::Doctor(Err(e)) => {
                warn!(error = %e, "Failed to load current doctor");
                self.doctor = None;
            }
            BackgroundResult::Vaccines(Ok(vaccines)) => {
                self.vaccine_selection = self.vaccine_selection.min(vaccines.len().saturating_sub(1));
                self.vaccines = LoadState::Loaded(vaccines);
            }
            BackgroundResult::Vaccines(Err(e)) => {
                warn!(error = %e, "Failed to load vaccines");
                self.vaccines = LoadState::Failed(fetch_failure_notice(&e));
            }
            BackgroundResult::PatientDetail(patient_id, Ok(detail)) => {
                self.patient_details.insert(patient_id, LoadState::Loaded(detail));
            }
            BackgroundResult::Login(username, Ok(token)) => {
                self.login_pending = false;
                self.complete_login(username, &token);
                self.activate();
            }
            BackgroundResult::Login(_, Err(e)) => {
                self.login_pending = false;
                self.reject_login(&e);
            }
            BackgroundResult::PatientDetail(patient_id, Err(e)) => {
                warn!(patient_id, error = %e, "Failed to load patient detail");
                self.patient_details
                    .insert(patient_id, LoadState::Failed(fetch_failure_notice(&e)));
            }
        }
    }

    // =========================================================================
    // Selection & Lookups
    // =========================================================================

    pub fn patient_list(&self) -> &[Patient] {
        self.patients.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vaccine_list(&self) -> &[Vaccine] {
        self.vaccines.loaded().map(Vec::as_slice).unwrap_or(&[])
    }

    /// One display entry per patient, in server order.
    pub fn patient_entries(&self) -> Vec<String> {
        self.patient_list().iter().map(Patient::full_name).collect()
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        self.patient_list().get(self.patient_selection)
    }

    pub fn selected_detail(&self) -> Option<&LoadState<PatientDetail>> {
        self.selected_patient()
            .and_then(|p| self.patient_details.get(&p.id))
    }

    /// Move the patient selection to `index` (clamped) and load its detail.
    pub fn select_patient(&mut self, index: usize) {
        let max_index = self.patient_list().len().saturating_sub(1);
        let index = index.min(max_index);
        if index != self.patient_selection {
            self.patient_selection = index;
            self.detail_scroll = 0;
        }
        self.request_selected_detail();
    }

    /// Scroll the patient detail pane by `lines` (negative scrolls up).
    pub fn scroll_detail(&mut self, lines: i32) {
        let target = i32::from(self.detail_scroll) + lines;
        self.detail_scroll = target.clamp(0, i32::from(u16::MAX)) as u16;
    }

    pub fn select_vaccine(&mut self, index: usize) {
        let max_index = self.vaccine_list().len().saturating_sub(1);
        self.vaccine_selection = index.min(max_index);
    }

    /// Vaccine name for an immunization record, falling back to its id.
    pub fn vaccine_name(&self, vaccine_id: i64) -> String {
        self.vaccine_list()
            .iter()
            .find(|v| v.id == vaccine_id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| format!("Vaccine #{}", vaccine_id))
    }

    /// Whether `vaccine` is due for the selected patient, if their age is known.
    pub fn vaccine_due_for_selected(&self, vaccine: &Vaccine, today: NaiveDate) -> Option<bool> {
        let age = self.selected_patient()?.age_months_on(today)?;
        Some(vaccine.is_due(age))
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn signed_in_as(&self) -> Option<&str> {
        self.doctor.as_ref().map(|d| d.username.as_str())
    }
}

/// Notice shown in the login form; details go to the log only.
fn login_failure_notice(error: &AuthError) -> &'static str {
    match error {
        AuthError::InvalidCredentials => "Invalid username or password",
        AuthError::Network(e) if e.is_timeout() => "Connection timed out. Please try again.",
        AuthError::Network(_) => "Unable to connect to server. Check your connection.",
        _ => LOGIN_FAILED_MESSAGE,
    }
}

fn fetch_failure_notice(error: &FetchError) -> String {
    if error.is_auth_failure() {
        format!("{}. Press L to log out and sign in again.", error)
    } else {
        error.to_string()
    }
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use vaxsched_core::auth::{FileSessionStore, MemorySessionStore};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_app(base_url: &str, session: Box<dyn SessionStore>) -> App {
        let api = ApiClient::new(base_url).unwrap();
        App::new(Config::default(), None, session, api)
    }

    pub(crate) fn patient(id: i64, first: &str, last: &str) -> Patient {
        Patient {
            id,
            first_name: first.into(),
            last_name: last.into(),
            egn: None,
            birth_date: None,
            doctor_id: None,
        }
    }

    async fn mount_token(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_reads(server: &MockServer, token: &str) {
        let bearer = format!("Bearer {}", token);
        Mock::given(method("GET"))
            .and(path("/patients/"))
            .and(header("authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 1, "first_name": "Ana", "last_name": "Petrova" }
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/doctors/me"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 4, "username": "doc1" })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vaccines/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 2, "name": "MMR", "is_mandatory": true, "recommended_month": 13 }
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/schedule/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "given": [], "missing": ["MMR"]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/immunizations/patient/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(server)
            .await;
    }

    /// Process the three activation results (patients, doctor, vaccines).
    async fn finish_activation(app: &mut App) {
        for _ in 0..3 {
            app.process_next_result().await;
        }
    }

    #[tokio::test]
    async fn test_no_token_starts_on_login() {
        let app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
        assert_eq!(app.patients, LoadState::Idle);
    }

    #[tokio::test]
    async fn test_stored_token_starts_authenticated() {
        let app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_successful_login_stores_token_and_shows_list() {
        let server = MockServer::start().await;
        mount_token(&server, 200, serde_json::json!({ "access_token": "abc123", "token_type": "bearer" })).await;
        mount_reads(&server, "abc123").await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.login_password = "pw123".into();

        app.attempt_login();
        assert!(app.login_pending);
        assert_eq!(app.status_message.as_deref(), Some("Signing in..."));
        assert_eq!(app.state, AppState::LoggingIn);

        app.process_next_result().await;
        assert!(!app.login_pending);
        assert_eq!(app.session.get().as_deref(), Some("abc123"));
        assert_eq!(app.state, AppState::Normal);
        assert!(app.login_password.is_empty());
        assert_eq!(app.config.last_username.as_deref(), Some("doc1"));

        // Signing in activates the patient view
        assert!(app.patients.is_loading());
        finish_activation(&mut app).await;

        assert_eq!(app.patient_entries(), vec!["Ana Petrova".to_string()]);
        assert_eq!(app.signed_in_as(), Some("doc1"));
        assert_eq!(app.vaccine_list().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_store_empty() {
        let server = MockServer::start().await;
        mount_token(&server, 401, serde_json::json!({ "detail": "bad" })).await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.login_password = "wrong".into();

        app.attempt_login();
        app.process_next_result().await;
        assert!(!app.login_pending);
        assert_eq!(app.session.get(), None);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some("Invalid username or password"));
        assert_eq!(app.patients, LoadState::Idle);
    }

    #[tokio::test]
    async fn test_login_server_error_shows_generic_notice() {
        let server = MockServer::start().await;
        mount_token(&server, 500, serde_json::json!({ "detail": "db down" })).await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.login_password = "pw".into();

        app.attempt_login();
        app.process_next_result().await;
        assert_eq!(app.login_error.as_deref(), Some(LOGIN_FAILED_MESSAGE));
        assert_eq!(app.status_message, None);
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.attempt_login();
        assert!(!app.login_pending);
        assert_eq!(app.login_error.as_deref(), Some("Username and password required"));
    }

    #[tokio::test]
    async fn test_login_runs_in_background() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "abc123" }))
                    .set_delay(Duration::from_secs(1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.login_password = "pw123".into();

        let started = Instant::now();
        app.attempt_login();
        // A second submit while the first is in flight sends nothing
        app.attempt_login();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(app.login_pending);
        assert_eq!(app.session.get(), None);

        app.process_next_result().await;
        assert_eq!(app.session.get().as_deref(), Some("abc123"));
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_login_persists_to_file_store() {
        let server = MockServer::start().await;
        mount_token(&server, 200, serde_json::json!({ "access_token": "abc123" })).await;

        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&server.uri(), Box::new(FileSessionStore::open(dir.path())));
        app.login_username = "doc1".into();
        app.login_password = "pw123".into();
        app.attempt_login();
        app.process_next_result().await;

        assert_eq!(FileSessionStore::open(dir.path()).get().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patients/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::with_token("stale")));
        app.activate();
        finish_activation(&mut app).await;

        match &app.patients {
            LoadState::Failed(message) => assert!(message.contains("log out")),
            other => panic!("expected failure state, got {:?}", other),
        }
        assert!(app.patient_entries().is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Failed to load patients"));
        // The token is not dropped automatically
        assert_eq!(app.session.get().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_empty_list_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::with_token("t")));
        app.activate();
        finish_activation(&mut app).await;
        assert_eq!(app.patients, LoadState::Loaded(vec![]));
    }

    #[tokio::test]
    async fn test_activation_without_token_shows_login() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.state = AppState::Normal;
        app.activate();
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.patients, LoadState::Idle);
    }

    #[tokio::test]
    async fn test_selected_detail_loads_after_patients() {
        let server = MockServer::start().await;
        mount_reads(&server, "t").await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::with_token("t")));
        app.activate();
        finish_activation(&mut app).await;
        assert!(matches!(app.selected_detail(), Some(LoadState::Loading)));

        app.process_next_result().await;
        let detail = app.selected_detail().and_then(LoadState::loaded).unwrap();
        assert_eq!(detail.schedule.missing, vec!["MMR".to_string()]);
    }

    #[tokio::test]
    async fn test_logout_clears_store_and_data() {
        let server = MockServer::start().await;
        mount_reads(&server, "t").await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::with_token("t")));
        app.activate();
        finish_activation(&mut app).await;

        app.logout();
        assert_eq!(app.session.get(), None);
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.patients, LoadState::Idle);
        assert!(app.doctor.is_none());

        // The in-flight detail fetch belongs to the old session and is dropped
        app.process_next_result().await;
        assert!(app.patient_details.is_empty());
    }

    #[tokio::test]
    async fn test_stale_results_are_dropped() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        app.generation = 2;
        app.process_result(1, BackgroundResult::Patients(Ok(vec![patient(1, "Ana", "Petrova")])));
        assert_eq!(app.patients, LoadState::Idle);

        app.process_result(2, BackgroundResult::Patients(Ok(vec![patient(1, "Ana", "Petrova")])));
        assert_eq!(app.patient_entries(), vec!["Ana Petrova".to_string()]);
    }

    #[tokio::test]
    async fn test_detail_scroll_resets_on_selection() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.patients = LoadState::Loaded(vec![patient(1, "Ana", "Petrova"), patient(2, "Ivan", "Ivanov")]);

        app.scroll_detail(3);
        app.scroll_detail(-1);
        assert_eq!(app.detail_scroll, 2);
        app.scroll_detail(-10);
        assert_eq!(app.detail_scroll, 0);

        app.scroll_detail(4);
        app.select_patient(1);
        assert_eq!(app.detail_scroll, 0);
    }

    #[tokio::test]
    async fn test_select_patient_clamps() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.patients = LoadState::Loaded(vec![patient(1, "Ana", "Petrova"), patient(2, "Ivan", "Ivanov")]);
        app.select_patient(10);
        assert_eq!(app.patient_selection, 1);
        assert_eq!(app.selected_patient().map(|p| p.id), Some(2));
    }

    #[tokio::test]
    async fn test_vaccine_due_for_selected() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        let mut p = patient(1, "Ana", "Petrova");
        p.birth_date = NaiveDate::from_ymd_opt(2024, 1, 10);
        app.patients = LoadState::Loaded(vec![p]);

        let mmr = Vaccine {
            id: 2,
            name: "MMR".into(),
            is_mandatory: true,
            recommended_month: Some(13),
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(app.vaccine_due_for_selected(&mmr, today), Some(true));

        let early = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(app.vaccine_due_for_selected(&mmr, early), Some(false));
    }

    #[test]
    fn test_tab_next_prev() {
        assert_eq!(Tab::Patients.next(), Tab::Vaccines);
        assert_eq!(Tab::Vaccines.next(), Tab::Patients);
        assert_eq!(Tab::Patients.prev(), Tab::Vaccines);
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
