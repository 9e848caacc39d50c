//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_password_char, can_add_username_char, App, AppState, Focus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle a key press. Returns `true` when the application should exit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('u') => {
            if !app.patients.is_loading() {
                app.activate();
            }
            return Ok(false);
        }
        KeyCode::Char('1') => {
            app.current_tab = Tab::Patients;
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Char('2') => {
            app.current_tab = Tab::Vaccines;
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Left => {
            app.current_tab = app.current_tab.prev();
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Right => {
            app.current_tab = app.current_tab.next();
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Tab if app.current_tab == Tab::Patients => {
            // Toggle focus between list and detail panels
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
            return Ok(false);
        }
        KeyCode::Esc => {
            app.focus = Focus::List;
            return Ok(false);
        }
        _ => {}
    }

    match (app.current_tab, app.focus) {
        (Tab::Patients, Focus::List) => handle_patients_input(app, key),
        (Tab::Patients, Focus::Detail) => handle_detail_input(app, key),
        (Tab::Vaccines, _) => handle_vaccines_input(app, key),
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Freeze the form while the submitted credentials are in flight
    if app.login_pending && key.code != KeyCode::Esc {
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // The outcome arrives via check_background_tasks
                app.attempt_login();
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_patients_input(app: &mut App, key: KeyEvent) {
    let max_index = app.patient_list().len().saturating_sub(1);
    let current = app.patient_selection;

    let target = match key.code {
        KeyCode::Char('j') | KeyCode::Down => (current + 1).min(max_index),
        KeyCode::Char('k') | KeyCode::Up => current.saturating_sub(1),
        KeyCode::Home => 0,
        KeyCode::End => max_index,
        KeyCode::PageDown => (current + PAGE_SCROLL_SIZE).min(max_index),
        KeyCode::PageUp => current.saturating_sub(PAGE_SCROLL_SIZE),
        _ => return,
    };
    app.select_patient(target);
}

/// Scroll the schedule pane while it has focus
fn handle_detail_input(app: &mut App, key: KeyEvent) {
    let page = PAGE_SCROLL_SIZE as i32;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_detail(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_detail(-1),
        KeyCode::PageDown => app.scroll_detail(page),
        KeyCode::PageUp => app.scroll_detail(-page),
        KeyCode::Home => app.detail_scroll = 0,
        _ => {}
    }
}

fn handle_vaccines_input(app: &mut App, key: KeyEvent) {
    let max_index = app.vaccine_list().len().saturating_sub(1);
    let current = app.vaccine_selection;

    let target = match key.code {
        KeyCode::Char('j') | KeyCode::Down => (current + 1).min(max_index),
        KeyCode::Char('k') | KeyCode::Up => current.saturating_sub(1),
        KeyCode::Home => 0,
        KeyCode::End => max_index,
        KeyCode::PageDown => (current + PAGE_SCROLL_SIZE).min(max_index),
        KeyCode::PageUp => current.saturating_sub(PAGE_SCROLL_SIZE),
        _ => return,
    };
    app.select_vaccine(target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{patient, test_app};
    use crate::app::LoadState;
    use crossterm::event::KeyModifiers;
    use std::time::{Duration, Instant};
    use vaxsched_core::auth::MemorySessionStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_login_form_typing_and_focus() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        assert_eq!(app.login_focus, LoginFocus::Username);

        type_text(&mut app, "doc1").await;
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "pw1x").await;
        handle_input(&mut app, key(KeyCode::Backspace)).await.unwrap();

        assert_eq!(app.login_username, "doc1");
        assert_eq!(app.login_password, "pw1");
        assert_eq!(app.login_focus, LoginFocus::Password);

        handle_input(&mut app, key(KeyCode::Up)).await.unwrap();
        assert_eq!(app.login_focus, LoginFocus::Username);
        handle_input(&mut app, key(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.login_focus, LoginFocus::Button);
    }

    #[tokio::test]
    async fn test_login_keys_do_not_trigger_shortcuts() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        type_text(&mut app, "q?L").await;
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_username, "q?L");
    }

    #[tokio::test]
    async fn test_esc_on_login_quits() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_enter_submits_login_and_activates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "abc123" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        type_text(&mut app, "doc1").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "pw123").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert!(app.login_pending);

        app.process_next_result().await;
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.session.get().as_deref(), Some("abc123"));
        assert!(app.patients.is_loading());
    }

    #[tokio::test]
    async fn test_enter_returns_before_token_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "abc123" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut app = test_app(&server.uri(), Box::new(MemorySessionStore::new()));
        app.login_username = "doc1".into();
        app.login_password = "pw123".into();
        app.login_focus = LoginFocus::Button;

        let started = Instant::now();
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(app.status_message.as_deref(), Some("Signing in..."));
        assert_eq!(app.state, AppState::LoggingIn);

        // Enter and typing are ignored until the response arrives
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        handle_input(&mut app, key(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.login_password, "pw123");

        app.process_next_result().await;
        assert!(!app.login_pending);
        assert_eq!(app.session.get().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_esc_quits_while_login_pending() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.login_pending = true;
        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
    }

    #[tokio::test]
    async fn test_detail_focus_scrolls_schedule() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.state = AppState::Normal;
        app.patients = LoadState::Loaded(vec![patient(1, "Ana", "Petrova"), patient(2, "Ivan", "Ivanov")]);

        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, Focus::Detail);

        handle_input(&mut app, key(KeyCode::Char('j'))).await.unwrap();
        handle_input(&mut app, key(KeyCode::PageDown)).await.unwrap();
        assert_eq!(app.detail_scroll, 11);
        assert_eq!(app.patient_selection, 0);

        handle_input(&mut app, key(KeyCode::Home)).await.unwrap();
        assert_eq!(app.detail_scroll, 0);

        // Back on the list, j moves the selection again
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        handle_input(&mut app, key(KeyCode::Char('j'))).await.unwrap();
        assert_eq!(app.patient_selection, 1);
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);

        handle_input(&mut app, key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('q'))).await.unwrap();
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_toggle() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        handle_input(&mut app, key(KeyCode::Char('?'))).await.unwrap();
        assert_eq!(app.state, AppState::ShowingHelp);
        handle_input(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_logout_key() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        handle_input(&mut app, key(KeyCode::Char('L'))).await.unwrap();
        assert_eq!(app.session.get(), None);
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[tokio::test]
    async fn test_tab_switching() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::with_token("t")));
        handle_input(&mut app, key(KeyCode::Char('2'))).await.unwrap();
        assert_eq!(app.current_tab, Tab::Vaccines);
        handle_input(&mut app, key(KeyCode::Right)).await.unwrap();
        assert_eq!(app.current_tab, Tab::Patients);
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, Focus::Detail);
    }

    #[tokio::test]
    async fn test_patient_navigation() {
        let mut app = test_app("http://127.0.0.1:9", Box::new(MemorySessionStore::new()));
        app.state = AppState::Normal;
        app.patients = LoadState::Loaded(
            (1..=15).map(|id| patient(id, "First", &format!("Last{}", id))).collect(),
        );

        handle_input(&mut app, key(KeyCode::Char('j'))).await.unwrap();
        assert_eq!(app.patient_selection, 1);
        handle_input(&mut app, key(KeyCode::PageDown)).await.unwrap();
        assert_eq!(app.patient_selection, 11);
        handle_input(&mut app, key(KeyCode::PageDown)).await.unwrap();
        assert_eq!(app.patient_selection, 14);
        handle_input(&mut app, key(KeyCode::Home)).await.unwrap();
        assert_eq!(app.patient_selection, 0);
        handle_input(&mut app, key(KeyCode::Char('k'))).await.unwrap();
        assert_eq!(app.patient_selection, 0);
        handle_input(&mut app, key(KeyCode::End)).await.unwrap();
        assert_eq!(app.patient_selection, 14);
    }
}
