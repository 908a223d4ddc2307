use std::sync::Arc;

use deepdive_core::{
    check_connection, ApiError, Backend, Config, Connectivity, Dispatch, Response, Session,
};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::tui::AppEvent;
use crate::ui::parse_markdown_line;

/// Which button of the dive-deeper dialog is highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogChoice {
    #[default]
    Yes,
    No,
}

impl DialogChoice {
    pub fn toggle(self) -> Self {
        match self {
            DialogChoice::Yes => DialogChoice::No,
            DialogChoice::No => DialogChoice::Yes,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub session: Session,

    // Mode selector
    pub modes: Vec<String>,
    pub mode_idx: usize,

    // Input box
    pub input: String,
    pub cursor: usize,

    // Output region
    pub output_scroll: u16,
    pub output_height: u16,
    pub output_width: u16,
    pub output_area: Option<Rect>,

    pub dialog_choice: DialogChoice,
    pub animation_frame: u8,

    backend: Arc<dyn Backend>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        backend: Arc<dyn Backend>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let initial = config.initial_mode();
        let mode_idx = config
            .modes
            .iter()
            .position(|m| m == initial)
            .unwrap_or(0);

        Self {
            should_quit: false,
            session: Session::new(initial),

            modes: config.modes.clone(),
            mode_idx,

            input: String::new(),
            cursor: 0,

            output_scroll: 0,
            output_height: 0,
            output_width: 0,
            output_area: None,

            dialog_choice: DialogChoice::default(),
            animation_frame: 0,

            backend,
            events,
        }
    }

    /// Send the input box contents, if the session accepts them
    pub fn submit(&mut self) {
        if let Some(dispatch) = self.session.send_query(&self.input) {
            self.input.clear();
            self.cursor = 0;
            self.output_scroll = 0;
            self.spawn_request(dispatch);
        }
    }

    pub fn accept_dive(&mut self) {
        if let Some(dispatch) = self.session.accept_dive() {
            self.output_scroll = 0;
            self.spawn_request(dispatch);
        }
        self.dialog_choice = DialogChoice::default();
    }

    pub fn decline_dive(&mut self) {
        self.session.decline_dive();
        self.output_scroll = 0;
        self.dialog_choice = DialogChoice::default();
    }

    /// Run the request in the background; the result comes back as `AppEvent::Reply`
    fn spawn_request(&self, dispatch: Dispatch) {
        let backend = self.backend.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = backend.ask(&dispatch.query).await;
            let _ = tx.send(AppEvent::Reply(dispatch, result));
        });
    }

    pub fn apply_reply(&mut self, dispatch: Dispatch, result: Result<Response, ApiError>) {
        self.session.complete(dispatch, result);
        self.output_scroll = 0;
        self.animation_frame = 0;
    }

    pub fn set_connectivity(&mut self, state: Connectivity) {
        self.session.set_connectivity(state);
    }

    /// Probe right now instead of waiting for the next timer tick
    pub fn probe_now(&self) {
        let backend = self.backend.clone();
        let tx = self.events.clone();
        info!("manual connectivity check");
        tokio::spawn(async move {
            let report = move |state| {
                let _ = tx.send(AppEvent::Connectivity(state));
            };
            check_connection(backend.as_ref(), &report).await;
        });
    }

    pub fn current_mode(&self) -> &str {
        self.session.mode()
    }

    pub fn next_mode(&mut self) {
        if self.modes.is_empty() {
            return;
        }
        self.mode_idx = (self.mode_idx + 1) % self.modes.len();
        self.select_mode();
    }

    pub fn prev_mode(&mut self) {
        if self.modes.is_empty() {
            return;
        }
        self.mode_idx = (self.mode_idx + self.modes.len() - 1) % self.modes.len();
        self.select_mode();
    }

    fn select_mode(&mut self) {
        if let Some(mode) = self.modes.get(self.mode_idx) {
            debug!(mode = %mode, "mode selected");
            self.session.set_mode(mode);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.output_line_count().saturating_sub(self.output_height);
        self.output_scroll = self.output_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.output_scroll = self.output_scroll.saturating_sub(lines);
    }

    /// Wrapped line count of the output text at the current width
    fn output_line_count(&self) -> u16 {
        // Use actual output width for wrap calculation, default to 50 if not set
        let wrap_width = if self.output_width > 0 {
            self.output_width
        } else {
            50
        };

        let lines: Vec<Line> = self
            .session
            .output()
            .text
            .lines()
            .map(|line| parse_markdown_line(line, Style::default()))
            .collect();
        let count = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .line_count(wrap_width);
        u16::try_from(count).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepdive_core::{MockBackend, OutputKind, Query};
    use tokio::sync::mpsc;

    fn server_down() -> ApiError {
        let err = Response::from_slice(b"<html>502 Bad Gateway</html>").unwrap_err();
        ApiError::Decode(err)
    }

    fn app_with(backend: MockBackend) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(&Config::new(), Arc::new(backend), tx);
        (app, rx)
    }

    async fn next_reply(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        match rx.recv().await {
            Some(AppEvent::Reply(dispatch, result)) => app.apply_reply(dispatch, result),
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let mut backend = MockBackend::new();
        backend
            .expect_ask()
            .withf(|q: &Query| q.text == "Capital of France?" && q.mode == "auto")
            .times(1)
            .returning(|_| Ok(Response::ok("Paris")));
        let (mut app, mut rx) = app_with(backend);

        app.input = "Capital of France?".to_string();
        app.cursor = app.input.chars().count();
        app.submit();

        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.session.is_busy());
        assert_eq!(app.session.output().kind, OutputKind::Thinking);

        next_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.output().text, "Paris");
        assert!(!app.session.is_busy());
    }

    #[tokio::test]
    async fn test_submit_while_busy_keeps_input() {
        let mut backend = MockBackend::new();
        backend.expect_ask().times(1).returning(|_| Ok(Response::ok("one")));
        let (mut app, mut rx) = app_with(backend);

        app.input = "first".to_string();
        app.submit();
        app.input = "second".to_string();
        app.submit();
        assert_eq!(app.input, "second");

        next_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.output().text, "one");
    }

    #[tokio::test]
    async fn test_failure_answers_offline() {
        let mut backend = MockBackend::new();
        backend.expect_ask().returning(|_| Err(server_down()));
        let (mut app, mut rx) = app_with(backend);
        app.set_connectivity(Connectivity::Online);

        app.input = "2 + 2".to_string();
        app.submit();
        next_reply(&mut app, &mut rx).await;

        assert_eq!(app.session.output().text, "2 + 2 = 4 (offline)");
        assert_eq!(app.session.connectivity(), Connectivity::Offline);
        assert!(!app.session.is_busy());
    }

    #[tokio::test]
    async fn test_dive_accept_sends_confirmed_query() {
        let mut backend = MockBackend::new();
        backend.expect_ask().returning(|q: &Query| {
            if q.dive_confirmed {
                Ok(Response::ok("The long answer."))
            } else {
                Ok(Response::needs_deeper("Dig into history?"))
            }
        });
        let (mut app, mut rx) = app_with(backend);

        app.input = "Why did Rome fall?".to_string();
        app.submit();
        next_reply(&mut app, &mut rx).await;
        assert!(app.session.dialog().is_shown());
        assert_eq!(app.session.pending_dive(), Some("Why did Rome fall?"));

        app.accept_dive();
        assert!(!app.session.dialog().is_shown());
        next_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.output().text, "The long answer.");
        assert!(!app.session.is_busy());
    }

    #[test]
    fn test_scroll_reaches_last_wrapped_line() {
        let (mut app, _rx) = app_with(MockBackend::new());
        app.output_width = 10;
        app.output_height = 1;

        // 27 characters, but word wrapping at 10 columns needs four rows
        let dispatch = app.session.send_query("letters").unwrap();
        app.apply_reply(dispatch, Ok(Response::ok("aaaaaa bbbbbb cccccc dddddd")));

        app.scroll_down(10);
        assert_eq!(app.output_scroll, 3);
        app.scroll_up(1);
        assert_eq!(app.output_scroll, 2);
    }

    #[test]
    fn test_mode_cycling_updates_session() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(&Config::new(), Arc::new(MockBackend::new()), tx);

        assert_eq!(app.current_mode(), "auto");
        app.next_mode();
        assert_eq!(app.current_mode(), "fast");
        app.prev_mode();
        app.prev_mode();
        assert_eq!(app.current_mode(), "deep");
    }

    #[tokio::test]
    async fn test_probe_now_reports_both_states() {
        let mut backend = MockBackend::new();
        backend.expect_probe().returning(|| Ok(()));
        let (app, mut rx) = app_with(backend);

        app.probe_now();
        let mut seen = Vec::new();
        for _ in 0..2 {
            if let Some(AppEvent::Connectivity(state)) = rx.recv().await {
                seen.push(state);
            }
        }
        assert_eq!(seen, vec![Connectivity::Checking, Connectivity::Online]);
    }
}
