//! Central application state and event loop (Elm architecture).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::campaign::{CampaignGenerator, CampaignStudio, LiveCampaignGenerator};
use crate::core::chat::ChatDesk;
use crate::core::keygate::{KeyGate, KeySelector};

use super::events::{Action, AppEvent, Focus, Notification, NotificationLevel};
use super::theme;
use super::views::campaign::{self, CampaignCommand, CampaignInputMode, CampaignViewState};
use super::views::chat::{self, ChatCommand, ChatInputMode, ChatViewState};
use super::views::gate::{self, GateCommand, GateInputMode, GateViewState};

const NOTIFICATION_TTL_TICKS: u32 = 80;

pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Currently focused top-level view.
    pub focus: Focus,
    /// Credential gate; owns all key state.
    gate: KeyGate,
    /// Campaign orchestrator.
    studio: CampaignStudio,
    /// Chat orchestrator.
    desk: ChatDesk,
    /// Key-selection capability shared with the generators.
    selector: Option<Arc<dyn KeySelector>>,
    /// Production generator behind the campaign flow.
    generator: Arc<dyn CampaignGenerator>,
    config: AppConfig,
    gate_view: GateViewState,
    campaign_view: CampaignViewState,
    chat_view: ChatViewState,
    /// Active notifications (max 3 visible).
    notifications: Vec<Notification>,
    notification_counter: u64,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl AppState {
    pub fn new(config: AppConfig, selector: Option<Arc<dyn KeySelector>>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let generator: Arc<dyn CampaignGenerator> = Arc::new(LiveCampaignGenerator::new(
            selector.clone(),
            config.gemini.clone(),
        ));

        Self {
            running: true,
            focus: Focus::Campaign,
            gate: KeyGate::new(selector.clone(), config.gemini.trust_env_key),
            studio: CampaignStudio::new(),
            desk: ChatDesk::new(),
            selector,
            generator,
            config,
            gate_view: GateViewState::new(),
            campaign_view: CampaignViewState::new(),
            chat_view: ChatViewState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            event_rx,
            event_tx,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        // Resolve the credential state before the first frame
        self.gate.check_availability().await;

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.handle_event(AppEvent::Tick).await;
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event).await;
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event)).await;
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                self.handle_input(crossterm_event).await;
            }
            AppEvent::Campaign(campaign_event) => {
                if self.studio.handle_event(campaign_event) {
                    self.on_credential_rejected();
                }
            }
            AppEvent::Chat(chat_event) => {
                if self.desk.handle_event(chat_event) {
                    self.on_credential_rejected();
                }
            }
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Tick => self.on_tick(),
            AppEvent::Quit => self.running = false,
        }
    }

    async fn handle_input(&mut self, event: Event) {
        // The gate replaces every other view until a key is ready
        if !self.gate.is_ready() {
            if let Some(command) = self.gate_view.handle_input(&event) {
                match command {
                    GateCommand::SubmitKey(key) => {
                        self.gate.request_selection(&key).await;
                        if self.gate.is_ready() {
                            self.push_notification(
                                "API key selected".to_string(),
                                NotificationLevel::Success,
                            );
                        }
                    }
                    GateCommand::Recheck => {
                        self.gate.check_availability().await;
                    }
                    GateCommand::Quit => self.running = false,
                }
            }
            return;
        }

        let command_handled = match self.focus {
            Focus::Campaign => {
                if let Some(command) = self.campaign_view.handle_input(&event, &self.studio) {
                    self.handle_campaign_command(command);
                    true
                } else {
                    false
                }
            }
            Focus::Chat => {
                if let Some(command) = self.chat_view.handle_input(&event, &self.desk) {
                    self.handle_chat_command(command);
                    true
                } else {
                    false
                }
            }
        };

        if !command_handled && !self.view_is_inserting() {
            if let Some(action) = self.map_input_to_action(&event) {
                self.handle_action(action);
            }
        }
    }

    fn view_is_inserting(&self) -> bool {
        if !self.gate.is_ready() {
            return self.gate_view.mode == GateInputMode::Insert;
        }
        match self.focus {
            Focus::Campaign => self.campaign_view.mode == CampaignInputMode::Insert,
            Focus::Chat => self.chat_view.mode == ChatInputMode::Insert,
        }
    }

    fn map_input_to_action(&self, event: &Event) -> Option<Action> {
        let Event::Key(key) = event else { return None };
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Tab => Some(Action::TabNext),
            KeyCode::BackTab => Some(Action::TabPrev),
            KeyCode::Char('1') => Some(Action::FocusCampaign),
            KeyCode::Char('2') => Some(Action::FocusChat),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::FocusCampaign => self.focus = Focus::Campaign,
            Action::FocusChat => self.focus = Focus::Chat,
            Action::TabNext => self.focus = self.focus.next(),
            Action::TabPrev => self.focus = self.focus.prev(),
            Action::Quit => self.running = false,
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    fn campaign_emitter(&self) -> impl Fn(crate::core::campaign::CampaignEvent) + Send + 'static {
        let tx = self.event_tx.clone();
        move |event| {
            let _ = tx.send(AppEvent::Campaign(event));
        }
    }

    fn chat_emitter(&self) -> impl Fn(crate::core::chat::ChatEvent) + Send + 'static {
        let tx = self.event_tx.clone();
        move |event| {
            let _ = tx.send(AppEvent::Chat(event));
        }
    }

    fn handle_campaign_command(&mut self, command: CampaignCommand) {
        match command {
            CampaignCommand::Generate(request) => {
                let emit = self.campaign_emitter();
                self.studio.submit(request, self.generator.clone(), emit);
            }
            CampaignCommand::RegenerateImage(size) => {
                let emit = self.campaign_emitter();
                self.studio
                    .regenerate_image(size, self.generator.clone(), emit);
            }
            CampaignCommand::SaveImage => self.save_image(),
            CampaignCommand::ExportCopy => self.export_copy(),
        }
    }

    fn handle_chat_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Send(text) => {
                let emit = self.chat_emitter();
                self.desk
                    .send(&text, self.selector.clone(), &self.config.gemini, emit);
            }
            ChatCommand::NewSession => {
                self.desk.reset_session();
                self.push_notification(
                    "Started a new chat session".to_string(),
                    NotificationLevel::Info,
                );
            }
        }
    }

    fn on_credential_rejected(&mut self) {
        self.gate.report_authorization_failure();
        self.push_notification(
            "API key rejected — select a new key".to_string(),
            NotificationLevel::Error,
        );
    }

    fn save_image(&mut self) {
        let Some(image) = self.studio.image().cloned() else {
            return;
        };
        let bytes = match image.decode() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.push_notification(format!("Image payload invalid: {e}"), NotificationLevel::Error);
                return;
            }
        };

        let dir = self.config.data_dir();
        let path = dir.join("campaign-visual.png");
        let result = std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&path, &bytes));
        match result {
            Ok(()) => self.push_notification(
                format!("Saved image to {}", path.display()),
                NotificationLevel::Success,
            ),
            Err(e) => {
                self.push_notification(format!("Failed to save image: {e}"), NotificationLevel::Error)
            }
        }
    }

    fn export_copy(&mut self) {
        let Some(copy) = self.studio.copy().cloned() else {
            return;
        };

        let mut export = String::from("# Campaign Export\n\n## Subject Lines\n\n");
        for (idx, subject) in copy.subject_lines.iter().enumerate() {
            export.push_str(&format!("{}. {}\n", idx + 1, subject));
        }
        export.push_str("\n## Body\n\n");
        export.push_str(&copy.body_copy);
        export.push_str("\n\n## Image Prompt\n\n");
        export.push_str(&copy.image_prompt);
        export.push('\n');

        let dir = self.config.data_dir();
        let path = dir.join("campaign-export.md");
        let result = std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&path, export));
        match result {
            Ok(()) => self.push_notification(
                format!("Exported copy to {}", path.display()),
                NotificationLevel::Success,
            ),
            Err(e) => {
                self.push_notification(format!("Failed to export copy: {e}"), NotificationLevel::Error)
            }
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    fn push_notification(&mut self, message: String, level: NotificationLevel) {
        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });
    }

    fn on_tick(&mut self) {
        for notification in &mut self.notifications {
            notification.ttl_ticks = notification.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, chunks[0]);

        if self.gate.is_ready() {
            match self.focus {
                Focus::Campaign => {
                    campaign::render(frame, chunks[1], &self.campaign_view, &self.studio)
                }
                Focus::Chat => chat::render(frame, chunks[1], &self.chat_view, &self.desk),
            }
        } else {
            gate::render(frame, chunks[1], &self.gate, &self.gate_view);
        }

        self.render_footer(frame, chunks[2]);
        self.render_notifications(frame, area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" Campaigner ", theme::brand_badge()),
            Span::raw(" "),
        ];

        for focus in Focus::ALL {
            let style = if focus == self.focus && self.gate.is_ready() {
                theme::highlight()
            } else {
                theme::muted()
            };
            spans.push(Span::styled(format!(" {} ", focus.label()), style));
        }

        if self.studio.text_busy() || self.studio.image_busy() || self.desk.busy() {
            spans.push(Span::styled("  ● generating", theme::insert_badge()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = if !self.gate.is_ready() {
            "[i] enter key  [Enter] select  [r] re-check  [q] quit"
        } else if self.view_is_inserting() {
            "[Esc] leave insert mode"
        } else {
            "[Tab] switch view  [1] campaign  [2] assistant  [q] quit"
        };
        frame.render_widget(
            Paragraph::new(Line::styled(hints, theme::key_hint())),
            area,
        );
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        for (idx, notification) in self.notifications.iter().rev().take(3).enumerate() {
            let width = (notification.message.len() as u16 + 4).min(area.width);
            let rect = Rect {
                x: area.width.saturating_sub(width),
                y: 1 + idx as u16,
                width,
                height: 1,
            };
            let color = match notification.level {
                NotificationLevel::Info => theme::INFO,
                NotificationLevel::Success => theme::SUCCESS,
                NotificationLevel::Warning => theme::WARNING,
                NotificationLevel::Error => theme::ERROR,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::styled(
                    format!(" {} ", notification.message),
                    ratatui::style::Style::default().fg(theme::BG_BASE).bg(color),
                )),
                rect,
            );
        }
    }
}
