use std::io;
use std::sync::Arc;
use std::time::Duration;

use campaigner::config::AppConfig;
use campaigner::core::keygate::KeySelector;
use campaigner::tui::app::AppState;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // File-only logging; the TUI owns the terminal
    let _log_guard = campaigner::core::logging::init_tui();
    log::info!("Campaigner v{} starting", campaigner::VERSION);

    let config = AppConfig::load();
    let selector = build_selector();
    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms);
    let mouse = config.tui.mouse_enabled;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if mouse {
        execute!(io::stdout(), EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let mut app = AppState::new(config, selector);
    let result = app.run(&mut terminal, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    log::info!("Campaigner shut down cleanly");
    Ok(())
}

#[cfg(feature = "keyring")]
fn build_selector() -> Option<Arc<dyn KeySelector>> {
    Some(Arc::new(
        campaigner::core::keygate::KeychainSelector::new(),
    ))
}

#[cfg(not(feature = "keyring"))]
fn build_selector() -> Option<Arc<dyn KeySelector>> {
    // Without a keychain there is no selection capability; the gate falls
    // back to the environment-injected key policy.
    None
}
