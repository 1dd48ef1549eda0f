use {
    crate::state::FeedController,
    crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{io::Stdout, time::Duration},
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
};

/// How long the input thread blocks in `poll` before re-checking for shutdown
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// What the event loop should do after a key press
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Continue,
    Quit,
}

/// Run the TUI event loop
///
/// Redraws only when the controller reports a settled change or a key is
/// handled. Returns when the user quits.
pub async fn run_ui(controller: FeedController) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    crossterm::terminal::enable_raw_mode()?;

    // Alternate screen isolates the table from stderr logs
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &controller).await;

    // Restore terminal state even if the loop failed
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &FeedController,
) -> Result<(), Box<dyn std::error::Error>> {
    let (key_tx, mut key_rx) = mpsc::channel::<KeyEvent>(64);
    let input_stop = CancellationToken::new();
    let input_task = tokio::task::spawn_blocking({
        let input_stop = input_stop.clone();
        move || read_keys(key_tx, input_stop)
    });

    let mut changes = controller.subscribe();

    loop {
        draw(terminal, controller).await?;

        tokio::select! {
            key = key_rx.recv() => match key {
                Some(key) => {
                    if handle_key(controller, key).await == KeyAction::Quit {
                        break;
                    }
                }
                None => break, // input thread exited
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    input_stop.cancel();
    match input_task.await {
        Ok(Err(e)) => log::error!("Input reader error: {}", e),
        Err(e) => log::error!("Input reader task failed: {}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}

async fn draw(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &FeedController,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = controller.read().await;
    let area = terminal.size()?;
    terminal.draw(|f| crate::ui::layout::render_layout(f, area, &state))?;
    Ok(())
}

/// Blocking keyboard reader, forwards key presses until stopped
fn read_keys(tx: mpsc::Sender<KeyEvent>, stop: CancellationToken) -> std::io::Result<()> {
    while !stop.is_cancelled() {
        if !crossterm::event::poll(INPUT_POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = crossterm::event::read()? {
            if tx.blocking_send(key).is_err() {
                break;
            }
        }
    }
    Ok(())
}

async fn handle_key(controller: &FeedController, key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Esc => {
            // Esc clears an active filter first, quits on the second press
            if controller.read().await.predicate().is_empty() {
                KeyAction::Quit
            } else {
                controller.set_predicate("").await;
                KeyAction::Continue
            }
        }
        KeyCode::Backspace => {
            controller.pop_predicate_char().await;
            KeyAction::Continue
        }
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            controller.push_predicate_char(c).await;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}
