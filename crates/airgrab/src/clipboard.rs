//! Clipboard polling: emits the clipboard text each time it changes.

use std::time::Duration;

/// Suppresses repeats of the last observed snippet.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<String>,
}

impl ChangeDetector {
    pub fn observe(&mut self, text: String) -> Option<String> {
        if self.last.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last = Some(text.clone());
        Some(text)
    }
}

/// Start a polling thread and return the stream of changed contents.
/// Whatever is on the clipboard at startup is not reported.
#[cfg(feature = "clipboard")]
pub fn watch(interval: Duration) -> anyhow::Result<impl futures::Stream<Item = String>> {
    use futures::channel::mpsc;
    use futures::SinkExt;

    let (mut tx, rx) = mpsc::channel(0);
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();

    std::thread::Builder::new()
        .name("clipboard-watcher".to_string())
        .spawn(move || {
            let mut clipboard = match arboard::Clipboard::new() {
                Ok(clipboard) => {
                    let _ = ready_tx.send(Ok(()));
                    clipboard
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            let mut detector = ChangeDetector::default();
            if let Ok(text) = clipboard.get_text() {
                detector.observe(text);
            }

            loop {
                std::thread::sleep(interval);
                let text = match clipboard.get_text() {
                    Ok(text) => text,
                    Err(arboard::Error::ContentNotAvailable) => continue,
                    Err(e) => {
                        log::error!("Clipboard read failed, stopping watcher: {}", e);
                        break;
                    }
                };
                if let Some(text) = detector.observe(text) {
                    // Blocks until the pipeline is ready for the next snippet.
                    if futures::executor::block_on(tx.send(text)).is_err() {
                        break;
                    }
                }
            }
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(rx),
        Ok(Err(e)) => anyhow::bail!("Unable to access the clipboard: {}", e),
        Err(_) => anyhow::bail!("Clipboard watcher exited during startup"),
    }
}

#[cfg(not(feature = "clipboard"))]
pub fn watch(_interval: Duration) -> anyhow::Result<futures::stream::Empty<String>> {
    anyhow::bail!("airgrab was built without clipboard support, use `watch --stdin`")
}
