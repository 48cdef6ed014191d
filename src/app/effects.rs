use std::io::{Write, stdout};
use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::app::{App, Message, Model, ToastLevel};
use crate::gallery::PageRequest;
use crate::source::PhotoSource;
use base64::Engine;

impl App {
    /// Run the side effects of a message that `update` already applied.
    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        msg: &Message,
        pages: &Sender<Message>,
    ) {
        match msg {
            Message::OpenOriginal => Self::open_original(model),
            Message::CopyUrl => Self::copy_url(model),
            _ => {}
        }
        if let Some(request) = model.take_pending_fetch() {
            spawn_page_fetch(Arc::clone(&self.source), request, pages.clone());
        }
    }

    fn open_original(model: &mut Model) {
        let Some(url) = model.focused_photo().map(|photo| photo.full_url.clone()) else {
            model.show_toast(ToastLevel::Warning, "No photo selected");
            return;
        };
        match open_external_link(&url) {
            Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
        }
    }

    fn copy_url(model: &mut Model) {
        let Some(url) = model.focused_photo().map(|photo| photo.full_url.clone()) else {
            model.show_toast(ToastLevel::Warning, "No photo selected");
            return;
        };
        match copy_to_clipboard(&url) {
            Ok(()) => model.show_toast(ToastLevel::Info, "Copied photo URL"),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }
}

/// Fetch one page on a worker thread and post the result back as a message.
pub(super) fn spawn_page_fetch(
    source: Arc<dyn PhotoSource>,
    request: PageRequest,
    pages: Sender<Message>,
) {
    std::thread::spawn(move || {
        let _scope = crate::perf::scope("source.fetch_page");
        let result = source.fetch_page(request.page());
        if let Err(err) = &result {
            crate::perf::log_event(
                "source.fetch.error",
                format!("page={} err={err}", request.page()),
            );
        }
        // The receiver is gone only when the app is shutting down.
        let _ = pages.send(Message::PageFetched { request, result });
    });
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        use std::process::Stdio;
        std::process::Command::new("xdg-open")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?
            .wait()?;
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

#[cfg(test)]
mod tests {
    use super::osc52_sequence;

    #[test]
    fn test_osc52_sequence_encodes_url() {
        let seq = osc52_sequence("https://x.test/a.jpg");
        assert_eq!(seq, "\x1b]52;c;aHR0cHM6Ly94LnRlc3QvYS5qcGc=\x07");
    }
}
