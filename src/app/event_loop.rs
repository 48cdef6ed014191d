use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, update};
use crate::image::ImageFetcher;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            let _picker_scope = crate::perf::scope("app.create_picker");
            crate::image::create_picker(self.force_half_cell)
        } else {
            None
        };

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - pexgal requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);
        crate::perf::log_event(
            "init.layout",
            format!("terminal={}x{}", size.width, size.height),
        );

        let mut model = Model::new((size.width, size.height)).with_picker(picker);
        model.images_enabled = self.images_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);

        let mut fetcher = self
            .images_enabled
            .then(|| ImageFetcher::new(self.http.clone()));
        let (pages_tx, pages_rx) = mpsc::channel();

        let result = execute!(stdout(), EnableMouseCapture)
            .context("Failed to enable mouse capture")
            .and_then(|()| {
                self.event_loop(
                    &mut terminal,
                    &mut model,
                    &pages_tx,
                    &pages_rx,
                    fetcher.as_mut(),
                )
            });

        // Restore terminal
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Apply a message and run its side effects.
    pub(super) fn dispatch(&self, model: &mut Model, msg: Message, pages: &Sender<Message>) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, &side_msg, pages);
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        pages_tx: &Sender<Message>,
        pages_rx: &Receiver<Message>,
        mut fetcher: Option<&mut ImageFetcher>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        // First page, before anything is on screen.
        self.dispatch(model, Message::LoadNextPage, pages_tx);

        loop {
            let now = Instant::now();
            if model.expire_toast(now) {
                needs_render = true;
            }

            let was_settling = model.is_image_scroll_settling();
            model.tick_image_scroll_cooldown();
            if was_settling && !model.is_image_scroll_settling() {
                // Repaint once after scroll placeholders expire to restore inline images.
                needs_render = true;
                crate::perf::log_event("image.scroll.settled", format!("frame={frame_idx}"));
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                self.dispatch(model, Message::Resize(width, height), pages_tx);
                needs_render = true;
            }
            model.set_resize_pending(resize_debouncer.is_pending());

            // Finished page fetches
            while let Ok(msg) = pages_rx.try_recv() {
                self.dispatch(model, msg, pages_tx);
                needs_render = true;
            }

            // Image downloads
            if let Some(fetcher) = fetcher.as_deref_mut() {
                for url in model.lightbox_wanted() {
                    fetcher.request_first(&url);
                }
                for url in model.wanted_thumbnails() {
                    fetcher.request(&url);
                }
                for image_event in fetcher.drain() {
                    if let Ok(image) = image_event.result {
                        model.image_arrived(&image_event.url, image);
                        needs_render = true;
                    }
                }
            }

            if model.slideshow_due().is_some_and(|due| due <= now) {
                self.dispatch(model, Message::SlideshowTick, pages_tx);
                needs_render = true;
            }

            // Handle events
            let busy = resize_debouncer.is_pending()
                || model.gallery.is_loading()
                || fetcher
                    .as_deref()
                    .is_some_and(|f| f.in_flight() > 0 || f.queued() > 0)
                || model.slideshow_due().is_some();
            let poll_ms = if needs_render {
                0
            } else if busy {
                30
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    self.dispatch(model, msg, pages_tx);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        drained += 1;
                        self.dispatch(model, msg, pages_tx);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;

                let prep_start = Instant::now();
                model.load_nearby_images();
                if model.lightbox.is_some() {
                    let area = crate::ui::lightbox_image_area(crate::ui::gallery_area(
                        model.viewport.width(),
                        model.viewport.height() + 1,
                    ));
                    model.prepare_lightbox(area);
                }
                crate::perf::log_event(
                    "frame.prep",
                    format!(
                        "frame={} prep_ms={:.3} viewport={:?} photos={} loading={}",
                        frame_idx,
                        prep_start.elapsed().as_secs_f64() * 1000.0,
                        model.viewport.visible_range(),
                        model.gallery.len(),
                        model.gallery.is_loading()
                    ),
                );

                let draw_start = Instant::now();
                terminal.draw(|frame| Self::view(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
