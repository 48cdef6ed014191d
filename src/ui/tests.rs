use super::*;
use crate::app::{Message, Model, ToastLevel, update};
use crate::source::Photo;
use image::{DynamicImage, Rgb, RgbImage};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::style::{Color, Modifier};
use ratatui_image::picker::Picker;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 24);
    Terminal::new(backend).unwrap()
}

fn should_run_image_tests() -> bool {
    std::env::var("PEXGAL_RUN_IMAGE_TESTS")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "1")
}

fn square_photo(i: usize) -> Photo {
    Photo::new(
        format!("https://img.test/{i}/medium"),
        format!("https://img.test/{i}/full"),
    )
    .with_dimensions(100, 100)
}

fn model_with(photos: Vec<Photo>) -> Model {
    let mut model = update(Model::new((80, 24)), Message::LoadNextPage);
    let request = model.take_pending_fetch().unwrap();
    let mut model = update(
        model,
        Message::PageFetched {
            request,
            result: Ok(photos),
        },
    );
    // Leave any follow-up page claim unanswered; it only affects the status bar.
    let _ = model.take_pending_fetch();
    model
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|c| c.symbol()).collect()
}

fn row_text(terminal: &Terminal<TestBackend>, row: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|col| buffer[(col, row)].symbol())
        .collect()
}

#[test]
fn test_empty_gallery_shows_loading_message() {
    let mut model = update(Model::new((80, 24)), Message::LoadNextPage);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = screen_text(&terminal);
    assert!(content.contains("Loading photos\u{2026}"));
    let status = row_text(&terminal, 23);
    assert!(status.contains("0 photos"), "status: {status}");
    assert!(status.contains("Loading\u{2026}"), "status: {status}");
    assert!(status.contains("?:help"));
}

#[test]
fn test_status_bar_reports_count_and_page() {
    let photos: Vec<Photo> = (0..7).map(square_photo).collect();
    let mut model = model_with(photos);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let status = row_text(&terminal, 23);
    assert!(status.contains("7 photos"), "status: {status}");
    assert!(status.contains("next page 2"), "status: {status}");
    assert!(status.contains("[0%]"), "status: {status}");
    assert!(!status.contains("Loading"), "status: {status}");
}

#[test]
fn test_tiles_show_captions_under_placeholders() {
    let mut first = square_photo(0);
    first.photographer = Some("Ansel Adams".to_string());
    let mut second = square_photo(1);
    second.alt = Some("Foggy pier".to_string());
    let mut model = model_with(vec![first, second, square_photo(2)]);

    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    // Both first-row tiles are 20 image rows with the caption on row 20.
    let captions = row_text(&terminal, 20);
    assert!(captions.starts_with("Ansel Adams"), "captions: {captions}");
    assert!(captions[40..].starts_with("Foggy pier"), "captions: {captions}");
    assert!(!screen_text(&terminal).contains("Photo 3"));

    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(5, 5)].bg, Color::Indexed(236), "placeholder box");
    assert_eq!(buffer[(39, 5)].bg, Color::Reset, "gutter column");
}

#[test]
fn test_selected_caption_is_reversed() {
    let photos: Vec<Photo> = (0..4).map(square_photo).collect();
    let mut model = update(model_with(photos), Message::SelectAt(1));
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    assert!(buffer[(40, 20)].modifier.contains(Modifier::REVERSED));
    assert!(!buffer[(0, 20)].modifier.contains(Modifier::REVERSED));
    assert_eq!(row_text(&terminal, 20)[40..].trim_end(), "Photo 2");
}

#[test]
fn test_scrolled_gallery_clips_tiles() {
    let photos: Vec<Photo> = (0..7).map(square_photo).collect();
    let mut model = update(model_with(photos), Message::ScrollDown(10));
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    // First-row captions (content row 20) now sit on screen row 10.
    let row = row_text(&terminal, 10);
    assert!(row.starts_with("Photo 1"), "row: {row}");
    assert!(row[40..].starts_with("Photo 2"), "row: {row}");
}

#[test]
fn test_lightbox_shows_counter_and_toolbar() {
    let mut first = square_photo(0);
    first.photographer = Some("Ansel Adams".to_string());
    first.alt = Some("Half Dome".to_string());
    let photos = vec![first, square_photo(1), square_photo(2)];
    let mut model = update(model_with(photos), Message::OpenLightbox(0));
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    assert!(row_text(&terminal, 0).starts_with(" 1 / 3"));
    let content = screen_text(&terminal);
    assert!(content.contains("Loading photo\u{2026}"));
    assert!(content.contains("Photo by Ansel Adams"));
    assert!(content.contains("Half Dome"));
    assert!(row_text(&terminal, 22).contains("Esc close"));
    assert!(row_text(&terminal, 23).contains("[1/3]"));
}

#[test]
fn test_lightbox_counter_follows_navigation() {
    let photos: Vec<Photo> = (0..3).map(square_photo).collect();
    let model = update(model_with(photos), Message::OpenLightbox(0));
    let model = update(model, Message::LightboxNext);
    let mut model = update(model, Message::ToggleSlideshow);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let infobar = row_text(&terminal, 0);
    assert!(infobar.starts_with(" 2 / 3"), "infobar: {infobar}");
    assert!(infobar.contains("slideshow"), "infobar: {infobar}");
}

#[test]
fn test_help_overlay_lists_keys() {
    let mut model = update(Model::new((80, 24)), Message::ToggleHelp);
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let content = screen_text(&terminal);
    assert!(content.contains("Help"));
    assert!(content.contains("Open lightbox"));
    assert!(content.contains("Load more photos"));
}

#[test]
fn test_toast_renders_above_status_bar() {
    let mut model = Model::new((80, 24));
    model.show_toast(ToastLevel::Warning, "No photo selected");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    assert!(row_text(&terminal, 22).starts_with("[warn] No photo selected"));
    assert_eq!(terminal.backend().buffer()[(0, 22)].bg, Color::Yellow);
}

#[test]
fn test_gallery_area_excludes_status_row() {
    assert_eq!(gallery_area(80, 24), ratatui::layout::Rect::new(0, 0, 80, 23));
    assert_eq!(gallery_area(80, 0).height, 0);
}

#[test]
fn test_load_nearby_images_builds_thumbnails() {
    let mut model =
        model_with((0..3).map(square_photo).collect()).with_picker(Some(Picker::halfblocks()));
    let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
    model.image_arrived("https://img.test/0/medium", red);

    model.load_nearby_images();
    assert_eq!(model.thumbnails.len(), 1);
    let thumb = &model.thumbnails["https://img.test/0/medium"];
    let tile = model.layout.tile(0).unwrap();
    assert!(thumb.width <= tile.width);
    assert!(usize::from(thumb.height) <= tile.image_rows());
}

#[test]
fn test_thumbnails_far_from_viewport_are_dropped() {
    let photos: Vec<Photo> = (0..70).map(square_photo).collect();
    let mut model = model_with(photos).with_picker(Some(Picker::halfblocks()));
    for i in 0..70 {
        let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])));
        model.image_arrived(&format!("https://img.test/{i}/medium"), red);
    }

    model.load_nearby_images();
    let first_screen = model.thumbnails.len();
    assert!(first_screen > 0);
    assert!(model.thumbnails.contains_key("https://img.test/0/medium"));

    for _ in 0..30 {
        model = update(model, Message::PageDown);
        model.load_nearby_images();
        // Three screens of 23 rows hold at most four 22-row tile rows.
        assert!(model.thumbnails.len() <= 10, "kept {}", model.thumbnails.len());
    }
    assert!(model.viewport.offset() > 200);
    assert!(!model.thumbnails.contains_key("https://img.test/0/medium"));
}

#[test]
fn test_images_disabled_builds_no_thumbnails() {
    let mut model =
        model_with((0..3).map(square_photo).collect()).with_picker(Some(Picker::halfblocks()));
    model.images_enabled = false;
    let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
    model.image_arrived("https://img.test/0/medium", red);
    model.load_nearby_images();
    assert!(model.thumbnails.is_empty());
}

#[test]
fn test_render_thumbnail_draws_image_cells() {
    if !should_run_image_tests() {
        return;
    }
    let mut model =
        model_with((0..3).map(square_photo).collect()).with_picker(Some(Picker::halfblocks()));
    let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 0])));
    model.image_arrived("https://img.test/0/medium", red);
    model.load_nearby_images();

    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let has_red_cells = buffer.content().iter().any(|c| {
        matches!(c.fg, Color::Rgb(255, 0, 0) | Color::Indexed(196))
            || matches!(c.bg, Color::Rgb(255, 0, 0) | Color::Indexed(196))
    });
    assert!(has_red_cells, "thumbnail should be drawn in red");
}
