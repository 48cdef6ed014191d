use std::io::Cursor;
use std::thread;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pexgal::image::{ImageFetcher, download_image};
use pexgal::source::FetchError;
use reqwest::blocking::Client;
use tiny_http::{Response, Server};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 128, 255])));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Serve `/ok.png` as a 12x8 PNG, `/junk.png` as text and 404 otherwise.
fn serve_images(requests: usize) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let png = png_bytes(12, 8);
    thread::spawn(move || {
        for _ in 0..requests {
            let Ok(request) = server.recv() else {
                return;
            };
            let response = match request.url() {
                "/ok.png" => Response::from_data(png.clone()),
                "/junk.png" => Response::from_data(b"not an image".to_vec()),
                _ => Response::from_data(Vec::new()).with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });
    format!("http://{addr}")
}

#[test]
fn test_download_decodes_png() {
    let base = serve_images(1);
    let image = download_image(&Client::new(), &format!("{base}/ok.png")).unwrap();
    assert_eq!((image.width(), image.height()), (12, 8));
}

#[test]
fn test_download_reports_status_and_bad_bytes() {
    let base = serve_images(2);
    let client = Client::new();

    let missing = download_image(&client, &format!("{base}/gone.png")).unwrap_err();
    assert_eq!(
        missing,
        FetchError::Status {
            status: 404,
            text: "Not Found".to_string()
        }
    );
    assert!(matches!(
        download_image(&client, &format!("{base}/junk.png")),
        Err(FetchError::Malformed(_))
    ));
}

#[test]
fn test_fetcher_delivers_and_remembers_failures() {
    let base = serve_images(2);
    let ok = format!("{base}/ok.png");
    let gone = format!("{base}/gone.png");
    let mut fetcher = ImageFetcher::with_limit(Client::new(), 1);

    fetcher.request(&ok);
    fetcher.request(&gone);
    fetcher.request(&ok);
    assert_eq!(fetcher.in_flight(), 1);
    assert_eq!(fetcher.queued(), 1);
    assert!(fetcher.is_pending(&gone));

    let mut events = Vec::new();
    while events.len() < 2 {
        let event = fetcher
            .recv_timeout(Duration::from_secs(10))
            .expect("download finished");
        events.push(event);
    }
    assert_eq!(events[0].url, ok);
    assert!(events[0].result.is_ok());
    assert_eq!(events[1].url, gone);
    assert!(events[1].result.is_err());

    assert!(fetcher.has_failed(&gone));
    assert!(!fetcher.has_failed(&ok));
    fetcher.request(&gone);
    assert!(!fetcher.is_pending(&gone));
    assert_eq!(fetcher.in_flight(), 0);
}
