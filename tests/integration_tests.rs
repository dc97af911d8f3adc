//! Integration tests for the render pipeline against a local HTTP server

use foreign_html::assemble::decode_data_uri;
use foreign_html::{Dimensions, Error, ForeignHtmlRenderer, RenderConfig};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Start a test HTTP server on an ephemeral port and return its base URL
fn start_test_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            std::thread::spawn(move || {
                let path = request.url().to_string();
                let response = match path.as_str() {
                    "/img/a.png" => Response::from_data(PNG_MAGIC.to_vec())
                        .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                    "/fonts/f.woff2" => Response::from_data(b"wOF2".to_vec())
                        .with_header("Content-Type: font/woff2; charset=binary".parse::<Header>().unwrap()),
                    "/pic.jpg" => Response::from_data(vec![0xff, 0xd8, 0xff])
                        .with_header("Content-Type: image/jpeg".parse::<Header>().unwrap()),
                    "/slow.png" => {
                        std::thread::sleep(Duration::from_millis(1500));
                        Response::from_data(PNG_MAGIC.to_vec())
                    }
                    p if p.starts_with("/delay/") => {
                        std::thread::sleep(Duration::from_millis(100));
                        Response::from_data(p.as_bytes().to_vec())
                            .with_header("Content-Type: image/png".parse::<Header>().unwrap())
                    }
                    _ => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
                };
                let _ = request.respond(response);
            });
        }
    });

    format!("http://{}/", addr)
}

fn config_for(base: &str) -> RenderConfig {
    RenderConfig {
        base_url: Some(base.to_string()),
        timeout_ms: 5000,
        ..Default::default()
    }
}

fn svg_text(uri: &str) -> String {
    let (_, bytes) = decode_data_uri(uri).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn test_resources_are_inlined_with_their_mime_types() {
    let base = start_test_server();
    let styles = vec![
        ".a{background:url(img/a.png)}".to_string(),
        "@font-face{font-family:f;src:url(\"/fonts/f.woff2\")}".to_string(),
    ];
    let renderer = ForeignHtmlRenderer::new(styles, config_for(&base)).expect("renderer");

    let uri = renderer
        .build_svg_data_uri("<div class=a><img src=\"pic.jpg\"></div>", Some(Dimensions::new(200, 100)))
        .await
        .expect("build svg");
    let svg = svg_text(&uri);

    assert!(svg.contains("url(data:image/png;base64,iVBORw0KGgo=)"));
    assert!(svg.contains("url(\"data:font/woff2;base64,d09GMg==\")"));
    assert!(svg.contains("src=\"data:image/jpeg;base64,/9j/\""));
    assert!(!svg.contains("img/a.png"));
    assert!(!svg.contains("pic.jpg"));
}

#[tokio::test]
async fn test_absolute_references_need_no_base() {
    let base = start_test_server();
    let renderer = ForeignHtmlRenderer::new(Vec::new(), RenderConfig::default()).expect("renderer");
    let html = format!("<img src='{}img/a.png'>", base);
    let svg = svg_text(&renderer.build_svg_data_uri(&html, None).await.expect("build svg"));
    assert!(svg.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn test_not_found_fails_render_to_base64_png() {
    let base = start_test_server();
    let renderer = ForeignHtmlRenderer::new(Vec::new(), config_for(&base)).expect("renderer");

    let err = renderer
        .render_to_base64_png("<img src=missing.png>", None)
        .await
        .unwrap_err();
    match err {
        Error::FetchStatus { url, status } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/missing.png"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failing_style_resource_stops_before_content_phase() {
    let base = start_test_server();
    let styles = vec!["a{background:url(gone.png)}".to_string()];
    let renderer = ForeignHtmlRenderer::new(styles, config_for(&base)).expect("renderer");
    let err = renderer.build_svg_data_uri("<img src=pic.jpg>", None).await.unwrap_err();
    assert!(matches!(err, Error::FetchStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_slow_resource_times_out_instead_of_hanging() {
    let base = start_test_server();
    let config = RenderConfig {
        timeout_ms: 200,
        ..config_for(&base)
    };
    let renderer = ForeignHtmlRenderer::new(Vec::new(), config).expect("renderer");
    let err = renderer.render_to_png("<img src=slow.png>", None).await.unwrap_err();
    assert!(matches!(err, Error::NetworkError(_)), "got {err:?}");
}

#[tokio::test]
async fn test_render_to_png_produces_png_of_requested_size() {
    let base = start_test_server();
    let renderer = ForeignHtmlRenderer::new(vec!["p{color:red}".into()], config_for(&base)).expect("renderer");

    let png = renderer
        .render_to_png("<p>Hello <img src=img/a.png></p>", Some(Dimensions::new(64, 48)))
        .await
        .expect("render png");
    assert_eq!(&png[..8], PNG_MAGIC);

    let canvas = renderer
        .render_to_canvas("<p>Hello</p>", Some(Dimensions::new(64, 48)))
        .await
        .expect("render canvas");
    assert_eq!((canvas.width(), canvas.height()), (64, 48));
}

#[tokio::test]
async fn test_fan_out_is_concurrent() {
    // Timing is unreliable on shared CI runners
    if std::env::var("CI").is_ok() {
        return;
    }

    let base = start_test_server();
    let html: String = (0..8).map(|i| format!("<img src=delay/{}.png>", i)).collect();
    let renderer = ForeignHtmlRenderer::new(Vec::new(), config_for(&base)).expect("renderer");

    let t0 = std::time::Instant::now();
    let svg = svg_text(&renderer.build_svg_data_uri(&html, None).await.expect("build svg"));
    let elapsed = t0.elapsed().as_millis();

    assert_eq!(svg.matches("data:image/png;base64,").count(), 8);
    assert!(elapsed < 600, "expected concurrent fetches < 600ms, got {}ms", elapsed);
}

#[tokio::test]
async fn test_bounded_concurrency_keeps_pairing() {
    let base = start_test_server();
    let config = RenderConfig {
        fetch_concurrency: 2,
        ..config_for(&base)
    };
    let renderer = ForeignHtmlRenderer::new(Vec::new(), config).expect("renderer");
    let html = "<img src=delay/x.png><img src=delay/y.png><img src=delay/z.png>";
    let svg = svg_text(&renderer.build_svg_data_uri(html, None).await.expect("build svg"));

    use base64::Engine as _;
    for name in ["x", "y", "z"] {
        let payload = base64::engine::general_purpose::STANDARD.encode(format!("/delay/{}.png", name));
        assert!(svg.contains(&payload), "missing payload for {}", name);
    }
}
