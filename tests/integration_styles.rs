use foreign_html::assemble::decode_data_uri;
use foreign_html::styles::{document_styles, load_styles, StyleRef};
use foreign_html::{ForeignHtmlRenderer, HttpFetcher, RenderConfig};
use std::time::Instant;
use tiny_http::{Header, Response, Server};

#[tokio::test]
async fn test_page_stylesheets_feed_the_renderer() {
    // Server that serves linked CSS files and the images they reference
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();

    let style_count = 8;
    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            std::thread::spawn(move || {
                let path = req.url().to_string();
                if path.starts_with("/s") && path.ends_with(".css") {
                    // emulate some latency
                    std::thread::sleep(std::time::Duration::from_millis(30));
                    let n = &path[2..path.len() - 4];
                    let css = format!(".c{n}{{background:url(/bg{n}.gif)}}");
                    let _ = req.respond(Response::from_string(css));
                } else if path.starts_with("/bg") {
                    let resp = Response::from_data(b"GIF89a".to_vec())
                        .with_header("Content-Type: image/gif".parse::<Header>().unwrap());
                    let _ = req.respond(resp);
                } else {
                    let _ = req.respond(Response::from_string("").with_status_code(404));
                }
            });
        }
    });

    let mut links = String::new();
    for i in 0..style_count {
        links.push_str(&format!("<link rel=\"stylesheet\" href=\"/s{}.css\">", i));
    }
    let page = format!(
        "<html><head><style>body{{margin:0}}</style>{}</head><body></body></html>",
        links
    );

    let config = RenderConfig {
        base_url: Some(format!("http://{}/", addr)),
        timeout_ms: 5000,
        ..Default::default()
    };

    let refs = document_styles(&page).expect("scan page");
    assert_eq!(refs.len(), style_count + 1);
    assert_eq!(refs[0], StyleRef::Inline("body{margin:0}".into()));

    let fetcher = HttpFetcher::new(&config).expect("fetcher");
    let t0 = Instant::now();
    let styles = load_styles(&refs, &fetcher, 4).await.expect("load styles");
    let elapsed = t0.elapsed().as_millis();
    assert_eq!(styles[1], ".c0{background:url(/bg0.gif)}");
    assert_eq!(styles[8], ".c7{background:url(/bg7.gif)}");
    if std::env::var("CI").is_err() {
        assert!(elapsed < 200, "expected stylesheet load < 200ms, got {}ms", elapsed);
    }

    let renderer = ForeignHtmlRenderer::new(styles, config).expect("renderer");
    let uri = renderer.build_svg_data_uri("<div class=c3></div>", None).await.expect("build svg");
    let (_, svg) = decode_data_uri(&uri).expect("decode");
    let svg = String::from_utf8(svg).expect("utf8");
    assert_eq!(svg.matches("url(data:image/gif;base64,R0lGODlh)").count(), style_count);
}
