//! Last-resort screen for panics during rendering

use std::panic;

pub const FALLBACK_HTML: &str = concat!(
    r#"<div class="error-fallback" data-testid="error-fallback">"#,
    "<h1>Something went wrong</h1>",
    "<p>The wizard hit an unexpected error. Your progress in this session is lost.</p>",
    r#"<button onclick="window.location.reload()">Reload page</button>"#,
    "</div>",
);

/// Chain the console hook (when enabled) with the fallback renderer
pub fn install() {
    panic::set_hook(Box::new(|info| {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::hook(info);
        #[cfg(not(feature = "console_error_panic_hook"))]
        gloo::console::error!(info.to_string());

        render();
    }));
}

fn render() {
    if let Some(body) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.body())
    {
        body.set_inner_html(FALLBACK_HTML);
    }
}
