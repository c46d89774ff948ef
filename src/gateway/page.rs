//! Embedded single-page chat UI.
//!
//! The page and logo are compiled into the binary; the logo is inlined into
//! the HTML as a base64 `data:` URI so the gateway serves exactly one route
//! of static content.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

const PAGE_TEMPLATE: &str = include_str!("../../assets/index.html");
const LOGO_SVG: &[u8] = include_bytes!("../../assets/logo.svg");

/// Render the chat page for the configured brand.
pub fn render_page(brand_name: &str) -> String {
    PAGE_TEMPLATE
        .replace("__BRAND_NAME__", brand_name)
        .replace("__LOGO_B64__", &BASE64.encode(LOGO_SVG))
}
