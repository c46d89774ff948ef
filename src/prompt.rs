//! Brand-voice prompt construction.
//!
//! The transcript stores and displays the user's raw input; only the copy
//! sent to the model is wrapped in this template.

use crate::config::BrandConfig;
use tera::{Context, Tera};

const REPLY_PROMPT_TEMPLATE: &str = "\
You're replying as {{ brand_name }}, {{ brand_description }}.
Respond politely, professionally, helpfully, and in a tone aligned with startup founders or VCs, always tag {{ brand_handle }}.
Please format the response in 3 short lines, with spacing between them.
Kindly avoid using hashtags.

Here is the post content or link you need to reply to:
\"\"\"{{ post }}\"\"\"
";

const REPLY_PROMPT_NAME: &str = "reply_prompt";

/// Tera-backed template engine for building the reply prompt.
pub struct TeraEngine {
    tera: Tera,
}

impl TeraEngine {
    pub fn new() -> anyhow::Result<Self> {
        let tera = Tera::default();
        Ok(Self { tera })
    }

    pub fn add_template(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    pub fn render(&self, template_name: &str, context: &Context) -> anyhow::Result<String> {
        let rendered = self.tera.render(template_name, context)?;
        Ok(rendered)
    }
}

/// Ensure the default template is registered in the engine.
///
/// `add_template` overwrites silently, so we always register.
fn ensure_defaults(engine: &mut TeraEngine) -> anyhow::Result<()> {
    engine.add_template(REPLY_PROMPT_NAME, REPLY_PROMPT_TEMPLATE)?;
    Ok(())
}

/// Wrap a user-submitted post (or URL) in the brand-voice instruction block.
pub fn build_reply_prompt(
    engine: &mut TeraEngine,
    brand: &BrandConfig,
    post: &str,
) -> anyhow::Result<String> {
    ensure_defaults(engine)?;

    let mut ctx = Context::new();
    ctx.insert("brand_name", &brand.name);
    ctx.insert("brand_description", &brand.description);
    ctx.insert("brand_handle", &brand.handle);
    ctx.insert("post", post);

    engine.render(REPLY_PROMPT_NAME, &ctx)
}
