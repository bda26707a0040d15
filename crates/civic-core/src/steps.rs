//! The default CivicTheme migration sequence.

use std::path::Path;

use claude_client::{ClaudeClient, RateLimitedClient, RateLimiter};

use crate::paths;
use crate::pipeline::{InProcessStep, Step, StepContext, StepTarget};
use crate::schema;

pub const UPDATE_STORYBOOK_SCRIPT: &str = "update-storybook.sh";
pub const CONVERT_COMPONENTS_SCRIPT: &str = "convert-components.mjs";

/// Overrides the Messages API host for the schema step (proxies, tests).
pub const ENV_API_BASE_URL: &str = "ANTHROPIC_BASE_URL";

/// Storybook → component layout → schemas, with scripts resolved against
/// `<root>/scripts`.
pub fn default_steps(root: &Path) -> Vec<Step> {
    let scripts = paths::scripts_dir(root);
    vec![
        Step::new(
            "update-storybook",
            "Update Storybook configuration",
            "Bump Storybook packages and config in the subtheme to the versions CivicTheme now uses",
            StepTarget::Shell(scripts.join(UPDATE_STORYBOOK_SCRIPT)),
        ),
        Step::new(
            "convert-components",
            "Convert components to directories",
            "Move flat component files into one directory per component",
            StepTarget::Interpreted(scripts.join(CONVERT_COMPONENTS_SCRIPT)),
        ),
        generate_schemas_step(),
    ]
}

/// In-process step that fills in missing `*.component.yml` files via Claude.
pub fn generate_schemas_step() -> Step {
    Step::new(
        "generate-schemas",
        "Generate component schemas",
        "Ask Claude for a component.yml schema for every Twig template that lacks one",
        StepTarget::InProcess(InProcessStep::new(run_generate_schemas)),
    )
    .needs_api_key()
}

async fn run_generate_schemas(ctx: StepContext) -> crate::Result<String> {
    let mut client = ClaudeClient::new(&ctx.settings.api_key, &ctx.settings.model);
    if let Ok(base_url) = std::env::var(ENV_API_BASE_URL) {
        if !base_url.trim().is_empty() {
            client = client.with_base_url(base_url);
        }
    }
    let client = RateLimitedClient::new(client, RateLimiter::default());
    let summary =
        schema::generate_schemas(&ctx.settings.subtheme_dir, &client, &ctx.logger).await?;
    Ok(summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sequence_is_ordered_and_typed() {
        let steps = default_steps(Path::new("/tool"));
        let ids: Vec<_> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["update-storybook", "convert-components", "generate-schemas"]
        );
        assert!(matches!(&steps[0].target, StepTarget::Shell(p) if p == Path::new("/tool/scripts/update-storybook.sh")));
        assert!(matches!(&steps[1].target, StepTarget::Interpreted(_)));
        assert!(matches!(&steps[2].target, StepTarget::InProcess(_)));
    }

    #[test]
    fn only_the_schema_step_needs_a_key() {
        let steps = default_steps(Path::new("/tool"));
        let flags: Vec<_> = steps.iter().map(|s| s.needs_api_key).collect();
        assert_eq!(flags, vec![false, false, true]);
    }
}
