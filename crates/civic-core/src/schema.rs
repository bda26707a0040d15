//! Component schema generation.
//!
//! Every `components/**/<name>.twig` template without a sibling
//! `<name>.component.yml` is sent to Claude, and the reply is written next
//! to the template once it parses as a YAML mapping. Existing schemas are
//! never overwritten, so re-running after a partial failure only fills the
//! gaps.

use std::fmt;
use std::path::{Path, PathBuf};

use claude_client::{ChatMessage, RateLimitedClient};
use futures::future::join_all;

use crate::error::{CivicError, Result};
use crate::logger::SessionLogger;
use crate::{io, paths};

pub const SYSTEM_PROMPT: &str = "You are an expert Drupal front-end developer working on \
CivicTheme single directory components. Given a Twig template, write the matching \
`<name>.component.yml` schema: `name`, `status`, `description`, `props` (a JSON-schema \
object describing every variable the template reads, with types and sensible defaults) \
and `slots` for every block the template renders. Reply with the YAML document only.";

/// Outcome of one sweep over the components directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemaSummary {
    pub generated: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl fmt::Display for SchemaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Schemas generated: {}, already present: {}, failed: {}",
            self.generated.len(),
            self.skipped,
            self.failed.len()
        )?;
        for path in &self.generated {
            writeln!(f, "  + {}", path.display())?;
        }
        for (path, err) in &self.failed {
            writeln!(f, "  ! {}: {err}", path.display())?;
        }
        Ok(())
    }
}

/// All Twig templates below `components`, sorted for stable output.
/// Hidden directories and `node_modules` are not descended into.
pub fn find_templates(components: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![components.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if entry.file_type()?.is_dir() {
                if !name.starts_with('.') && name != "node_modules" {
                    stack.push(path);
                }
            } else if path.extension().is_some_and(|e| e == paths::TEMPLATE_EXT) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// The body of the first Markdown code fence (```yaml … ```) in `reply`,
/// wherever it appears. Replies without a fence are returned trimmed.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    let Some(nl) = after_open.find('\n') else {
        return trimmed;
    };
    let body = &after_open[nl + 1..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Check that `yaml` is a mapping and return it with a trailing newline.
pub fn normalize_schema(yaml: &str) -> Result<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if !value.is_mapping() {
        return Err(CivicError::Schema(
            "reply is not a YAML mapping".to_string(),
        ));
    }
    let mut out = yaml.trim_end().to_string();
    out.push('\n');
    Ok(out)
}

fn user_prompt(subtheme: &Path, template: &Path, source: &str) -> String {
    let name = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rel = template.strip_prefix(subtheme).unwrap_or(template);
    format!(
        "Component: {name}\nTemplate path: {}\n\n```twig\n{source}\n```",
        rel.display()
    )
}

async fn generate_one(
    client: &RateLimitedClient,
    subtheme: &Path,
    template: &Path,
    target: &Path,
) -> Result<()> {
    let source = tokio::fs::read_to_string(template).await?;
    let reply = client
        .complete(
            SYSTEM_PROMPT,
            &[ChatMessage::user(user_prompt(subtheme, template, &source))],
        )
        .await?;
    let schema = normalize_schema(strip_code_fences(&reply))?;
    io::write_if_missing(target, schema.as_bytes())?;
    Ok(())
}

/// Generate missing schemas under `<subtheme>/components`.
///
/// Calls are submitted together and paced by the client's rate limiter.
/// Individual failures are collected; the sweep as a whole fails if any
/// template failed, after the successful ones have been written.
pub async fn generate_schemas(
    subtheme: &Path,
    client: &RateLimitedClient,
    logger: &SessionLogger,
) -> Result<SchemaSummary> {
    let components = paths::components_dir(subtheme);
    let templates = find_templates(&components)?;

    let mut summary = SchemaSummary::default();
    let mut pending = Vec::new();
    for template in templates {
        match paths::schema_path_for(&template) {
            Some(target) if target.exists() => summary.skipped += 1,
            Some(target) => pending.push((template, target)),
            None => {}
        }
    }

    logger.info(format!(
        "Found {} template(s) without a schema ({} already present), model {}",
        pending.len(),
        summary.skipped,
        client.model()
    ));

    let outcomes = join_all(pending.iter().map(|(template, target)| async move {
        let outcome = generate_one(client, subtheme, template, target).await;
        (template, target, outcome)
    }))
    .await;

    for (template, target, outcome) in outcomes {
        match outcome {
            Ok(()) => {
                logger.debug(format!("Wrote {}", target.display()));
                summary.generated.push(target.clone());
            }
            Err(e) => {
                logger.warning(format!("{}: {e}", template.display()));
                summary.failed.push((template.clone(), e.to_string()));
            }
        }
    }

    if summary.failed.is_empty() {
        Ok(summary)
    } else {
        Err(CivicError::Schema(format!(
            "{} of {} schema(s) could not be generated\n{summary}",
            summary.failed.len(),
            summary.failed.len() + summary.generated.len()
        )))
    }
}
