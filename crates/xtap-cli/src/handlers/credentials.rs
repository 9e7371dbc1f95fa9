use anyhow::Result;
use serde::Serialize;
use xtap_types::{Credential, CredentialKey};

use crate::context::ExecutionContext;
use crate::output::{self, print_json};

const VISIBLE_CHARS: usize = 12;

#[derive(Serialize)]
struct CredentialView {
    key: CredentialKey,
    value: String,
    version: i64,
    updated_at: String,
}

impl CredentialView {
    fn new(credential: Credential, reveal: bool) -> Self {
        let value = if reveal {
            credential.value
        } else {
            xtap_types::truncate(&credential.value, VISIBLE_CHARS)
        };
        Self {
            key: credential.key,
            value,
            version: credential.version,
            updated_at: credential.updated_at,
        }
    }
}

pub fn handle(ctx: &ExecutionContext, reveal: bool) -> Result<()> {
    let views: Vec<CredentialView> = ctx
        .db()?
        .list_credentials()?
        .into_iter()
        .map(|c| CredentialView::new(c, reveal))
        .collect();

    if ctx.is_json() {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("No credentials harvested yet.");
        return Ok(());
    }
    for view in &views {
        println!(
            "{:<14} {}  {}",
            view.key.as_str(),
            view.value,
            output::dim(&format!("v{} updated {}", view.version, view.updated_at))
        );
    }
    Ok(())
}
