//! Init command - start tracking an owner

use anyhow::Result;
use serde_json::json;

use shadowbook_core::{LogEvent, Owner};

use super::{get_context, get_logger, get_shadowbook_dir, log_event, logged};
use crate::output;

pub fn run(owner: &str, make_default: bool, json: bool) -> Result<()> {
    logged("init", || {
        let mut ctx = get_context()?;
        let owner = Owner::new(owner);

        let tracker = ctx.tracker_service.initialize(&owner)?;

        if make_default {
            ctx.config.set_default_owner(owner.clone());
            ctx.config.save(&get_shadowbook_dir()?)?;
        }

        let logger = get_logger();
        log_event(&logger, LogEvent::new("tracker_initialized").with_command("init"));

        if json {
            return output::json(&json!({
                "tracker": tracker,
                "default": make_default,
            }));
        }

        output::success(&format!("Tracking {}", owner));
        if make_default {
            output::info("Set as default owner");
        }
        Ok(())
    })
}
